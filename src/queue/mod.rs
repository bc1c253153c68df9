//! # Bounded FIFO work queue with backpressure.
//!
//! [`WorkQueue`] stages accepted jobs between submitters and workers.
//!
//! ## Architecture
//! ```text
//!  submitters ── enqueue() ──►  Mutex<VecDeque<T>, closed>  ── dequeue() ──► workers
//!       ▲    (waits on not_full)      │            │      (waits on not_empty)    │
//!       └──────── notify_one ◄────────┘            └────────► notify_one ─────────┘
//!
//!  close(): closed = true, notify_waiters() on both sides
//! ```
//!
//! ## Rules
//! - `len() <= capacity` at all times.
//! - Once closed, `enqueue` always fails; `dequeue` keeps draining remaining
//!   items, then returns `None` forever after.
//! - `close()` is idempotent.
//! - The lock is never held across an `.await`.

mod error;

pub use error::EnqueueError;

use std::collections::VecDeque;

use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

struct State<T> {
    items: VecDeque<T>,
    closed: bool,
}

/// Bounded multi-producer multi-consumer FIFO queue.
pub struct WorkQueue<T> {
    capacity: usize,
    state: Mutex<State<T>>,
    not_full: Notify,
    not_empty: Notify,
}

impl<T> WorkQueue<T> {
    /// Creates an empty queue. Capacity is clamped to a minimum of 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            state: Mutex::new(State {
                items: VecDeque::with_capacity(capacity.min(4096)),
                closed: false,
            }),
            not_full: Notify::new(),
            not_empty: Notify::new(),
        }
    }

    /// Configured capacity.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of staged items.
    pub fn len(&self) -> usize {
        self.state.lock().items.len()
    }

    /// True if no items are staged.
    pub fn is_empty(&self) -> bool {
        self.state.lock().items.is_empty()
    }

    /// True once [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Stages `item` without waiting.
    ///
    /// ### Errors
    /// - [`EnqueueError::Closed`] if the queue has been closed
    /// - [`EnqueueError::Full`] if the queue is at capacity
    pub fn try_enqueue(&self, item: T) -> Result<(), EnqueueError<T>> {
        {
            let mut st = self.state.lock();
            if st.closed {
                return Err(EnqueueError::Closed(item));
            }
            if st.items.len() >= self.capacity {
                return Err(EnqueueError::Full(item));
            }
            st.items.push_back(item);
        }
        self.not_empty.notify_one();
        Ok(())
    }

    /// Stages `item`, waiting while the queue is full.
    ///
    /// Unblocks when space frees up, when the queue is closed, or when `stop`
    /// is cancelled.
    ///
    /// ### Errors
    /// - [`EnqueueError::Closed`] if the queue is (or becomes) closed
    /// - [`EnqueueError::Cancelled`] if `stop` fired while waiting
    pub async fn enqueue(&self, item: T, stop: &CancellationToken) -> Result<(), EnqueueError<T>> {
        let mut item = item;
        loop {
            let notified = self.not_full.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            match self.try_enqueue(item) {
                Ok(()) => return Ok(()),
                Err(EnqueueError::Full(back)) => item = back,
                Err(other) => return Err(other),
            }
            if stop.is_cancelled() {
                return Err(EnqueueError::Cancelled(item));
            }

            tokio::select! {
                _ = &mut notified => {}
                _ = stop.cancelled() => return Err(EnqueueError::Cancelled(item)),
            }
        }
    }

    /// Removes the head item without waiting.
    pub fn try_dequeue(&self) -> Option<T> {
        let item = self.state.lock().items.pop_front();
        if item.is_some() {
            self.not_full.notify_one();
        }
        item
    }

    /// Removes the head item, waiting while the queue is empty.
    ///
    /// Returns `None` once the queue is closed **and** drained; this is the
    /// termination signal for workers. Cancel-safe: an item is only removed in
    /// the same poll that returns it.
    pub async fn dequeue(&self) -> Option<T> {
        loop {
            let notified = self.not_empty.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            let popped = {
                let mut st = self.state.lock();
                match st.items.pop_front() {
                    Some(item) => Some(item),
                    None if st.closed => return None,
                    None => None,
                }
            };

            if let Some(item) = popped {
                self.not_full.notify_one();
                return Some(item);
            }
            notified.await;
        }
    }

    /// Marks the queue closed. Already staged items stay available to `dequeue`.
    ///
    /// Returns `true` on the first call, `false` when already closed.
    pub fn close(&self) -> bool {
        let first = {
            let mut st = self.state.lock();
            !std::mem::replace(&mut st.closed, true)
        };
        if first {
            self.not_full.notify_waiters();
            self.not_empty.notify_waiters();
        }
        first
    }

    /// Removes and returns every staged item.
    pub fn drain(&self) -> Vec<T> {
        let items: Vec<T> = self.state.lock().items.drain(..).collect();
        if !items.is_empty() {
            self.not_full.notify_waiters();
        }
        items
    }

    /// Maps every staged item (head first) without removing it.
    pub fn inspect<R>(&self, f: impl Fn(&T) -> R) -> Vec<R> {
        self.state.lock().items.iter().map(f).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn fifo_order_and_capacity() {
        let q = WorkQueue::new(2);
        q.try_enqueue(1).unwrap();
        q.try_enqueue(2).unwrap();
        assert!(matches!(q.try_enqueue(3), Err(EnqueueError::Full(3))));
        assert_eq!(q.len(), 2);
        assert_eq!(q.try_dequeue(), Some(1));
        assert_eq!(q.try_dequeue(), Some(2));
        assert_eq!(q.try_dequeue(), None);
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let q = WorkQueue::new(0);
        assert_eq!(q.capacity(), 1);
        q.try_enqueue("a").unwrap();
        assert!(q.try_enqueue("b").unwrap_err().is_full());
    }

    #[test]
    fn close_is_idempotent_and_rejects_enqueue() {
        let q = WorkQueue::new(4);
        q.try_enqueue(1).unwrap();
        assert!(q.close());
        assert!(!q.close());
        assert!(q.is_closed());
        let err = q.try_enqueue(2).unwrap_err();
        assert!(err.is_closed());
        assert_eq!(err.into_inner(), 2);
    }

    #[tokio::test]
    async fn dequeue_drains_then_reports_end() {
        let q = WorkQueue::new(4);
        q.try_enqueue(1).unwrap();
        q.try_enqueue(2).unwrap();
        q.close();
        assert_eq!(q.dequeue().await, Some(1));
        assert_eq!(q.dequeue().await, Some(2));
        assert_eq!(q.dequeue().await, None);
        assert_eq!(q.dequeue().await, None);
    }

    #[tokio::test]
    async fn enqueue_blocks_until_space() {
        let q = Arc::new(WorkQueue::new(1));
        let stop = CancellationToken::new();
        q.try_enqueue(1).unwrap();

        let producer = {
            let q = Arc::clone(&q);
            let stop = stop.clone();
            tokio::spawn(async move { q.enqueue(2, &stop).await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!producer.is_finished());
        assert_eq!(q.len(), 1);

        assert_eq!(q.dequeue().await, Some(1));
        producer.await.unwrap().unwrap();
        assert_eq!(q.dequeue().await, Some(2));
    }

    #[tokio::test]
    async fn close_wakes_blocked_producers_and_consumers() {
        let q: Arc<WorkQueue<u32>> = Arc::new(WorkQueue::new(1));
        let stop = CancellationToken::new();

        let consumer = {
            let q = Arc::clone(&q);
            tokio::spawn(async move { q.dequeue().await })
        };
        tokio::task::yield_now().await;

        q.try_enqueue(7).unwrap();
        assert_eq!(consumer.await.unwrap(), Some(7));

        q.try_enqueue(8).unwrap();
        let producer = {
            let q = Arc::clone(&q);
            let stop = stop.clone();
            tokio::spawn(async move { q.enqueue(9, &stop).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        q.close();

        let err = producer.await.unwrap().unwrap_err();
        assert!(err.is_closed());
        assert_eq!(q.drain(), vec![8]);
    }

    #[tokio::test]
    async fn enqueue_short_circuits_on_stop() {
        let q = Arc::new(WorkQueue::new(1));
        let stop = CancellationToken::new();
        q.try_enqueue(1).unwrap();

        let producer = {
            let q = Arc::clone(&q);
            let stop = stop.clone();
            tokio::spawn(async move { q.enqueue(2, &stop).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        stop.cancel();

        assert!(matches!(
            producer.await.unwrap(),
            Err(EnqueueError::Cancelled(2))
        ));
        assert_eq!(q.len(), 1);
    }

    #[tokio::test]
    async fn concurrent_producers_never_exceed_capacity() {
        let q = Arc::new(WorkQueue::new(3));
        let stop = CancellationToken::new();
        let mut producers = Vec::new();
        for i in 0..20u32 {
            let q = Arc::clone(&q);
            let stop = stop.clone();
            producers.push(tokio::spawn(async move { q.enqueue(i, &stop).await }));
        }

        let mut seen = Vec::new();
        while seen.len() < 20 {
            assert!(q.len() <= 3);
            if let Some(v) = q.dequeue().await {
                seen.push(v);
            }
        }
        for p in producers {
            p.await.unwrap().unwrap();
        }
        seen.sort_unstable();
        assert_eq!(seen, (0..20).collect::<Vec<_>>());
    }

    #[test]
    fn inspect_preserves_order() {
        let q = WorkQueue::new(3);
        q.try_enqueue(("a", 1)).unwrap();
        q.try_enqueue(("b", 2)).unwrap();
        assert_eq!(q.inspect(|(n, _)| *n), vec!["a", "b"]);
        assert_eq!(q.len(), 2);
    }
}

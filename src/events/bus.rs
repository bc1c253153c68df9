//! # Event bus for broadcasting pool events.
//!
//! [`Bus`] wraps [`tokio::sync::broadcast`] and stamps every published event
//! with a sequence number owned by the bus (one counter per pool, never a
//! process-wide static).
//!
//! ## Rules
//! - **Non-blocking publish**: `publish()` never waits.
//! - **Bounded capacity**: slow receivers get `RecvError::Lagged(n)` and skip `n` items.
//! - **No persistence**: events published with no receiver are dropped.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::broadcast;

use super::event::Event;

/// Broadcast channel for pool events.
///
/// Cheap to clone; all clones share the channel and the sequence counter.
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
    seq: Arc<AtomicU64>,
}

impl Bus {
    /// Creates a new bus with the given ring-buffer capacity (min 1).
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel::<Event>(capacity.max(1));
        Self {
            tx,
            seq: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Stamps `ev` with the next sequence number and publishes it.
    ///
    /// Returns the assigned sequence number.
    pub fn publish(&self, mut ev: Event) -> u64 {
        let seq = self.seq.fetch_add(1, Ordering::Relaxed) + 1;
        ev.seq = seq;
        let _ = self.tx.send(ev);
        seq
    }

    /// Creates a receiver observing events published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }

    /// Sequence number of the last published event (`0` if none).
    pub fn last_seq(&self) -> u64 {
        self.seq.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;

    #[tokio::test]
    async fn sequence_is_per_bus_and_monotonic() {
        let a = Bus::new(8);
        let b = Bus::new(8);
        let mut rx = a.subscribe();

        assert_eq!(a.publish(Event::now(EventKind::PoolStarted)), 1);
        assert_eq!(a.publish(Event::now(EventKind::DrainRequested)), 2);
        assert_eq!(b.publish(Event::now(EventKind::PoolStarted)), 1);

        assert_eq!(rx.recv().await.unwrap().seq, 1);
        let second = rx.recv().await.unwrap();
        assert_eq!(second.seq, 2);
        assert_eq!(second.kind, EventKind::DrainRequested);
        assert_eq!(a.last_seq(), 2);
    }
}

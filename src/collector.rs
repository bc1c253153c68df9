//! # Result collection.
//!
//! Workers (and the coordinator, for jobs abandoned on cancellation) publish
//! results through a [`ResultSink`]; the caller consumes them from [`Results`].
//!
//! ```text
//!  Worker 0 ──┐
//!  Worker 1 ──┼── ResultSink::publish() ──► unbounded mpsc ──► Results (Stream)
//!  Worker N ──┤         (never blocks)
//!  Pool drain ┘
//! ```
//!
//! ## Rules
//! - Publishing never blocks a worker.
//! - No ordering across jobs; results arrive in completion order.
//! - The stream ends once every sink clone is gone: the pool drops its own
//!   sink when it reaches `Stopped`, workers drop theirs on exit. At that point
//!   every accepted job has produced exactly one result.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::Stream;
use tokio::sync::mpsc;

use crate::jobs::JobResult;
use crate::stats::Counters;

/// Publishing half of the result channel.
pub(crate) struct ResultSink<O> {
    tx: mpsc::UnboundedSender<JobResult<O>>,
    counters: Arc<Counters>,
}

impl<O> Clone for ResultSink<O> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            counters: Arc::clone(&self.counters),
        }
    }
}

impl<O> ResultSink<O> {
    /// Records and forwards one result.
    ///
    /// The result still counts when the caller has dropped [`Results`].
    pub fn publish(&self, result: JobResult<O>) {
        self.counters.outcome(&result.outcome);
        let _ = self.tx.send(result);
    }
}

/// Creates a connected sink/stream pair.
pub(crate) fn channel<O>(counters: Arc<Counters>) -> (ResultSink<O>, Results<O>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        ResultSink { tx, counters },
        Results {
            rx,
            received: 0,
        },
    )
}

/// Lazy, finite sequence of job results.
///
/// Ends after the pool reached `Stopped` and every result has been read.
///
/// # Example
/// ```no_run
/// # async fn demo(pool: std::sync::Arc<taskpool::Pool<u32, u32>>) {
/// let mut results = pool.results().expect("first call");
/// while let Some(r) = results.next().await {
///     println!("{} -> {:?}", r.id, r.outcome);
/// }
/// # }
/// ```
pub struct Results<O> {
    rx: mpsc::UnboundedReceiver<JobResult<O>>,
    received: u64,
}

impl<O> Results<O> {
    /// Waits for the next result; `None` once the pool stopped and all results were read.
    pub async fn next(&mut self) -> Option<JobResult<O>> {
        let r = self.rx.recv().await;
        if r.is_some() {
            self.received += 1;
        }
        r
    }

    /// Returns a ready result without waiting.
    pub fn try_next(&mut self) -> Option<JobResult<O>> {
        let r = self.rx.try_recv().ok();
        if r.is_some() {
            self.received += 1;
        }
        r
    }

    /// Results read so far through this handle.
    #[inline]
    pub fn received(&self) -> u64 {
        self.received
    }

    /// Reads results until the stream ends.
    pub async fn collect_all(mut self) -> Vec<JobResult<O>> {
        let mut out = Vec::new();
        while let Some(r) = self.next().await {
            out.push(r);
        }
        out
    }
}

impl<O> Stream for Results<O> {
    type Item = JobResult<O>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        let polled = this.rx.poll_recv(cx);
        if let Poll::Ready(Some(_)) = &polled {
            this.received += 1;
        }
        polled
    }
}

//! # Pool counters.
//!
//! [`Counters`] are lock-free atomics updated on the hot path; [`PoolStats`] is
//! the point-in-time snapshot handed to callers.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::JobError;

/// Point-in-time view of a pool.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Jobs accepted into the queue.
    pub submitted: u64,
    /// Submissions rejected (rate limited, queue full, closed, cancelled).
    pub rejected: u64,
    /// Results with a successful outcome.
    pub succeeded: u64,
    /// Results with a job error other than cancellation.
    pub failed: u64,
    /// Jobs accepted but abandoned before start.
    pub cancelled: u64,
    /// Jobs currently staged in the queue.
    pub queued: usize,
    /// Workers currently executing a job.
    pub running: usize,
    /// Highest number of jobs observed executing at once.
    pub peak_running: usize,
    /// Admission tokens currently available (`None` without a limiter).
    pub tokens: Option<usize>,
}

impl PoolStats {
    /// Results produced so far.
    #[inline]
    pub fn completed(&self) -> u64 {
        self.succeeded + self.failed + self.cancelled
    }

    /// Accepted jobs still waiting for a result.
    #[inline]
    pub fn outstanding(&self) -> u64 {
        self.submitted.saturating_sub(self.completed())
    }
}

/// Shared atomic counters.
#[derive(Debug, Default)]
pub(crate) struct Counters {
    submitted: AtomicU64,
    rejected: AtomicU64,
    succeeded: AtomicU64,
    failed: AtomicU64,
    cancelled: AtomicU64,
}

impl Counters {
    pub fn submitted(&self) {
        self.submitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn outcome<O>(&self, outcome: &Result<O, JobError>) {
        let slot = match outcome {
            Ok(_) => &self.succeeded,
            Err(JobError::Cancelled) => &self.cancelled,
            Err(_) => &self.failed,
        };
        slot.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> PoolStats {
        PoolStats {
            submitted: self.submitted.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            succeeded: self.succeeded.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            cancelled: self.cancelled.load(Ordering::Relaxed),
            ..PoolStats::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outstanding_tracks_unfinished_jobs() {
        let c = Counters::default();
        for _ in 0..4 {
            c.submitted();
        }
        c.rejected();
        c.outcome::<()>(&Ok(()));
        c.outcome::<()>(&Err(JobError::fail("x")));
        c.outcome::<()>(&Err(JobError::Cancelled));

        let s = c.snapshot();
        assert_eq!((s.succeeded, s.failed, s.cancelled, s.rejected), (1, 1, 1, 1));
        assert_eq!(s.completed(), 3);
        assert_eq!(s.outstanding(), 1);
    }
}

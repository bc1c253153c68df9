//! # Per-worker state tracking.
//!
//! Keeps the authoritative [`WorkerState`] of every worker plus a running
//! counter, so the coordinator can report which jobs were still in flight
//! when a drain deadline hits.
//!
//! ```text
//! Idle ──dequeue──► Running { job } ──result published──► Idle ── ... ──► Stopped
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::RwLock;

use crate::jobs::JobId;

/// Lifecycle of a single worker.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorkerState {
    /// Waiting for a job.
    Idle,
    /// Executing `job`.
    Running {
        /// Job currently executing.
        job: JobId,
    },
    /// Worker loop exited.
    Stopped,
}

/// Thread-safe table of worker states.
pub(crate) struct WorkerTracker {
    slots: RwLock<Vec<WorkerState>>,
    running: AtomicUsize,
    peak: AtomicUsize,
}

impl WorkerTracker {
    pub fn new(workers: usize) -> Self {
        Self {
            slots: RwLock::new(vec![WorkerState::Idle; workers]),
            running: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    pub fn running(&self, worker: usize, job: JobId) {
        self.set(worker, WorkerState::Running { job });
        let now = self.running.fetch_add(1, Ordering::AcqRel) + 1;
        self.peak.fetch_max(now, Ordering::AcqRel);
    }

    pub fn idle(&self, worker: usize) {
        self.set(worker, WorkerState::Idle);
        self.running.fetch_sub(1, Ordering::AcqRel);
    }

    pub fn stopped(&self, worker: usize) {
        self.set(worker, WorkerState::Stopped);
    }

    fn set(&self, worker: usize, state: WorkerState) {
        if let Some(slot) = self.slots.write().get_mut(worker) {
            *slot = state;
        }
    }

    /// Workers currently executing a job.
    pub fn running_count(&self) -> usize {
        self.running.load(Ordering::Acquire)
    }

    /// Highest number of simultaneously running workers observed.
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::Acquire)
    }

    pub fn snapshot(&self) -> Vec<WorkerState> {
        self.slots.read().clone()
    }

    /// Jobs currently executing, in worker order.
    pub fn in_flight(&self) -> Vec<JobId> {
        self.slots
            .read()
            .iter()
            .filter_map(|s| match s {
                WorkerState::Running { job } => Some(*job),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_running_jobs_and_peak() {
        let t = WorkerTracker::new(3);
        t.running(0, JobId::new(10));
        t.running(2, JobId::new(11));
        assert_eq!(t.running_count(), 2);
        assert_eq!(t.in_flight(), vec![JobId::new(10), JobId::new(11)]);

        t.idle(0);
        t.stopped(1);
        assert_eq!(
            t.snapshot(),
            vec![
                WorkerState::Idle,
                WorkerState::Stopped,
                WorkerState::Running { job: JobId::new(11) }
            ]
        );
        assert_eq!(t.running_count(), 1);
        assert_eq!(t.peak(), 2);
    }
}

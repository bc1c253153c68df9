use std::time::{Duration, Instant};

use crate::error::JobError;

use super::JobId;

/// Outcome of executing one [`Job`](super::Job).
///
/// Created by a worker (or by the coordinator for jobs cancelled before start)
/// and owned by the result stream until the caller consumes it.
#[derive(Debug)]
pub struct JobResult<O> {
    /// Job this result belongs to.
    pub id: JobId,
    /// Output value or error detail.
    pub outcome: Result<O, JobError>,
    /// Worker that executed the job (`None` when cancelled before start).
    pub worker: Option<usize>,
    /// Number of attempts made (`0` when cancelled before start).
    pub attempts: u32,
    /// When the job was submitted.
    pub submitted_at: Instant,
    /// When the result was produced.
    pub completed_at: Instant,
}

impl<O> JobResult<O> {
    /// Success/failure tag.
    #[inline]
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    /// True if the job never ran because the pool was cancelled.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        matches!(self.outcome, Err(JobError::Cancelled))
    }

    /// Returns the error, if the job failed.
    pub fn error(&self) -> Option<&JobError> {
        self.outcome.as_ref().err()
    }

    /// Time spent between submission and completion.
    pub fn latency(&self) -> Duration {
        self.completed_at.saturating_duration_since(self.submitted_at)
    }

    pub(crate) fn cancelled(id: JobId, submitted_at: Instant) -> Self {
        Self {
            id,
            outcome: Err(JobError::Cancelled),
            worker: None,
            attempts: 0,
            submitted_at,
            completed_at: Instant::now(),
        }
    }
}

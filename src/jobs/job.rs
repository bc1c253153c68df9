use std::fmt;
use std::time::Instant;

/// Identifier of a submitted job.
///
/// Pool-allocated ids are monotonic per pool instance, starting at 1.
/// Callers may supply their own ids through [`Job::new`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JobId(u64);

impl JobId {
    /// Wraps a raw id.
    #[inline]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw id.
    #[inline]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u64> for JobId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

/// Opaque unit of work.
///
/// Owned by the submitter until enqueued; ownership then moves to the worker
/// that dequeues it.
#[derive(Debug)]
pub struct Job<P> {
    /// Job identifier.
    pub id: JobId,
    /// Application-defined payload.
    pub payload: P,
    /// When the job was created for submission.
    pub submitted_at: Instant,
}

impl<P> Job<P> {
    /// Creates a job with a caller-supplied id.
    pub fn new(id: impl Into<JobId>, payload: P) -> Self {
        Self {
            id: id.into(),
            payload,
            submitted_at: Instant::now(),
        }
    }
}

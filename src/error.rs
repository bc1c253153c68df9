//! Error types used by the pool and by job executions.
//!
//! This module defines two main error enums:
//!
//! - [`PoolError`]: structural errors returned synchronously by the pool
//!   (admission rejected, pool closed, shutdown deadline exceeded).
//! - [`JobError`]: errors raised by individual job executions; these are never
//!   returned to the submitter, they travel inside a [`JobResult`](crate::JobResult).
//!
//! Both types provide helper methods (`as_label`, `as_message`) for logging/metrics
//! and [`is_retryable`](PoolError::is_retryable) to tell transient from permanent failures.

use std::time::Duration;
use thiserror::Error;

use crate::jobs::JobId;

/// # Errors produced by the pool itself.
///
/// Returned synchronously from [`Pool::submit`](crate::Pool::submit),
/// [`Pool::start`](crate::Pool::start) and [`Pool::shutdown`](crate::Pool::shutdown).
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    /// No admission token was available (non-blocking submit) or the limiter wait expired.
    #[error("rate limited: no admission token available")]
    RateLimited,

    /// The work queue is full (non-blocking submit only).
    #[error("work queue full")]
    QueueFull,

    /// The pool is draining or stopped; submission permanently rejected.
    #[error("pool closed")]
    PoolClosed,

    /// The operation was aborted by the pool's cancellation signal while blocked.
    #[error("operation cancelled")]
    Cancelled,

    /// Shutdown did not reach `Stopped` within its drain timeout.
    ///
    /// The pool keeps running its in-flight jobs in the background; their results
    /// are still delivered through [`Results`](crate::Results).
    #[error("shutdown timeout {timeout:?} exceeded; pending jobs: {pending:?}")]
    TimedOut {
        /// The drain timeout that was exceeded.
        timeout: Duration,
        /// Jobs that had not produced a result when the deadline hit.
        pending: Vec<JobId>,
    },
}

impl PoolError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use taskpool::PoolError;
    ///
    /// assert_eq!(PoolError::RateLimited.as_label(), "pool_rate_limited");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            PoolError::RateLimited => "pool_rate_limited",
            PoolError::QueueFull => "pool_queue_full",
            PoolError::PoolClosed => "pool_closed",
            PoolError::Cancelled => "pool_cancelled",
            PoolError::TimedOut { .. } => "pool_timed_out",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            PoolError::TimedOut { timeout, pending } => {
                format!("drain exceeded {timeout:?}; pending jobs={pending:?}")
            }
            other => other.to_string(),
        }
    }

    /// Indicates whether the caller may retry the same submission later.
    ///
    /// Returns `true` for [`PoolError::RateLimited`] and [`PoolError::QueueFull`].
    ///
    /// # Example
    /// ```
    /// use taskpool::PoolError;
    ///
    /// assert!(PoolError::QueueFull.is_retryable());
    /// assert!(!PoolError::PoolClosed.is_retryable());
    /// ```
    pub fn is_retryable(&self) -> bool {
        matches!(self, PoolError::RateLimited | PoolError::QueueFull)
    }
}

/// # Errors produced by job execution.
///
/// Carried inside a [`JobResult`](crate::JobResult); a job failure never
/// escalates to the pool.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JobError {
    /// The job handler returned an error.
    #[error("execution failed: {error}")]
    Failed {
        /// The underlying error message.
        error: String,
    },

    /// The job handler panicked.
    #[error("job panicked: {detail}")]
    Panicked {
        /// Panic payload rendered as text.
        detail: String,
    },

    /// Job execution exceeded the configured per-job timeout.
    #[error("timed out after {timeout:?}")]
    Timeout {
        /// The timeout duration that was exceeded.
        timeout: Duration,
    },

    /// The job was accepted but never started because the pool was cancelled.
    #[error("job cancelled before start")]
    Cancelled,
}

impl JobError {
    /// Convenience constructor for [`JobError::Failed`].
    pub fn fail(error: impl Into<String>) -> Self {
        JobError::Failed {
            error: error.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use taskpool::JobError;
    /// use std::time::Duration;
    ///
    /// let err = JobError::Timeout { timeout: Duration::from_secs(1) };
    /// assert_eq!(err.as_label(), "job_timeout");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            JobError::Failed { .. } => "job_failed",
            JobError::Panicked { .. } => "job_panicked",
            JobError::Timeout { .. } => "job_timeout",
            JobError::Cancelled => "job_cancelled",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            JobError::Failed { error } => format!("error: {error}"),
            JobError::Panicked { detail } => format!("panic: {detail}"),
            JobError::Timeout { timeout } => format!("timeout: {timeout:?}"),
            JobError::Cancelled => "cancelled before start".to_string(),
        }
    }

    /// Indicates whether the error type is safe to retry.
    ///
    /// Returns `true` for [`JobError::Failed`] and [`JobError::Timeout`].
    /// Panics are deliberately not retried.
    ///
    /// # Example
    /// ```
    /// use taskpool::JobError;
    ///
    /// assert!(JobError::fail("boom").is_retryable());
    /// assert!(!JobError::Panicked { detail: "boom".into() }.is_retryable());
    /// ```
    pub fn is_retryable(&self) -> bool {
        matches!(self, JobError::Failed { .. } | JobError::Timeout { .. })
    }
}

/// Renders a panic payload as text.
pub(crate) fn panic_detail(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

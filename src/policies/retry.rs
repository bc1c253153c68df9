//! # Retry policy for job attempts.
//!
//! A job gets up to [`RetryPolicy::max_attempts`] attempts. Only errors for
//! which [`JobError::is_retryable`] holds (handler failure, timeout) trigger
//! another attempt; panics never do. Retries stay inside the worker, so the
//! job still yields exactly one result.

use std::time::Duration;

use crate::error::JobError;

use super::BackoffPolicy;

/// How many attempts a job gets and how long to wait between them.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts including the first (`0` is treated as `1`).
    pub max_attempts: u32,
    /// Delay schedule between attempts.
    pub backoff: BackoffPolicy,
}

impl Default for RetryPolicy {
    /// Single attempt, no retries.
    fn default() -> Self {
        Self::never()
    }
}

impl RetryPolicy {
    /// Single attempt, no retries.
    pub fn never() -> Self {
        Self {
            max_attempts: 1,
            backoff: BackoffPolicy::default(),
        }
    }

    /// Up to `max_attempts` attempts with the given backoff.
    pub fn attempts(max_attempts: u32, backoff: BackoffPolicy) -> Self {
        Self {
            max_attempts,
            backoff,
        }
    }

    /// Decides whether attempt number `attempt` (1-based) failing with `err`
    /// should be followed by another attempt.
    pub fn should_retry(&self, attempt: u32, err: &JobError) -> bool {
        err.is_retryable() && attempt < self.max_attempts.max(1)
    }

    /// Delay to wait after attempt number `attempt` (1-based) failed.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.backoff.next(attempt.saturating_sub(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_never_retries() {
        let p = RetryPolicy::default();
        assert!(!p.should_retry(1, &JobError::fail("x")));
    }

    #[test]
    fn retries_until_budget_spent() {
        let p = RetryPolicy::attempts(3, BackoffPolicy::constant(Duration::from_millis(5)));
        let err = JobError::fail("flaky");
        assert!(p.should_retry(1, &err));
        assert!(p.should_retry(2, &err));
        assert!(!p.should_retry(3, &err));
        assert_eq!(p.delay_after(1), Duration::from_millis(5));
    }

    #[test]
    fn panics_and_cancellations_are_final() {
        let p = RetryPolicy::attempts(5, BackoffPolicy::default());
        assert!(!p.should_retry(1, &JobError::Panicked { detail: "boom".into() }));
        assert!(!p.should_retry(1, &JobError::Cancelled));
    }
}

//! # Pool configuration.
//!
//! Provides [`PoolConfig`], the centralized settings for one [`Pool`](crate::Pool).
//!
//! ## Sentinel values
//! - `limiter = None` → no admission rate limiting
//! - `job_timeout = 0s` → jobs run without a deadline
//! - `acquire_timeout = 0s` → blocking submits wait for a token indefinitely
//! - `workers`, `queue_capacity`, `bus_capacity` are clamped to a minimum of 1
//!
//! # Example
//! ```
//! use std::time::Duration;
//! use taskpool::{LimiterConfig, PoolConfig};
//!
//! let mut cfg = PoolConfig::default();
//! cfg.workers = 2;
//! cfg.queue_capacity = 5;
//! cfg.limiter = Some(LimiterConfig::new(3, Duration::from_millis(100)));
//!
//! assert_eq!(cfg.job_timeout(), None);
//! ```

use std::time::Duration;

use crate::limiter::LimiterConfig;
use crate::policies::RetryPolicy;

/// Configuration for a worker pool.
///
/// ## Field semantics
/// - `workers`: number of concurrent workers, fixed for the pool lifetime (min 1)
/// - `queue_capacity`: maximum number of staged jobs (min 1)
/// - `limiter`: token-bucket admission control (`None` = unlimited)
/// - `bus_capacity`: event bus ring buffer size (min 1)
/// - `job_timeout`: per-attempt deadline (`0s` = none)
/// - `acquire_timeout`: limiter wait bound for blocking submits (`0s` = unbounded)
/// - `retry`: retry policy for retryable job errors
#[derive(Clone, Debug)]
pub struct PoolConfig {
    /// Number of workers spawned by [`Pool::start`](crate::Pool::start).
    pub workers: usize,

    /// Capacity of the bounded work queue.
    ///
    /// Blocking submits wait while the queue is full; non-blocking submits
    /// fail with [`PoolError::QueueFull`](crate::PoolError::QueueFull).
    pub queue_capacity: usize,

    /// Optional token-bucket limiter applied before every enqueue.
    pub limiter: Option<LimiterConfig>,

    /// Capacity of the event bus broadcast channel ring buffer.
    ///
    /// Slow subscribers that lag behind more than `bus_capacity` messages
    /// skip older items.
    pub bus_capacity: usize,

    /// Per-attempt job timeout.
    pub job_timeout: Duration,

    /// Maximum time a blocking submit waits for an admission token.
    ///
    /// On expiry the submit fails with [`PoolError::RateLimited`](crate::PoolError::RateLimited).
    pub acquire_timeout: Duration,

    /// Retry policy for failed or timed-out attempts.
    pub retry: RetryPolicy,
}

impl PoolConfig {
    /// Returns the worker count clamped to a minimum of 1.
    #[inline]
    pub fn workers_clamped(&self) -> usize {
        self.workers.max(1)
    }

    /// Returns the queue capacity clamped to a minimum of 1.
    #[inline]
    pub fn queue_capacity_clamped(&self) -> usize {
        self.queue_capacity.max(1)
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// Returns the per-job timeout as an `Option`.
    ///
    /// - `None` → no timeout
    /// - `Some(d)` → timeout applied per attempt
    #[inline]
    pub fn job_timeout(&self) -> Option<Duration> {
        if self.job_timeout == Duration::ZERO {
            None
        } else {
            Some(self.job_timeout)
        }
    }

    /// Returns the limiter wait bound as an `Option`.
    ///
    /// - `None` → wait until a token arrives (or the pool closes)
    /// - `Some(d)` → give up with `RateLimited` after `d`
    #[inline]
    pub fn acquire_timeout(&self) -> Option<Duration> {
        if self.acquire_timeout == Duration::ZERO {
            None
        } else {
            Some(self.acquire_timeout)
        }
    }
}

impl Default for PoolConfig {
    /// Default configuration:
    ///
    /// - `workers = 4`
    /// - `queue_capacity = 1024`
    /// - `limiter = None` (no rate limiting)
    /// - `bus_capacity = 1024`
    /// - `job_timeout = 0s` (no timeout)
    /// - `acquire_timeout = 0s` (wait indefinitely)
    /// - `retry = RetryPolicy::default()` (single attempt)
    fn default() -> Self {
        Self {
            workers: 4,
            queue_capacity: 1024,
            limiter: None,
            bus_capacity: 1024,
            job_timeout: Duration::ZERO,
            acquire_timeout: Duration::ZERO,
            retry: RetryPolicy::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinels_map_to_none() {
        let cfg = PoolConfig::default();
        assert_eq!(cfg.job_timeout(), None);
        assert_eq!(cfg.acquire_timeout(), None);
        assert!(cfg.limiter.is_none());
    }

    #[test]
    fn sizes_are_clamped() {
        let cfg = PoolConfig {
            workers: 0,
            queue_capacity: 0,
            bus_capacity: 0,
            ..PoolConfig::default()
        };
        assert_eq!(cfg.workers_clamped(), 1);
        assert_eq!(cfg.queue_capacity_clamped(), 1);
        assert_eq!(cfg.bus_capacity_clamped(), 1);
    }
}

//! # Backoff between job retries.
//!
//! The delay before retry `n` (0-based) is `first × factor^n`, clamped to
//! `max`, then jittered. The nominal delay depends only on `n`, so jitter never
//! feeds back into later delays.
//!
//! # Example
//! ```rust
//! use std::time::Duration;
//! use taskpool::{BackoffPolicy, JitterPolicy};
//!
//! let backoff = BackoffPolicy {
//!     first: Duration::from_millis(50),
//!     max: Duration::from_secs(1),
//!     factor: 2.0,
//!     jitter: JitterPolicy::None,
//! };
//!
//! assert_eq!(backoff.next(0), Duration::from_millis(50));
//! assert_eq!(backoff.next(2), Duration::from_millis(200));
//! assert_eq!(backoff.next(9), Duration::from_secs(1));
//! ```

use std::time::Duration;

use super::JitterPolicy;

/// Delay schedule between attempts of the same job.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BackoffPolicy {
    /// Delay before the first retry.
    pub first: Duration,
    /// Upper bound for any delay.
    pub max: Duration,
    /// Multiplicative growth per retry (`1.0` = constant).
    pub factor: f64,
    /// Randomization applied to the nominal delay.
    pub jitter: JitterPolicy,
}

impl Default for BackoffPolicy {
    /// Constant 100ms delay, capped at 30s, no jitter.
    fn default() -> Self {
        Self {
            first: Duration::from_millis(100),
            max: Duration::from_secs(30),
            factor: 1.0,
            jitter: JitterPolicy::None,
        }
    }
}

impl BackoffPolicy {
    /// Constant delay without jitter.
    pub fn constant(delay: Duration) -> Self {
        Self {
            first: delay,
            max: delay,
            factor: 1.0,
            jitter: JitterPolicy::None,
        }
    }

    /// Nominal (un-jittered) delay before retry `retry`.
    pub fn nominal(&self, retry: u32) -> Duration {
        let exp = retry.min(i32::MAX as u32) as i32;
        let secs = self.first.as_secs_f64() * self.factor.powi(exp);
        if !secs.is_finite() || secs < 0.0 || secs > self.max.as_secs_f64() {
            self.max
        } else {
            Duration::from_secs_f64(secs)
        }
    }

    /// Delay before retry `retry` (0-based), jitter applied.
    pub fn next(&self, retry: u32) -> Duration {
        let nominal = self.nominal(retry);
        self.jitter
            .apply(nominal, self.first.min(self.max), self.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exp(first_ms: u64, max: Duration) -> BackoffPolicy {
        BackoffPolicy {
            first: Duration::from_millis(first_ms),
            max,
            factor: 2.0,
            jitter: JitterPolicy::None,
        }
    }

    #[test]
    fn grows_exponentially_until_cap() {
        let p = exp(100, Duration::from_secs(1));
        let got: Vec<u128> = (0..6).map(|n| p.next(n).as_millis()).collect();
        assert_eq!(got, vec![100, 200, 400, 800, 1000, 1000]);
    }

    #[test]
    fn first_above_max_is_capped() {
        let p = exp(10_000, Duration::from_secs(5));
        assert_eq!(p.next(0), Duration::from_secs(5));
    }

    #[test]
    fn overflowing_exponent_clamps_to_max() {
        let p = exp(100, Duration::from_secs(10));
        assert_eq!(p.next(u32::MAX), Duration::from_secs(10));
    }

    #[test]
    fn constant_ignores_retry_number() {
        let p = BackoffPolicy::constant(Duration::from_millis(250));
        for n in [0, 1, 5, 40] {
            assert_eq!(p.next(n), Duration::from_millis(250));
        }
    }

    #[test]
    fn jitter_never_exceeds_nominal() {
        let p = BackoffPolicy {
            jitter: JitterPolicy::Full,
            ..exp(100, Duration::from_secs(30))
        };
        for n in 0..12 {
            assert!(p.next(n) <= p.nominal(n));
        }
    }
}

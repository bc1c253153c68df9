use std::time::Duration;

/// Token-bucket parameters.
///
/// ## Field semantics
/// - `capacity`: maximum number of stored tokens (`0` = closed gate)
/// - `refill_interval`: one token is added per interval (`0s` = never refilled)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LimiterConfig {
    /// Maximum burst size; the bucket starts with this many tokens.
    pub capacity: usize,
    /// Period of the refill task.
    pub refill_interval: Duration,
}

impl LimiterConfig {
    /// Creates a limiter configuration.
    pub fn new(capacity: usize, refill_interval: Duration) -> Self {
        Self {
            capacity,
            refill_interval,
        }
    }

    /// Returns the refill period as an `Option`.
    ///
    /// - `None` → the bucket is never refilled
    /// - `Some(d)` → one token per `d`
    #[inline]
    pub fn refill_period(&self) -> Option<Duration> {
        if self.refill_interval == Duration::ZERO {
            None
        } else {
            Some(self.refill_interval)
        }
    }
}

impl Default for LimiterConfig {
    /// Default configuration: burst of 16, one token every 100ms.
    fn default() -> Self {
        Self {
            capacity: 16,
            refill_interval: Duration::from_millis(100),
        }
    }
}

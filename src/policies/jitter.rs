//! # Jitter for retry delays.
//!
//! [`JitterPolicy`] randomizes backoff delays so that jobs failing together
//! (e.g. against the same downstream) do not retry in lockstep.
//!
//! - [`JitterPolicy::None`]: exact delay
//! - [`JitterPolicy::Full`]: uniform in `[0, delay]`
//! - [`JitterPolicy::Equal`]: `delay/2 + uniform[0, delay/2]`
//! - [`JitterPolicy::Decorrelated`]: uniform in `[floor, min(prev * 3, max)]`

use std::time::Duration;

use rand::Rng;

/// Randomization strategy applied on top of a computed backoff delay.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum JitterPolicy {
    /// Use the computed delay unchanged.
    #[default]
    None,
    /// Uniform in `[0, delay]`; widest spread, may shorten delays a lot.
    Full,
    /// Half fixed, half random; keeps ~75% of the delay on average.
    Equal,
    /// Grows from the previous delay instead of the nominal one.
    Decorrelated,
}

impl JitterPolicy {
    /// Applies jitter using the thread-local RNG.
    ///
    /// `floor` and `max` bound the decorrelated variant; the other variants
    /// only look at `delay`.
    pub fn apply(&self, delay: Duration, floor: Duration, max: Duration) -> Duration {
        self.apply_with(&mut rand::rng(), delay, floor, max)
    }

    /// Applies jitter with a caller-provided RNG.
    pub fn apply_with<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        delay: Duration,
        floor: Duration,
        max: Duration,
    ) -> Duration {
        let ms = millis(delay);
        match self {
            JitterPolicy::None => delay,
            JitterPolicy::Full if ms == 0 => Duration::ZERO,
            JitterPolicy::Full => Duration::from_millis(rng.random_range(0..=ms)),
            JitterPolicy::Equal => {
                let half = ms / 2;
                let extra = if half == 0 { 0 } else { rng.random_range(0..=half) };
                Duration::from_millis(half + extra)
            }
            JitterPolicy::Decorrelated => {
                let lo = millis(floor);
                let hi = ms.saturating_mul(3).min(millis(max)).max(lo);
                if lo >= hi {
                    return Duration::from_millis(lo);
                }
                Duration::from_millis(rng.random_range(lo..=hi))
            }
        }
    }
}

#[inline]
fn millis(d: Duration) -> u64 {
    d.as_millis().min(u128::from(u64::MAX)) as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const MAX: Duration = Duration::from_secs(30);

    #[test]
    fn none_is_identity() {
        let d = Duration::from_millis(750);
        assert_eq!(JitterPolicy::None.apply(d, Duration::ZERO, MAX), d);
    }

    #[test]
    fn full_stays_within_delay() {
        let mut rng = StdRng::seed_from_u64(7);
        let d = Duration::from_millis(400);
        for _ in 0..200 {
            assert!(JitterPolicy::Full.apply_with(&mut rng, d, Duration::ZERO, MAX) <= d);
        }
        assert_eq!(
            JitterPolicy::Full.apply(Duration::ZERO, Duration::ZERO, MAX),
            Duration::ZERO
        );
    }

    #[test]
    fn equal_keeps_lower_half() {
        let mut rng = StdRng::seed_from_u64(11);
        let d = Duration::from_millis(1000);
        for _ in 0..200 {
            let j = JitterPolicy::Equal.apply_with(&mut rng, d, Duration::ZERO, MAX);
            assert!(j >= Duration::from_millis(500) && j <= d, "{j:?}");
        }
    }

    #[test]
    fn decorrelated_is_bounded_by_floor_and_max() {
        let mut rng = StdRng::seed_from_u64(3);
        let floor = Duration::from_millis(100);
        let max = Duration::from_secs(2);
        for _ in 0..200 {
            let j = JitterPolicy::Decorrelated.apply_with(
                &mut rng,
                Duration::from_secs(5),
                floor,
                max,
            );
            assert!(j >= floor && j <= max, "{j:?}");
        }
    }
}

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::error::PoolError;

use super::LimiterConfig;

/// Token bucket backed by an atomic counter.
///
/// Safe under one refill source and any number of concurrent acquirers.
///
/// # Example
/// ```rust
/// use std::time::Duration;
/// use taskpool::{LimiterConfig, TokenBucket};
///
/// let bucket = TokenBucket::new(LimiterConfig::new(2, Duration::from_secs(1)));
/// assert!(bucket.try_acquire());
/// assert!(bucket.try_acquire());
/// assert!(!bucket.try_acquire());
/// ```
#[derive(Debug)]
pub struct TokenBucket {
    cfg: LimiterConfig,
    tokens: AtomicUsize,
    dropped_ticks: AtomicU64,
    available: Notify,
}

impl TokenBucket {
    /// Creates a full bucket.
    pub fn new(cfg: LimiterConfig) -> Self {
        Self {
            cfg,
            tokens: AtomicUsize::new(cfg.capacity),
            dropped_ticks: AtomicU64::new(0),
            available: Notify::new(),
        }
    }

    /// Maximum number of tokens the bucket holds.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.cfg.capacity
    }

    /// Tokens currently available.
    #[inline]
    pub fn available(&self) -> usize {
        self.tokens.load(Ordering::Acquire)
    }

    /// Refill ticks discarded because the bucket was already full.
    #[inline]
    pub fn dropped_ticks(&self) -> u64 {
        self.dropped_ticks.load(Ordering::Relaxed)
    }

    /// Removes one token if available. Never blocks; no side effects on failure.
    pub fn try_acquire(&self) -> bool {
        self.tokens
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
            .is_ok()
    }

    /// Waits for a token until `deadline`.
    ///
    /// Returns `false` if the deadline elapsed first.
    pub async fn acquire(&self, deadline: Instant) -> bool {
        let never = CancellationToken::new();
        self.acquire_until(Some(deadline), &never).await.is_ok()
    }

    /// Waits for a token until `deadline` (if any) or until `stop` is cancelled.
    ///
    /// ### Errors
    /// - [`PoolError::RateLimited`] when the deadline elapsed
    /// - [`PoolError::Cancelled`] when `stop` fired first
    pub async fn acquire_until(
        &self,
        deadline: Option<Instant>,
        stop: &CancellationToken,
    ) -> Result<(), PoolError> {
        loop {
            let notified = self.available.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.try_acquire() {
                return Ok(());
            }
            if stop.is_cancelled() {
                return Err(PoolError::Cancelled);
            }

            match deadline {
                Some(at) => {
                    tokio::select! {
                        _ = &mut notified => {}
                        _ = time::sleep_until(at) => {
                            return if self.try_acquire() {
                                Ok(())
                            } else {
                                Err(PoolError::RateLimited)
                            };
                        }
                        _ = stop.cancelled() => return Err(PoolError::Cancelled),
                    }
                }
                None => {
                    tokio::select! {
                        _ = &mut notified => {}
                        _ = stop.cancelled() => return Err(PoolError::Cancelled),
                    }
                }
            }
        }
    }

    /// Adds one token unless the bucket is full.
    ///
    /// Returns `false` when the tick was discarded.
    pub fn refill_one(&self) -> bool {
        let cap = self.cfg.capacity;
        let added = self
            .tokens
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                if n < cap { Some(n + 1) } else { None }
            })
            .is_ok();

        if added {
            self.available.notify_one();
        } else {
            self.dropped_ticks.fetch_add(1, Ordering::Relaxed);
        }
        added
    }

    /// Returns a token taken by a caller whose admission failed afterwards.
    ///
    /// Capped at capacity like a refill, but not counted as a dropped tick.
    pub fn put_back(&self) {
        let cap = self.cfg.capacity;
        if self
            .tokens
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                if n < cap { Some(n + 1) } else { None }
            })
            .is_ok()
        {
            self.available.notify_one();
        }
    }

    /// Spawns the periodic refill task; it exits when `token` is cancelled.
    ///
    /// Returns `None` when the configuration disables refill (`refill_interval = 0`).
    pub fn spawn_refill(self: &Arc<Self>, token: CancellationToken) -> Option<JoinHandle<()>> {
        let period = self.cfg.refill_period()?;
        let me = Arc::clone(self);

        Some(tokio::spawn(async move {
            me.refill_loop(period, token).await;
        }))
    }

    async fn refill_loop(&self, period: Duration, token: CancellationToken) {
        let mut ticker = time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = ticker.tick() => {
                    self.refill_one();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bucket(cap: usize, ms: u64) -> Arc<TokenBucket> {
        Arc::new(TokenBucket::new(LimiterConfig::new(
            cap,
            Duration::from_millis(ms),
        )))
    }

    #[test]
    fn starts_full_and_allows_burst() {
        let b = bucket(3, 100);
        assert_eq!(b.available(), 3);
        assert!(b.try_acquire());
        assert!(b.try_acquire());
        assert!(b.try_acquire());
        assert!(!b.try_acquire());
        assert_eq!(b.available(), 0);
    }

    #[test]
    fn refill_never_exceeds_capacity() {
        let b = bucket(2, 100);
        assert!(!b.refill_one());
        assert!(b.try_acquire());
        assert!(b.refill_one());
        assert!(!b.refill_one());
        assert_eq!(b.available(), 2);
        assert_eq!(b.dropped_ticks(), 2);
    }

    #[test]
    fn zero_capacity_is_closed_gate() {
        let b = bucket(0, 1);
        for _ in 0..10 {
            assert!(!b.refill_one());
            assert!(!b.try_acquire());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn zero_capacity_stays_closed_across_refill_intervals() {
        let b = bucket(0, 10);
        let token = CancellationToken::new();
        let _refill = b.spawn_refill(token.clone());

        time::sleep(Duration::from_millis(500)).await;
        assert!(!b.try_acquire());
        token.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn refill_task_adds_one_token_per_interval() {
        let b = bucket(3, 100);
        let token = CancellationToken::new();
        let handle = b.spawn_refill(token.clone()).expect("refill enabled");

        while b.try_acquire() {}
        time::sleep(Duration::from_millis(150)).await;
        assert_eq!(b.available(), 1);

        time::sleep(Duration::from_millis(100)).await;
        assert_eq!(b.available(), 2);

        token.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn acquire_waits_for_refill() {
        let b = bucket(1, 100);
        let token = CancellationToken::new();
        let _refill = b.spawn_refill(token.clone());

        assert!(b.try_acquire());
        let start = Instant::now();
        assert!(b.acquire(start + Duration::from_secs(1)).await);
        assert!(start.elapsed() >= Duration::from_millis(100));
        token.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn acquire_fails_on_deadline() {
        let b = bucket(1, 0);
        assert!(b.try_acquire());
        assert!(!b.acquire(Instant::now() + Duration::from_millis(50)).await);
    }

    #[tokio::test(start_paused = true)]
    async fn acquire_short_circuits_on_stop() {
        let b = bucket(0, 0);
        let stop = CancellationToken::new();
        let waiter = {
            let b = Arc::clone(&b);
            let stop = stop.clone();
            tokio::spawn(async move { b.acquire_until(None, &stop).await })
        };

        time::sleep(Duration::from_millis(10)).await;
        stop.cancel();
        assert_eq!(waiter.await.unwrap(), Err(PoolError::Cancelled));
    }

    #[test]
    fn disabled_refill_spawns_nothing() {
        let rt = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();
        rt.block_on(async {
            let b = bucket(1, 0);
            assert!(b.spawn_refill(CancellationToken::new()).is_none());
        });
    }
}

//! Retry policies for failed jobs.
//!
//! This module groups the knobs that control **if** a failed job attempt is
//! retried and **how long** the worker waits before the next attempt.
//!
//! ## Contents
//! - [`RetryPolicy`] how many attempts a job gets, and which errors qualify
//! - [`BackoffPolicy`] how retry delays evolve (first / factor / max + jitter)
//! - [`JitterPolicy`]  randomization strategy to avoid synchronized retries
//!
//! ## Quick wiring
//! ```text
//! PoolConfig { retry: RetryPolicy { max_attempts, backoff }, .. }
//!      └─► core::worker uses:
//!           - retry.should_retry(attempt, &err) to decide continue/finish
//!           - retry.backoff.next(attempt - 1) to delay the next attempt
//! ```
//!
//! ## Defaults
//! - `RetryPolicy::default()` → one attempt, no retries.
//! - `BackoffPolicy::default()` → first=100ms, factor=1.0 (constant), max=30s, jitter=None.

mod backoff;
mod jitter;
mod retry;

pub use backoff::BackoffPolicy;
pub use jitter::JitterPolicy;
pub use retry::RetryPolicy;

//! # Token-bucket admission control.
//!
//! [`TokenBucket`] decouples burst tolerance (bucket capacity) from sustained
//! throughput (one token per refill interval).
//!
//! ## Architecture
//! ```text
//!   refill task (one per bucket)            acquirers (many)
//!   ┌──────────────────────────┐            ┌────────────────────────────┐
//!   │ every `refill_interval`: │            │ try_acquire(): CAS tokens-1 │
//!   │   tokens < capacity ?    │──notify──► │ acquire(deadline):          │
//!   │     CAS tokens+1         │            │   enable Notified → retry   │
//!   │   else drop the tick     │            │   until token/deadline/stop │
//!   └──────────────────────────┘            └────────────────────────────┘
//!                     shared: AtomicUsize tokens (0..=capacity)
//! ```
//!
//! ## Rules
//! - The bucket starts **full** (immediate burst of `capacity`).
//! - Missed ticks never accumulate; a tick on a full bucket is discarded.
//! - `capacity = 0` is a permanently closed gate, not an error.
//! - The counter is the only shared state; it never takes a lock, so it can
//!   never contend with the work queue.

mod bucket;
mod config;

pub use bucket::TokenBucket;
pub use config::LimiterConfig;

//! # taskpool
//!
//! **Taskpool** is a fixed-size async worker pool with token-bucket admission
//! control, a bounded backpressured work queue and graceful, deadline-bounded
//! shutdown.
//!
//! Jobs are admitted by the coordinator ([`Pool`]), staged in a FIFO
//! [`WorkQueue`], executed by a fixed set of workers with per-job panic
//! isolation, and reported back as exactly one [`JobResult`] each through a
//! [`Results`] stream.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!    submit(payload)     try_submit(payload)     submit_job(job, Admission)
//!           └───────────────────┬───────────────────────┘
//!                               ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Pool (coordinator, PoolState machine)                            │
//! │  - TokenBucket (admission tokens, periodic refill task)           │
//! │  - WorkQueue   (bounded FIFO, backpressure)                       │
//! │  - Bus         (broadcast events, per-pool sequence numbers)      │
//! │  - Counters    (submitted / rejected / outcomes)                  │
//! └──────┬──────────────────┬──────────────────┬──────────────────────┘
//!        ▼                  ▼                  ▼
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │   Worker 0   │   │   Worker 1   │   │   Worker N   │
//!     │ dequeue → run│   │ dequeue → run│   │ dequeue → run│
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            │   JobResult      │                  │
//!            └──────────────────┼──────────────────┘
//!                               ▼
//!                   ResultSink ──► Results (Stream)
//!
//!   Pool / Worker ── publish(Event) ──► Bus ──► listener ──► SubscriberSet
//!                                                            ├─► sub1.on_event()
//!                                                            └─► subN.on_event()
//! ```
//!
//! ### Lifecycle
//! ```text
//! Created ──start()──► Running ──shutdown()/cancel()──► Draining ──workers joined──► Stopped
//!
//! submit():   accepting? → acquire token → enqueue (waits while full)
//! worker:     dequeue → JobStarted → run attempt (panic-isolated, optional timeout)
//!               ├─ Ok / final Err ──► JobResult, JobCompleted / JobFailed
//!               └─ retryable Err  ──► RetryScheduled, backoff, next attempt
//! shutdown(): close queue, wait up to the drain timeout
//!               ├─ drained   ──► Ok(())
//!               └─ timed out ──► cancel, queued jobs → Cancelled results, TimedOut { pending }
//! ```
//!
//! ## Features
//! | Area              | Description                                                  | Key types / traits                            |
//! |-------------------|--------------------------------------------------------------|-----------------------------------------------|
//! | **Pool**          | Start, submit, drain, cancel, introspect.                    | [`Pool`], [`PoolBuilder`], [`PoolState`]      |
//! | **Jobs**          | Define job handlers as closures or trait objects.            | [`Handler`], [`JobFn`], [`Job`], [`JobResult`]|
//! | **Admission**     | Token bucket and bounded queue, usable standalone.           | [`TokenBucket`], [`WorkQueue`]                |
//! | **Policies**      | Retry with exponential backoff and jitter.                   | [`RetryPolicy`], [`BackoffPolicy`]            |
//! | **Subscriber API**| Hook into pool lifecycle events.                             | [`Subscribe`], [`Event`]                      |
//! | **Errors**        | Typed errors for admission/shutdown and for job execution.   | [`PoolError`], [`JobError`]                   |
//! | **Configuration** | Centralized pool settings.                                   | [`PoolConfig`], [`LimiterConfig`]             |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use taskpool::{HandlerRef, JobContext, JobError, JobFn, LimiterConfig, Pool, PoolConfig};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut cfg = PoolConfig::default();
//!     cfg.workers = 2;
//!     cfg.queue_capacity = 5;
//!     cfg.limiter = Some(LimiterConfig::new(3, Duration::from_millis(10)));
//!
//!     // Build subscribers (optional)
//!     #[cfg(feature = "logging")]
//!     let subs: Vec<Arc<dyn taskpool::Subscribe>> =
//!         vec![Arc::new(taskpool::LogWriter::default())];
//!     #[cfg(not(feature = "logging"))]
//!     let subs: Vec<Arc<dyn taskpool::Subscribe>> = Vec::new();
//!
//!     let upper: HandlerRef<String, String> =
//!         JobFn::arc("upper", |_ctx: JobContext, s: String| async move {
//!             Ok::<_, JobError>(s.to_uppercase())
//!         });
//!
//!     let pool = Pool::builder(cfg, upper).with_subscribers(subs).build();
//!     let mut results = pool.results().expect("results are taken once");
//!     pool.start()?;
//!
//!     for word in ["alpha", "beta", "gamma"] {
//!         pool.submit(word.to_string()).await?;
//!     }
//!     pool.shutdown(Duration::from_secs(5)).await?;
//!
//!     let mut n = 0;
//!     while let Some(r) = results.next().await {
//!         assert!(r.is_success());
//!         n += 1;
//!     }
//!     assert_eq!(n, 3);
//!     Ok(())
//! }
//! ```
mod collector;
mod config;
mod core;
mod error;
mod events;
mod jobs;
mod limiter;
mod policies;
mod queue;
mod stats;
mod subscribers;

// ---- Public re-exports ----

pub use collector::Results;
pub use config::PoolConfig;
pub use crate::core::{Admission, Pool, PoolBuilder, PoolState, WorkerState};
pub use error::{JobError, PoolError};
pub use events::{Bus, Event, EventKind};
pub use jobs::{BoxJobFuture, Handler, HandlerRef, Job, JobContext, JobFn, JobId, JobResult};
pub use limiter::{LimiterConfig, TokenBucket};
pub use policies::{BackoffPolicy, JitterPolicy, RetryPolicy};
pub use queue::{EnqueueError, WorkQueue};
pub use stats::PoolStats;
pub use subscribers::{Subscribe, SubscriberSet};

// Optional: expose a simple built-in logger subscriber (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;

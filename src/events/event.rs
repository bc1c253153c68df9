//! # Pool events emitted by the coordinator and workers.
//!
//! The [`EventKind`] enum classifies event types across four categories:
//! - **Pool lifecycle**: start, drain, cancel, stop
//! - **Worker lifecycle**: worker started/stopped/panicked
//! - **Job lifecycle**: submitted, rejected, started, completed, failed, retried, cancelled
//! - **Subscriber health**: overflow and panics inside subscribers
//!
//! The [`Event`] struct carries metadata such as timestamps, job id, worker
//! index and reasons.
//!
//! ## Ordering guarantees
//! Each event gets a sequence number from its [`Bus`](super::Bus) at publish
//! time, increasing monotonically per pool.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use taskpool::{Event, EventKind, JobId};
//!
//! let ev = Event::now(EventKind::JobFailed)
//!     .with_job(JobId::new(3))
//!     .with_worker(1)
//!     .with_reason("boom")
//!     .with_attempt(2);
//!
//! assert_eq!(ev.kind, EventKind::JobFailed);
//! assert_eq!(ev.job, Some(JobId::new(3)));
//! assert_eq!(ev.reason.as_deref(), Some("boom"));
//! ```

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use crate::jobs::JobId;

/// Classification of pool events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    // === Pool lifecycle ===
    /// Pool moved `Created → Running`.
    ///
    /// Sets: `count` (worker count)
    PoolStarted,

    /// Shutdown or cancellation moved the pool to `Draining`.
    ///
    /// Sets: `count` (jobs still queued)
    DrainRequested,

    /// Cancellation observed; queued jobs are being abandoned.
    ///
    /// Sets: `count` (jobs abandoned)
    CancelRequested,

    /// Every accepted job ran to completion without cancellation.
    ///
    /// Published right before `PoolStopped`.
    AllStoppedWithin,

    /// Shutdown timeout exceeded.
    ///
    /// Sets: `timeout_ms`, `count` (pending jobs)
    DrainTimedOut,

    /// Pool reached `Stopped`; no further results will be produced.
    PoolStopped,

    // === Worker lifecycle ===
    /// Worker loop started.
    ///
    /// Sets: `worker`
    WorkerStarted,

    /// Worker loop exited.
    ///
    /// Sets: `worker`
    WorkerStopped,

    /// Worker task terminated abnormally (panic outside job isolation).
    ///
    /// Sets: `reason`
    WorkerPanicked,

    // === Job lifecycle ===
    /// Job accepted into the queue.
    ///
    /// Published after the enqueue, so a fast worker may report `JobStarted`
    /// for the same job first.
    ///
    /// Sets: `job`
    JobSubmitted,

    /// Submission rejected.
    ///
    /// Sets: `job`, `reason` (error label)
    JobRejected,

    /// Worker began an attempt.
    ///
    /// Sets: `job`, `worker`, `attempt`
    JobStarted,

    /// Job finished successfully.
    ///
    /// Sets: `job`, `worker`, `attempt`
    JobCompleted,

    /// Job finished with an error (after all attempts).
    ///
    /// Sets: `job`, `worker`, `attempt`, `reason`
    JobFailed,

    /// Attempt exceeded the per-job timeout.
    ///
    /// Sets: `job`, `worker`, `attempt`, `timeout_ms`
    JobTimedOut,

    /// Another attempt was scheduled after a retryable failure.
    ///
    /// Sets: `job`, `worker`, `attempt` (failed attempt), `delay_ms`, `reason`
    RetryScheduled,

    /// Job was accepted but never started (pool cancelled).
    ///
    /// Sets: `job`
    JobCancelled,

    // === Subscriber health ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets: `reason` (`subscriber=<name> info=<panic>`)
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets: `reason` (`subscriber=<name> reason=<full|closed>`)
    SubscriberOverflow,
}

impl EventKind {
    /// Short stable label, used by log output.
    pub fn as_label(&self) -> &'static str {
        match self {
            EventKind::PoolStarted => "pool-started",
            EventKind::DrainRequested => "drain-requested",
            EventKind::CancelRequested => "cancel-requested",
            EventKind::AllStoppedWithin => "all-stopped-within",
            EventKind::DrainTimedOut => "drain-timed-out",
            EventKind::PoolStopped => "pool-stopped",
            EventKind::WorkerStarted => "worker-started",
            EventKind::WorkerStopped => "worker-stopped",
            EventKind::WorkerPanicked => "worker-panicked",
            EventKind::JobSubmitted => "submitted",
            EventKind::JobRejected => "rejected",
            EventKind::JobStarted => "started",
            EventKind::JobCompleted => "completed",
            EventKind::JobFailed => "failed",
            EventKind::JobTimedOut => "timeout",
            EventKind::RetryScheduled => "retry",
            EventKind::JobCancelled => "cancelled",
            EventKind::SubscriberPanicked => "subscriber-panicked",
            EventKind::SubscriberOverflow => "subscriber-overflow",
        }
    }
}

/// Pool event with optional metadata.
///
/// - `seq`: per-pool sequence, assigned by the bus on publish (`0` before that)
/// - `at`: wall-clock timestamp
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Per-pool, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// Job id, if applicable.
    pub job: Option<JobId>,
    /// Worker index, if applicable.
    pub worker: Option<usize>,
    /// Attempt number (1-based).
    pub attempt: Option<u32>,
    /// Human-readable reason (errors, overflow details, etc.).
    pub reason: Option<Arc<str>>,
    /// Timeout in milliseconds (compact).
    pub timeout_ms: Option<u32>,
    /// Retry delay in milliseconds (compact).
    pub delay_ms: Option<u32>,
    /// Generic counter (workers started, jobs abandoned, jobs pending).
    pub count: Option<usize>,
}

impl Event {
    /// Creates an event of the given kind stamped with the current time.
    pub fn now(kind: EventKind) -> Self {
        Self {
            seq: 0,
            at: SystemTime::now(),
            kind,
            job: None,
            worker: None,
            attempt: None,
            reason: None,
            timeout_ms: None,
            delay_ms: None,
            count: None,
        }
    }

    /// Attaches a job id.
    #[inline]
    pub fn with_job(mut self, job: JobId) -> Self {
        self.job = Some(job);
        self
    }

    /// Attaches a worker index.
    #[inline]
    pub fn with_worker(mut self, worker: usize) -> Self {
        self.worker = Some(worker);
        self
    }

    /// Attaches an attempt number.
    #[inline]
    pub fn with_attempt(mut self, n: u32) -> Self {
        self.attempt = Some(n);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a timeout (stored as milliseconds).
    #[inline]
    pub fn with_timeout(mut self, d: Duration) -> Self {
        self.timeout_ms = Some(compact_ms(d));
        self
    }

    /// Attaches a retry delay (stored as milliseconds).
    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        self.delay_ms = Some(compact_ms(d));
        self
    }

    /// Attaches a counter.
    #[inline]
    pub fn with_count(mut self, n: usize) -> Self {
        self.count = Some(n);
        self
    }

    /// Creates a subscriber overflow event.
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::now(EventKind::SubscriberOverflow)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::now(EventKind::SubscriberPanicked)
            .with_reason(format!("subscriber={subscriber} info={info}"))
    }

    /// True for events describing subscriber health (never re-reported on overflow).
    #[inline]
    pub fn is_subscriber_event(&self) -> bool {
        matches!(
            self.kind,
            EventKind::SubscriberOverflow | EventKind::SubscriberPanicked
        )
    }
}

fn compact_ms(d: Duration) -> u32 {
    d.as_millis().min(u128::from(u32::MAX)) as u32
}

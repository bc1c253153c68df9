//! # Pool: coordinates admission, workers, drain and cancellation.
//!
//! The [`Pool`] owns the limiter, the work queue, the result channel and the
//! worker join set, and drives the lifecycle state machine ([`PoolState`]).
//!
//! ## High-level architecture
//! ```text
//! submit()/try_submit()
//!   ├─► state accepting?            no → PoolClosed
//!   ├─► TokenBucket (acquire)       none → RateLimited
//!   ├─► WorkQueue (enqueue)         full → QueueFull / waits
//!   └─► publish JobSubmitted | JobRejected
//!
//! start():
//!   Created → Running
//!   ├─► TokenBucket::spawn_refill(stop_token)
//!   ├─► JoinSet ◄── Worker[0..n].run(runtime_token)
//!   └─► supervise(JoinSet)          (waits for drain, joins workers)
//!
//! shutdown(timeout):
//!   Running → Draining, queue.close(), drain_token.cancel()
//!   └─► wait for Stopped up to `timeout`
//!         ├─ Ok       → Ok(())
//!         └─ Elapsed  → publish DrainTimedOut, runtime_token.cancel()
//!                       → TimedOut { pending }
//!
//! cancel() / parent token:
//!   runtime_token.cancel() → workers stop after their current job,
//!   blocked submitters return Cancelled, queued jobs become Cancelled results
//! ```
//!
//! ## Tokens
//! - `runtime_token`: cancellation (child of the optional parent token).
//! - `drain_token`: child of `runtime_token`; fired by shutdown or cancellation,
//!   it unblocks waiting submitters.
//! - `stop_token`: fired once `Stopped` is reached; ends the refill task.
//!
//! Dropping the last handle to a pool cancels it.
//!
//! ## Rules
//! - No job is accepted once `Draining` or `Stopped`.
//! - Every accepted job yields exactly one [`JobResult`], either from a worker or
//!   as a `Cancelled` result for jobs abandoned in the queue.
//! - `Stopped` is reached only after every worker exited; the result stream ends
//!   right after.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::{select, sync::watch, task::JoinSet, time};
use tokio_util::sync::CancellationToken;

use crate::{
    collector::{self, ResultSink, Results},
    config::PoolConfig,
    error::PoolError,
    events::{Bus, Event, EventKind},
    jobs::{HandlerRef, Job, JobId, JobResult},
    limiter::TokenBucket,
    queue::{EnqueueError, WorkQueue},
    stats::{Counters, PoolStats},
};

use super::{
    builder::PoolBuilder,
    state::PoolState,
    tracker::{WorkerState, WorkerTracker},
    worker::{Worker, WorkerParams},
};

/// How a submission behaves when the limiter or the queue has no room.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Admission {
    /// Wait for a token and for queue space (cancel-aware).
    #[default]
    Blocking,
    /// Fail immediately with `RateLimited` or `QueueFull`.
    NonBlocking,
}

/// Fixed-size worker pool with rate-limited admission and graceful drain.
///
/// `P` is the job payload, `O` the job output. Payloads must be `Clone` so a
/// failed attempt can be retried with the same input.
///
/// # Example
/// ```rust
/// use std::sync::{Arc, Weak};
/// use std::time::Duration;
/// use taskpool::{HandlerRef, JobContext, JobError, JobFn, Pool, PoolConfig};
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() -> Result<(), taskpool::PoolError> {
///     let square: HandlerRef<u64, u64> =
///         JobFn::arc("square", |_ctx: JobContext, n: u64| async move {
///             Ok::<_, JobError>(n * n)
///         });
///
///     let pool = Pool::builder(PoolConfig::default(), square).build();
///     let mut results = pool.results().expect("results taken once");
///     pool.start()?;
///
///     for n in 1..=3 {
///         pool.submit(n).await?;
///     }
///     pool.shutdown(Duration::from_secs(1)).await?;
///
///     let mut total = 0;
///     while let Some(r) = results.next().await {
///         total += r.outcome.unwrap_or_default();
///     }
///     assert_eq!(total, 14);
///     Ok(())
/// }
/// ```
pub struct Pool<P, O> {
    cfg: PoolConfig,
    handler: HandlerRef<P, O>,
    bus: Bus,
    queue: Arc<WorkQueue<Job<P>>>,
    limiter: Option<Arc<TokenBucket>>,
    tracker: Arc<WorkerTracker>,
    counters: Arc<Counters>,
    sink: Mutex<Option<ResultSink<O>>>,
    results: Mutex<Option<Results<O>>>,
    state: watch::Sender<PoolState>,
    next_id: AtomicU64,

    runtime_token: CancellationToken,
    drain_token: CancellationToken,
    stop_token: CancellationToken,
}

impl<P, O> Pool<P, O>
where
    P: Clone + Send + 'static,
    O: Send + 'static,
{
    /// Starts building a pool executing jobs with `handler`.
    pub fn builder(cfg: PoolConfig, handler: HandlerRef<P, O>) -> PoolBuilder<P, O> {
        PoolBuilder::new(cfg, handler)
    }

    pub(super) fn new_internal(
        cfg: PoolConfig,
        handler: HandlerRef<P, O>,
        bus: Bus,
        runtime_token: CancellationToken,
    ) -> Self {
        let counters = Arc::new(Counters::default());
        let (sink, results) = collector::channel(Arc::clone(&counters));
        let (state, _) = watch::channel(PoolState::Created);

        Self {
            queue: Arc::new(WorkQueue::new(cfg.queue_capacity_clamped())),
            limiter: cfg.limiter.map(|l| Arc::new(TokenBucket::new(l))),
            tracker: Arc::new(WorkerTracker::new(cfg.workers_clamped())),
            cfg,
            handler,
            bus,
            counters,
            sink: Mutex::new(Some(sink)),
            results: Mutex::new(Some(results)),
            state,
            next_id: AtomicU64::new(1),
            drain_token: runtime_token.child_token(),
            runtime_token,
            stop_token: CancellationToken::new(),
        }
    }

    /// Spawns the workers and the limiter refill task.
    ///
    /// Idempotent while `Running`. Must be called inside a tokio runtime.
    ///
    /// ### Errors
    /// - [`PoolError::PoolClosed`] once the pool is draining or stopped
    /// - [`PoolError::Cancelled`] if the pool was cancelled before starting
    pub fn start(self: &Arc<Self>) -> Result<(), PoolError> {
        if self.drain_token.is_cancelled() {
            self.begin_drain();
            return Err(self.closed_error());
        }

        let mut won = false;
        self.state.send_if_modified(|s| {
            if *s == PoolState::Created {
                *s = PoolState::Running;
                won = true;
            }
            won
        });
        if !won {
            return match self.state() {
                PoolState::Running => Ok(()),
                _ => Err(self.closed_error()),
            };
        }
        let Some(sink) = self.sink.lock().clone() else {
            return Err(PoolError::PoolClosed);
        };

        let workers = self.cfg.workers_clamped();
        self.bus
            .publish(Event::now(EventKind::PoolStarted).with_count(workers));

        if let Some(bucket) = &self.limiter {
            let _ = bucket.spawn_refill(self.stop_token.clone());
        }

        let params = WorkerParams {
            timeout: self.cfg.job_timeout(),
            retry: self.cfg.retry,
        };
        let mut set = JoinSet::new();
        for index in 0..workers {
            let worker = Worker {
                index,
                handler: Arc::clone(&self.handler),
                queue: Arc::clone(&self.queue),
                sink: sink.clone(),
                tracker: Arc::clone(&self.tracker),
                bus: self.bus.clone(),
                params,
            };
            set.spawn(worker.run(self.runtime_token.clone()));
        }

        tokio::spawn(Self::supervise(
            Arc::downgrade(self),
            set,
            Arc::clone(&self.queue),
            sink,
            self.drain_token.clone(),
        ));
        Ok(())
    }

    /// Submits `payload` with a pool-allocated id, waiting for a token and for
    /// queue space if needed.
    ///
    /// ### Errors
    /// - [`PoolError::PoolClosed`] if the pool is draining or stopped
    /// - [`PoolError::RateLimited`] if `acquire_timeout` elapsed without a token
    /// - [`PoolError::Cancelled`] if the pool was cancelled while waiting
    pub async fn submit(&self, payload: P) -> Result<JobId, PoolError> {
        let job = Job::new(self.allocate_id(), payload);
        self.submit_job(job, Admission::Blocking).await
    }

    /// Submits `payload` without waiting.
    ///
    /// ### Errors
    /// - [`PoolError::RateLimited`] if no token is available
    /// - [`PoolError::QueueFull`] if the queue is at capacity
    /// - [`PoolError::PoolClosed`] if the pool is draining or stopped
    pub fn try_submit(&self, payload: P) -> Result<JobId, PoolError> {
        let job = Job::new(self.allocate_id(), payload);
        let id = job.id;
        let res = self.try_admit(job);
        self.record_admission(id, res)
    }

    /// Submits a job built by the caller (caller-chosen id).
    ///
    /// Ids are not checked for uniqueness; mixing caller ids with
    /// [`submit`](Self::submit) may produce duplicates.
    pub async fn submit_job(&self, job: Job<P>, mode: Admission) -> Result<JobId, PoolError> {
        let id = job.id;
        let res = match mode {
            Admission::NonBlocking => self.try_admit(job),
            Admission::Blocking => self.admit(job).await,
        };
        self.record_admission(id, res)
    }

    /// Stops accepting jobs and waits up to `drain_timeout` for `Stopped`.
    ///
    /// Calling it again after the pool stopped returns `Ok(())` immediately.
    ///
    /// ### Errors
    /// [`PoolError::TimedOut`] when the deadline elapsed. The pool is then
    /// cancelled: queued jobs are reported as cancelled and in-flight jobs
    /// finish in the background, still delivering their results.
    pub async fn shutdown(&self, drain_timeout: Duration) -> Result<(), PoolError> {
        self.begin_drain();

        let mut rx = self.state.subscribe();
        let stopped = time::timeout(drain_timeout, async move {
            rx.wait_for(|s| *s == PoolState::Stopped).await.is_ok()
        })
        .await;

        match stopped {
            Ok(_) => Ok(()),
            Err(_elapsed) => {
                let pending = self.pending_jobs();
                self.bus.publish(
                    Event::now(EventKind::DrainTimedOut)
                        .with_timeout(drain_timeout)
                        .with_count(pending.len()),
                );
                self.runtime_token.cancel();
                Err(PoolError::TimedOut {
                    timeout: drain_timeout,
                    pending,
                })
            }
        }
    }

    /// Cancels the pool.
    ///
    /// Blocked submitters return [`PoolError::Cancelled`], workers stop after
    /// their current job, and jobs still queued are reported as cancelled.
    pub fn cancel(&self) {
        self.runtime_token.cancel();
        self.begin_drain();
    }

    /// Waits until the pool reached `Stopped`.
    pub async fn wait_stopped(&self) {
        let mut rx = self.state.subscribe();
        let _ = rx.wait_for(|s| *s == PoolState::Stopped).await;
    }

    /// Takes the result stream. Returns `None` after the first call.
    pub fn results(&self) -> Option<Results<O>> {
        self.results.lock().take()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> PoolState {
        *self.state.borrow()
    }

    /// Counters plus live queue, worker and limiter figures.
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            queued: self.queue.len(),
            running: self.tracker.running_count(),
            peak_running: self.tracker.peak(),
            tokens: self.limiter.as_ref().map(|b| b.available()),
            ..self.counters.snapshot()
        }
    }

    /// Per-worker state, indexed by worker.
    pub fn workers(&self) -> Vec<WorkerState> {
        self.tracker.snapshot()
    }

    /// Jobs currently staged in the queue.
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// The admission limiter, if configured.
    pub fn limiter(&self) -> Option<&Arc<TokenBucket>> {
        self.limiter.as_ref()
    }

    /// The pool's event bus.
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// The configuration this pool was built with.
    pub fn config(&self) -> &PoolConfig {
        &self.cfg
    }

    fn allocate_id(&self) -> JobId {
        JobId::new(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    fn try_admit(&self, job: Job<P>) -> Result<(), PoolError> {
        self.ensure_accepting()?;
        if let Some(bucket) = &self.limiter {
            if !bucket.try_acquire() {
                return Err(PoolError::RateLimited);
            }
        }
        self.queue
            .try_enqueue(job)
            .map_err(|e| self.enqueue_failed(e))
    }

    async fn admit(&self, job: Job<P>) -> Result<(), PoolError> {
        self.ensure_accepting()?;
        if let Some(bucket) = &self.limiter {
            let deadline = self
                .cfg
                .acquire_timeout()
                .map(|d| time::Instant::now() + d);
            bucket
                .acquire_until(deadline, &self.drain_token)
                .await
                .map_err(|e| match e {
                    PoolError::Cancelled => self.closed_error(),
                    other => other,
                })?;
        }
        self.queue
            .enqueue(job, &self.drain_token)
            .await
            .map_err(|e| self.enqueue_failed(e))
    }

    fn record_admission(&self, id: JobId, res: Result<(), PoolError>) -> Result<JobId, PoolError> {
        match res {
            Ok(()) => {
                self.counters.submitted();
                self.bus
                    .publish(Event::now(EventKind::JobSubmitted).with_job(id));
                Ok(id)
            }
            Err(e) => {
                self.counters.rejected();
                self.bus.publish(
                    Event::now(EventKind::JobRejected)
                        .with_job(id)
                        .with_reason(e.as_label()),
                );
                Err(e)
            }
        }
    }

    /// Returns the token taken for a job the queue refused.
    fn enqueue_failed(&self, err: EnqueueError<Job<P>>) -> PoolError {
        if let Some(bucket) = &self.limiter {
            bucket.put_back();
        }
        match err {
            EnqueueError::Full(_) => PoolError::QueueFull,
            EnqueueError::Closed(_) | EnqueueError::Cancelled(_) => self.closed_error(),
        }
    }

    fn ensure_accepting(&self) -> Result<(), PoolError> {
        if self.state().is_accepting() && !self.drain_token.is_cancelled() {
            Ok(())
        } else {
            Err(PoolError::PoolClosed)
        }
    }

    /// Error for an operation interrupted by drain or cancellation.
    fn closed_error(&self) -> PoolError {
        if self.runtime_token.is_cancelled() {
            PoolError::Cancelled
        } else {
            PoolError::PoolClosed
        }
    }

    /// Moves an accepting pool to `Draining` and closes the queue.
    ///
    /// A pool that never started has no workers: it stops right away and its
    /// staged jobs are reported as cancelled.
    fn begin_drain(&self) {
        let mut prev = None;
        self.state.send_if_modified(|s| {
            if s.is_accepting() {
                prev = Some(*s);
                *s = PoolState::Draining;
                true
            } else {
                false
            }
        });
        self.drain_token.cancel();

        let Some(prev) = prev else { return };
        self.bus.publish(
            Event::now(EventKind::DrainRequested).with_count(self.queue.len()),
        );
        self.queue.close();

        if prev == PoolState::Created {
            self.abandon_queued();
            self.finish();
        }
    }

    /// Drains the pool as soon as its runtime token fires, even before `start`.
    pub(super) fn watch_cancellation(self: &Arc<Self>) {
        let pool = Arc::downgrade(self);
        let runtime = self.runtime_token.clone();
        let stop = self.stop_token.clone();

        tokio::spawn(async move {
            select! {
                _ = runtime.cancelled() => {
                    if let Some(pool) = pool.upgrade() {
                        pool.begin_drain();
                    }
                }
                _ = stop.cancelled() => {}
            }
        });
    }

    /// Waits for drain, joins the workers and finalizes the pool.
    ///
    /// The pool is held weakly until drain starts. If every handle was dropped
    /// instead, the workers are joined and staged jobs reported as cancelled
    /// through `queue` and `sink`.
    async fn supervise(
        pool: Weak<Self>,
        mut set: JoinSet<()>,
        queue: Arc<WorkQueue<Job<P>>>,
        sink: ResultSink<O>,
        drain: CancellationToken,
    ) {
        drain.cancelled().await;
        let Some(pool) = pool.upgrade() else {
            while set.join_next().await.is_some() {}
            queue.close();
            for job in queue.drain() {
                sink.publish(JobResult::cancelled(job.id, job.submitted_at));
            }
            return;
        };
        drop(sink);
        pool.begin_drain();

        let mut abandoned = false;
        loop {
            select! {
                biased;
                _ = pool.runtime_token.cancelled(), if !abandoned => {
                    abandoned = true;
                    let n = pool.abandon_queued();
                    pool.bus.publish(Event::now(EventKind::CancelRequested).with_count(n));
                }
                joined = set.join_next() => match joined {
                    Some(Ok(())) => {}
                    Some(Err(e)) => {
                        pool.bus.publish(
                            Event::now(EventKind::WorkerPanicked).with_reason(e.to_string()),
                        );
                    }
                    None => break,
                },
            }
        }

        // Workers are gone; nothing staged can run any more.
        pool.abandon_queued();
        pool.finish();
    }

    /// Reports every staged job as cancelled. Returns how many were abandoned.
    fn abandon_queued(&self) -> usize {
        let jobs = self.queue.drain();
        if jobs.is_empty() {
            return 0;
        }
        let sink = self.sink.lock().clone();
        let n = jobs.len();
        for job in jobs {
            self.bus
                .publish(Event::now(EventKind::JobCancelled).with_job(job.id));
            if let Some(sink) = &sink {
                sink.publish(JobResult::cancelled(job.id, job.submitted_at));
            }
        }
        n
    }

    fn finish(&self) {
        self.state.send_replace(PoolState::Stopped);
        self.sink.lock().take();
        self.stop_token.cancel();

        if !self.runtime_token.is_cancelled() {
            self.bus.publish(Event::now(EventKind::AllStoppedWithin));
        }
        self.bus.publish(Event::now(EventKind::PoolStopped));
    }

    /// Jobs without a result: in flight first, then queued (head first).
    fn pending_jobs(&self) -> Vec<JobId> {
        let mut pending = self.tracker.in_flight();
        pending.extend(self.queue.inspect(|job| job.id));
        pending
    }
}

impl<P, O> Drop for Pool<P, O> {
    fn drop(&mut self) {
        self.runtime_token.cancel();
        self.stop_token.cancel();
    }
}

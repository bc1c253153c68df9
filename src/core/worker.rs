//! # Worker: one long-lived job executor.
//!
//! Each worker repeatedly takes the head job from the [`WorkQueue`], runs it
//! through [`run_attempt`] (retrying per [`RetryPolicy`]) and publishes exactly
//! one [`JobResult`] for it.
//!
//! ```text
//! loop {
//!   ├─► select! { cancelled → exit, dequeue() → job | None → exit }
//!   ├─► tracker: Running { job }, publish JobStarted
//!   ├─► run_attempt()
//!   │     └─► retryable error? publish RetryScheduled, sleep(backoff), again
//!   ├─► sink.publish(JobResult), publish JobCompleted / JobFailed
//!   └─► tracker: Idle
//! }
//! tracker: Stopped, publish WorkerStopped
//! ```
//!
//! ## Rules
//! - Cancellation is observed only between jobs and during retry backoff; a
//!   started attempt always runs to completion (or its own timeout).
//! - Cancellation during backoff ends the job with its last error.
//! - A payload whose `Clone` panics fails its job with `Panicked`; the worker
//!   keeps running.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::{select, time};
use tokio_util::sync::CancellationToken;

use crate::{
    collector::ResultSink,
    error::{JobError, panic_detail},
    events::{Bus, Event, EventKind},
    jobs::{HandlerRef, Job, JobContext, JobResult},
    policies::RetryPolicy,
    queue::WorkQueue,
};

use super::{runner::run_attempt, tracker::WorkerTracker};

/// Execution parameters shared by all workers of a pool.
#[derive(Clone, Copy, Debug)]
pub(crate) struct WorkerParams {
    /// Per-attempt timeout (`None` = no timeout).
    pub timeout: Option<Duration>,
    /// Retry policy for retryable errors.
    pub retry: RetryPolicy,
}

pub(crate) struct Worker<P, O> {
    pub index: usize,
    pub handler: HandlerRef<P, O>,
    pub queue: Arc<WorkQueue<Job<P>>>,
    pub sink: ResultSink<O>,
    pub tracker: Arc<WorkerTracker>,
    pub bus: Bus,
    pub params: WorkerParams,
}

impl<P, O> Worker<P, O>
where
    P: Clone + Send + 'static,
    O: Send + 'static,
{
    /// Runs until the queue is closed and drained, or `stop` is cancelled.
    pub async fn run(self, stop: CancellationToken) {
        self.bus
            .publish(Event::now(EventKind::WorkerStarted).with_worker(self.index));

        loop {
            let job = select! {
                biased;
                _ = stop.cancelled() => break,
                next = self.queue.dequeue() => match next {
                    Some(job) => job,
                    None => break,
                },
            };
            self.execute(job, &stop).await;
        }

        self.tracker.stopped(self.index);
        self.bus
            .publish(Event::now(EventKind::WorkerStopped).with_worker(self.index));
    }

    async fn execute(&self, job: Job<P>, stop: &CancellationToken) {
        let Job {
            id,
            payload,
            submitted_at,
        } = job;
        self.tracker.running(self.index, id);

        let max_attempts = self.params.retry.max_attempts.max(1);
        let mut payload = Some(payload);
        let mut attempt = 0u32;

        let outcome = loop {
            attempt += 1;
            // The last permitted attempt takes the payload by value.
            let input = match payload.take() {
                Some(p) if attempt < max_attempts => {
                    match panic::catch_unwind(AssertUnwindSafe(|| p.clone())) {
                        Ok(copy) => payload = Some(copy),
                        Err(panic) => {
                            break Err(JobError::Panicked {
                                detail: panic_detail(&*panic),
                            });
                        }
                    }
                    p
                }
                Some(p) => p,
                None => break Err(JobError::fail("payload consumed")),
            };

            self.bus.publish(
                Event::now(EventKind::JobStarted)
                    .with_job(id)
                    .with_worker(self.index)
                    .with_attempt(attempt),
            );
            let ctx = JobContext {
                id,
                worker: self.index,
                attempt,
                token: CancellationToken::new(),
            };
            let res = run_attempt(
                self.handler.as_ref(),
                ctx,
                input,
                self.params.timeout,
                &self.bus,
            )
            .await;

            let err = match res {
                Ok(out) => break Ok(out),
                Err(e) => e,
            };
            if !self.params.retry.should_retry(attempt, &err) {
                break Err(err);
            }

            let delay = self.params.retry.delay_after(attempt);
            self.bus.publish(
                Event::now(EventKind::RetryScheduled)
                    .with_job(id)
                    .with_worker(self.index)
                    .with_attempt(attempt)
                    .with_delay(delay)
                    .with_reason(err.to_string()),
            );
            select! {
                _ = time::sleep(delay) => {}
                _ = stop.cancelled() => break Err(err),
            }
        };

        let ev = match &outcome {
            Ok(_) => Event::now(EventKind::JobCompleted),
            Err(e) => Event::now(EventKind::JobFailed).with_reason(e.to_string()),
        };
        self.bus.publish(
            ev.with_job(id)
                .with_worker(self.index)
                .with_attempt(attempt),
        );

        self.sink.publish(JobResult {
            id,
            outcome,
            worker: Some(self.index),
            attempts: attempt,
            submitted_at,
            completed_at: Instant::now(),
        });
        self.tracker.idle(self.index);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        collector,
        jobs::{JobFn, JobId},
        policies::BackoffPolicy,
        stats::Counters,
    };
    use crate::core::tracker::WorkerState;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn worker<P, O>(
        handler: HandlerRef<P, O>,
        params: WorkerParams,
    ) -> (Worker<P, O>, Arc<WorkQueue<Job<P>>>, collector::Results<O>, Bus) {
        let queue = Arc::new(WorkQueue::new(8));
        let bus = Bus::new(64);
        let (sink, results) = collector::channel(Arc::new(Counters::default()));
        let w = Worker {
            index: 0,
            handler,
            queue: Arc::clone(&queue),
            sink,
            tracker: Arc::new(WorkerTracker::new(1)),
            bus: bus.clone(),
            params,
        };
        (w, queue, results, bus)
    }

    #[tokio::test(start_paused = true)]
    async fn retries_until_success() {
        let calls = Arc::new(AtomicU32::new(0));
        let seen = Arc::clone(&calls);
        let flaky: HandlerRef<u32, u32> = JobFn::arc("flaky", move |ctx: JobContext, n: u32| {
            let seen = Arc::clone(&seen);
            async move {
                seen.fetch_add(1, Ordering::SeqCst);
                if ctx.attempt < 3 {
                    Err(JobError::fail("transient"))
                } else {
                    Ok(n + 1)
                }
            }
        });
        let params = WorkerParams {
            timeout: None,
            retry: RetryPolicy::attempts(3, BackoffPolicy::constant(Duration::from_millis(10))),
        };
        let (w, queue, mut results, _bus) = worker(flaky, params);

        queue.try_enqueue(Job::new(7u64, 41)).unwrap();
        queue.close();
        w.run(CancellationToken::new()).await;

        let r = results.next().await.unwrap();
        assert_eq!(r.id, JobId::new(7));
        assert_eq!(r.outcome, Ok(42));
        assert_eq!(r.attempts, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn panicking_job_yields_error_and_worker_continues() {
        let h: HandlerRef<u32, u32> = JobFn::arc("p", |_ctx: JobContext, n: u32| async move {
            if n == 1 {
                panic!("bad input");
            }
            Ok::<_, JobError>(n)
        });
        let params = WorkerParams {
            timeout: None,
            retry: RetryPolicy::attempts(5, BackoffPolicy::default()),
        };
        let (w, queue, mut results, _bus) = worker(h, params);

        queue.try_enqueue(Job::new(1u64, 1)).unwrap();
        queue.try_enqueue(Job::new(2u64, 2)).unwrap();
        queue.close();
        w.run(CancellationToken::new()).await;

        let first = results.next().await.unwrap();
        assert!(matches!(first.outcome, Err(JobError::Panicked { .. })));
        assert_eq!(first.attempts, 1);
        let second = results.next().await.unwrap();
        assert_eq!(second.outcome, Ok(2));
    }

    #[derive(Debug)]
    struct Brittle(u32);

    impl Clone for Brittle {
        fn clone(&self) -> Self {
            panic!("cannot clone {}", self.0);
        }
    }

    #[tokio::test]
    async fn panicking_payload_clone_fails_only_its_job() {
        let h: HandlerRef<Brittle, u32> =
            JobFn::arc("brittle", |_ctx: JobContext, b: Brittle| async move {
                Ok::<_, JobError>(b.0)
            });
        let params = WorkerParams {
            timeout: None,
            retry: RetryPolicy::attempts(2, BackoffPolicy::default()),
        };
        let (w, queue, mut results, _bus) = worker(h, params);
        let tracker = Arc::clone(&w.tracker);

        queue.try_enqueue(Job::new(1u64, Brittle(1))).unwrap();
        queue.try_enqueue(Job::new(2u64, Brittle(2))).unwrap();
        queue.close();
        w.run(CancellationToken::new()).await;

        for id in [1, 2] {
            let r = results.next().await.unwrap();
            assert_eq!(r.id, JobId::new(id));
            match r.error() {
                Some(JobError::Panicked { detail }) => assert!(detail.contains("cannot clone")),
                other => panic!("unexpected outcome {other:?}"),
            }
        }
        assert_eq!(tracker.running_count(), 0);
        assert_eq!(tracker.snapshot(), vec![WorkerState::Stopped]);
    }

    #[tokio::test]
    async fn stop_leaves_queued_jobs_untouched() {
        let h: HandlerRef<u32, u32> =
            JobFn::arc("id", |_ctx: JobContext, n: u32| async move { Ok::<_, JobError>(n) });
        let params = WorkerParams {
            timeout: None,
            retry: RetryPolicy::never(),
        };
        let (w, queue, mut results, bus) = worker(h, params);
        let mut events = bus.subscribe();

        queue.try_enqueue(Job::new(1u64, 1)).unwrap();
        let stop = CancellationToken::new();
        stop.cancel();
        w.run(stop).await;

        assert_eq!(queue.len(), 1);
        assert!(results.try_next().is_none());
        assert_eq!(events.recv().await.unwrap().kind, EventKind::WorkerStarted);
        assert_eq!(events.recv().await.unwrap().kind, EventKind::WorkerStopped);
    }
}

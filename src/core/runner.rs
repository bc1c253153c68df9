//! # Run a single attempt of a job.
//!
//! Executes one attempt of a [`Handler`] with panic isolation and an optional
//! deadline, publishing `JobTimedOut` when the deadline hits.
//!
//! ```text
//! handler.call(ctx, payload) ── panics? ──► Err(Panicked)
//!          │
//!          ▼
//!  timeout(dur, fut.catch_unwind())
//!     ├─► Ok(Ok(out))    → Ok(out)
//!     ├─► Ok(Err(e))     → Err(e)
//!     ├─► panic          → Err(Panicked)
//!     └─► elapsed        → cancel ctx token, publish JobTimedOut → Err(Timeout)
//! ```
//!
//! ## Rules
//! - A panic in the handler never unwinds into the worker.
//! - The attempt's token is fresh per attempt and only the deadline cancels it.

use std::panic::AssertUnwindSafe;
use std::time::Duration;

use futures::FutureExt;
use tokio::time;

use crate::{
    error::{JobError, panic_detail},
    events::{Bus, Event, EventKind},
    jobs::{Handler, JobContext},
};

/// Executes a single attempt of a job.
pub(crate) async fn run_attempt<P: 'static, O: 'static>(
    handler: &dyn Handler<P, O>,
    ctx: JobContext,
    payload: P,
    timeout: Option<Duration>,
    bus: &Bus,
) -> Result<O, JobError> {
    let (id, worker, attempt) = (ctx.id, ctx.worker, ctx.attempt);
    let token = ctx.token.clone();

    let fut = match std::panic::catch_unwind(AssertUnwindSafe(|| handler.call(ctx, payload))) {
        Ok(fut) => fut,
        Err(panic) => {
            return Err(JobError::Panicked {
                detail: panic_detail(&*panic),
            });
        }
    };
    let guarded = AssertUnwindSafe(fut).catch_unwind();

    let res = match timeout {
        Some(dur) => match time::timeout(dur, guarded).await {
            Ok(r) => r,
            Err(_elapsed) => {
                token.cancel();
                bus.publish(
                    Event::now(EventKind::JobTimedOut)
                        .with_job(id)
                        .with_worker(worker)
                        .with_attempt(attempt)
                        .with_timeout(dur),
                );
                return Err(JobError::Timeout { timeout: dur });
            }
        },
        None => guarded.await,
    };

    res.unwrap_or_else(|panic| {
        Err(JobError::Panicked {
            detail: panic_detail(&*panic),
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::{JobFn, JobId};
    use tokio_util::sync::CancellationToken;

    fn ctx() -> JobContext {
        JobContext {
            id: JobId::new(1),
            worker: 0,
            attempt: 1,
            token: CancellationToken::new(),
        }
    }

    #[tokio::test]
    async fn panic_inside_future_is_captured() {
        let bus = Bus::new(8);
        let h = JobFn::new("boom", |_ctx: JobContext, n: u32| async move {
            if n > 0 {
                panic!("exploded on {n}");
            }
            Ok::<u32, JobError>(n)
        });

        let res = run_attempt::<u32, u32>(&h, ctx(), 3, None, &bus).await;
        assert_eq!(
            res,
            Err(JobError::Panicked {
                detail: "exploded on 3".into()
            })
        );
    }

    #[tokio::test]
    async fn panic_while_building_future_is_captured() {
        struct Eager;
        impl Handler<u32, u32> for Eager {
            fn name(&self) -> &str {
                "eager"
            }
            fn call(&self, _ctx: JobContext, _payload: u32) -> crate::jobs::BoxJobFuture<u32> {
                panic!("before await");
            }
        }

        let bus = Bus::new(8);
        let res = run_attempt::<u32, u32>(&Eager, ctx(), 0, None, &bus).await;
        assert!(matches!(res, Err(JobError::Panicked { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_cancels_token_and_publishes() {
        let bus = Bus::new(8);
        let mut rx = bus.subscribe();
        let c = ctx();
        let token = c.token.clone();
        let h = JobFn::new("slow", |_ctx: JobContext, _: ()| async move {
            time::sleep(Duration::from_secs(10)).await;
            Ok::<(), JobError>(())
        });

        let res = run_attempt::<(), ()>(&h, c, (), Some(Duration::from_millis(50)), &bus).await;
        assert_eq!(
            res,
            Err(JobError::Timeout {
                timeout: Duration::from_millis(50)
            })
        );
        assert!(token.is_cancelled());

        let ev = rx.recv().await.unwrap();
        assert_eq!(ev.kind, EventKind::JobTimedOut);
        assert_eq!(ev.timeout_ms, Some(50));
    }
}

//! # Job handler abstraction and function-backed implementation.
//!
//! [`Handler`] turns one job payload into a future producing the job output.
//! [`JobFn`] wraps a closure `F: Fn(JobContext, P) -> Fut`, producing a fresh
//! future per call, so no state is shared between jobs unless the closure
//! captures an `Arc<...>` explicitly.
//!
//! ## Example
//! ```rust
//! use taskpool::{HandlerRef, JobContext, JobError, JobFn};
//!
//! let double: HandlerRef<u64, u64> = JobFn::arc("double", |_ctx: JobContext, n: u64| async move {
//!     Ok::<_, JobError>(n * 2)
//! });
//!
//! assert_eq!(double.name(), "double");
//! ```

use std::borrow::Cow;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::error::JobError;

use super::JobId;

/// Boxed future returned by [`Handler::call`].
pub type BoxJobFuture<O> = Pin<Box<dyn Future<Output = Result<O, JobError>> + Send + 'static>>;

/// Shared handle to a handler (`Arc<dyn Handler<P, O>>`).
pub type HandlerRef<P, O> = Arc<dyn Handler<P, O>>;

/// Per-attempt execution context handed to a handler.
#[derive(Clone, Debug)]
pub struct JobContext {
    /// Job being executed.
    pub id: JobId,
    /// Index of the worker executing the job.
    pub worker: usize,
    /// Attempt number (1-based).
    pub attempt: u32,
    /// Cancelled when the per-job timeout expires.
    ///
    /// Pool shutdown or cancellation never fires this token: a job that has
    /// started always runs to completion unless it times out.
    pub token: CancellationToken,
}

impl JobContext {
    /// True once the attempt has been asked to stop (timeout hit).
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// # Asynchronous job executor.
///
/// Implementors must be cheap to call repeatedly: retries call
/// [`call`](Handler::call) again with a clone of the payload.
pub trait Handler<P, O>: Send + Sync + 'static {
    /// Returns a stable, human-readable handler name.
    fn name(&self) -> &str;

    /// Creates the future executing one attempt of a job.
    fn call(&self, ctx: JobContext, payload: P) -> BoxJobFuture<O>;
}

/// Function-backed handler implementation.
#[derive(Debug)]
pub struct JobFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> JobFn<F> {
    /// Creates a new function-backed handler.
    ///
    /// Prefer [`JobFn::arc`] when you immediately need a [`HandlerRef`].
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }

    /// Creates the handler and returns it as a shared handle.
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

impl<P, O, F, Fut> Handler<P, O> for JobFn<F>
where
    F: Fn(JobContext, P) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<O, JobError>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn call(&self, ctx: JobContext, payload: P) -> BoxJobFuture<O> {
        Box::pin((self.f)(ctx, payload))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn job_fn_produces_fresh_future_per_call() {
        let h: HandlerRef<u32, String> =
            JobFn::arc("fmt", |ctx: JobContext, n: u32| async move {
                Ok::<_, JobError>(format!("{}:{n}", ctx.id))
            });

        let ctx = JobContext {
            id: JobId::new(3),
            worker: 0,
            attempt: 1,
            token: CancellationToken::new(),
        };
        assert_eq!(h.call(ctx.clone(), 1).await.unwrap(), "#3:1");
        assert_eq!(h.call(ctx, 2).await.unwrap(), "#3:2");
        assert_eq!(h.name(), "fmt");
    }
}

use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;

use crate::{
    config::PoolConfig,
    events::{Bus, EventKind},
    jobs::HandlerRef,
    subscribers::{Subscribe, SubscriberSet},
};

use super::pool::Pool;

/// Builder for constructing a [`Pool`] with optional features.
pub struct PoolBuilder<P, O> {
    cfg: PoolConfig,
    handler: HandlerRef<P, O>,
    subscribers: Vec<Arc<dyn Subscribe>>,
    parent: Option<CancellationToken>,
}

impl<P, O> PoolBuilder<P, O>
where
    P: Clone + Send + 'static,
    O: Send + 'static,
{
    /// Creates a new builder with the given configuration and job handler.
    pub fn new(cfg: PoolConfig, handler: HandlerRef<P, O>) -> Self {
        Self {
            cfg,
            handler,
            subscribers: Vec::new(),
            parent: None,
        }
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive pool events (job lifecycle, drain, failures)
    /// through dedicated workers with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Ties the pool to an external cancellation signal.
    ///
    /// Cancelling `token` has the same effect as [`Pool::cancel`], also before
    /// the pool is started.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.parent = Some(token);
        self
    }

    /// Builds the pool.
    ///
    /// Initializes the event bus and, when subscribers are set, spawns the
    /// listener forwarding bus events to them. Also spawns the task that
    /// drains the pool once it is cancelled. Must be called inside a tokio
    /// runtime.
    pub fn build(self) -> Arc<Pool<P, O>> {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let runtime_token = match &self.parent {
            Some(parent) => parent.child_token(),
            None => CancellationToken::new(),
        };

        if !self.subscribers.is_empty() {
            spawn_listener(&bus, self.subscribers);
        }
        let pool = Arc::new(Pool::new_internal(self.cfg, self.handler, bus, runtime_token));
        pool.watch_cancellation();
        pool
    }
}

/// Forwards bus events to the subscriber set until the pool stops, then
/// flushes the subscriber queues.
fn spawn_listener(bus: &Bus, subscribers: Vec<Arc<dyn Subscribe>>) {
    let mut rx = bus.subscribe();
    let set = SubscriberSet::new(subscribers, bus.clone());

    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(ev) => {
                    set.emit(&ev);
                    if ev.kind == EventKind::PoolStopped {
                        break;
                    }
                }
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            }
        }
        set.shutdown().await;
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::JobError,
        events::Event,
        jobs::{JobContext, JobFn},
    };
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::time::Duration;
    use tokio::sync::Notify;

    #[derive(Default)]
    struct Recorder {
        kinds: Mutex<Vec<EventKind>>,
        stopped: Notify,
    }

    #[async_trait]
    impl Subscribe for Recorder {
        async fn on_event(&self, event: &Event) {
            self.kinds.lock().push(event.kind);
            if event.kind == EventKind::PoolStopped {
                self.stopped.notify_one();
            }
        }

        fn name(&self) -> &'static str {
            "recorder"
        }
    }

    #[tokio::test]
    async fn subscribers_see_pool_lifecycle() {
        let recorder = Arc::new(Recorder::default());
        let h: HandlerRef<u32, u32> =
            JobFn::arc("id", |_ctx: JobContext, n: u32| async move { Ok::<_, JobError>(n) });

        let pool = Pool::builder(PoolConfig::default(), h)
            .with_subscribers(vec![recorder.clone() as Arc<dyn Subscribe>])
            .build();
        pool.start().unwrap();
        pool.submit(5).await.unwrap();
        pool.shutdown(Duration::from_secs(1)).await.unwrap();

        tokio::time::timeout(Duration::from_secs(1), recorder.stopped.notified())
            .await
            .unwrap();
        let kinds = recorder.kinds.lock().clone();
        assert_eq!(kinds.first(), Some(&EventKind::PoolStarted));
        assert!(kinds.contains(&EventKind::JobCompleted));
        assert_eq!(kinds.last(), Some(&EventKind::PoolStopped));
    }
}

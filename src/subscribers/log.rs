//! # LogWriter: simple event printer
//!
//! A minimal subscriber that prints incoming [`Event`]s to stdout, one line
//! per event. Use it for demos and debugging.
//!
//! ## Example output
//! ```text
//! [pool-started] workers=2
//! [submitted] job=#1
//! [started] job=#1 worker=0 attempt=1
//! [retry] job=#1 worker=0 attempt=1 delay=100ms err="execution failed: flaky"
//! [completed] job=#1 worker=0 attempt=2
//! [drain-requested]
//! [drain-timed-out] timeout=0ms pending=3
//! [pool-stopped]
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Renders one event as a log line.
    pub fn render(e: &Event) -> String {
        let mut line = format!("[{}]", e.kind.as_label());

        if let Some(job) = e.job {
            line.push_str(&format!(" job={job}"));
        }
        if let Some(w) = e.worker {
            line.push_str(&format!(" worker={w}"));
        }
        if let Some(a) = e.attempt {
            line.push_str(&format!(" attempt={a}"));
        }
        if let Some(ms) = e.delay_ms {
            line.push_str(&format!(" delay={ms}ms"));
        }
        if let Some(ms) = e.timeout_ms {
            line.push_str(&format!(" timeout={ms}ms"));
        }
        if let Some(n) = e.count {
            let key = match e.kind {
                EventKind::PoolStarted => "workers",
                EventKind::CancelRequested => "abandoned",
                _ => "pending",
            };
            line.push_str(&format!(" {key}={n}"));
        }
        if let Some(reason) = e.reason.as_deref() {
            match e.kind {
                EventKind::SubscriberOverflow | EventKind::SubscriberPanicked => {
                    line.push_str(&format!(" {reason}"));
                }
                _ => line.push_str(&format!(" err={reason:?}")),
            }
        }
        line
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        println!("{}", Self::render(e));
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::JobId;
    use std::time::Duration;

    #[test]
    fn renders_job_fields() {
        let ev = Event::now(EventKind::RetryScheduled)
            .with_job(JobId::new(4))
            .with_worker(1)
            .with_attempt(2)
            .with_delay(Duration::from_millis(250))
            .with_reason("boom");
        assert_eq!(
            LogWriter::render(&ev),
            r#"[retry] job=#4 worker=1 attempt=2 delay=250ms err="boom""#
        );
    }

    #[test]
    fn renders_pool_counters() {
        let ev = Event::now(EventKind::PoolStarted).with_count(3);
        assert_eq!(LogWriter::render(&ev), "[pool-started] workers=3");
    }
}

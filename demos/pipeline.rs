//! # Example: pipeline
//!
//! Demonstrates a rate-limited worker pool end to end:
//! - burst admission followed by throttled submits (token bucket),
//! - backpressure on a small queue,
//! - a flaky handler retried with backoff,
//! - a panicking job isolated from its siblings,
//! - graceful drain with a deadline.
//!
//! ## Flow
//! ```text
//! producer ── submit() ──► Pool (limiter 3 / 100ms, queue 5) ──► 2 workers
//!                                                                   │
//!                                 Results stream ◄── JobResult ─────┘
//! Bus ──► LogWriter (prints every event)
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example pipeline --features logging
//! ```

use std::{sync::Arc, time::Duration};

use taskpool::{
    BackoffPolicy, HandlerRef, JitterPolicy, JobContext, JobError, JobFn, LimiterConfig, LogWriter,
    Pool, PoolConfig, RetryPolicy, Subscribe,
};

/// Squares its input; fails on the first attempt for multiples of 4 and
/// panics on 13.
fn square() -> HandlerRef<u64, u64> {
    JobFn::arc("square", |ctx: JobContext, n: u64| async move {
        tokio::time::sleep(Duration::from_millis(30)).await;
        if n == 13 {
            panic!("unlucky input {n}");
        }
        if n % 4 == 0 && ctx.attempt == 1 {
            return Err(JobError::fail(format!("transient failure on {n}")));
        }
        Ok(n * n)
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = PoolConfig {
        workers: 2,
        queue_capacity: 5,
        limiter: Some(LimiterConfig::new(3, Duration::from_millis(100))),
        job_timeout: Duration::from_secs(1),
        retry: RetryPolicy::attempts(
            3,
            BackoffPolicy {
                first: Duration::from_millis(20),
                max: Duration::from_millis(200),
                factor: 2.0,
                jitter: JitterPolicy::Equal,
            },
        ),
        ..PoolConfig::default()
    };

    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::default())];
    let pool = Pool::builder(cfg, square()).with_subscribers(subs).build();
    let mut results = pool
        .results()
        .ok_or_else(|| anyhow::anyhow!("results already taken"))?;
    pool.start()?;

    let producer = {
        let pool = Arc::clone(&pool);
        tokio::spawn(async move {
            for n in 1..=15 {
                pool.submit(n).await?;
            }
            Ok::<_, taskpool::PoolError>(())
        })
    };

    producer.await??;
    pool.shutdown(Duration::from_secs(5)).await?;

    let mut total = 0;
    while let Some(r) = results.next().await {
        match &r.outcome {
            Ok(v) => total += v,
            Err(e) => println!("job {} failed after {} attempt(s): {}", r.id, r.attempts, e),
        }
    }

    let stats = pool.stats();
    println!(
        "done: submitted={} succeeded={} failed={} sum={total}",
        stats.submitted, stats.succeeded, stats.failed
    );
    Ok(())
}

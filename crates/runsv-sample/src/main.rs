//! # runsv Demo
//!
//! Starts the [`SampleSystem`], runs a few cache reads and writes against the pool, and
//! shuts everything down again while logging every lifecycle event.
//!
//! ```bash
//! RUST_LOG=info cargo run -p runsv-sample
//! ```

use runsv::framework::BoxError;
use runsv::lifecycle::setup_tracing;
use runsv_sample::pool::Statement;
use runsv_sample::system::{SampleConfig, SampleSystem};
use tracing::{info, info_span, Instrument};

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    setup_tracing();

    let system = SampleSystem::new(SampleConfig::default())?;

    let watcher = system.watch_events();

    system.start().await?;

    let span = info_span!("workload");
    async {
        let pool = system.pool_client().ok_or("pool is not running")?;
        pool.query(Statement::put("user:1", "Alice")).await?;
        pool.query(Statement::put("user:2", "Bob")).await?;

        let cache = system.cache_client().ok_or("cache is not running")?;
        for key in ["user:1", "user:1", "user:2", "user:3"] {
            let value = cache.get(key).await?;
            info!(key, ?value, "Read");
        }
        cache.put("user:3", "Carol").await?;

        let stats = cache.stats();
        info!(
            hits = stats.hits,
            misses = stats.misses,
            entries = stats.entries,
            "Cache stats"
        );
        Ok::<_, BoxError>(())
    }
    .instrument(span)
    .await?;

    system.shutdown().await?;

    drop(system);
    let events = watcher.await?;
    info!(events, "Demo completed");
    Ok(())
}

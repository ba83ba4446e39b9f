//! Periodic job trigger process.
//!
//! Enqueues the unscoped spam sweep, link expiry and pending cleanup on
//! their configured intervals. Run exactly one scheduler per deployment;
//! the jobs themselves are picked up by the `worker` processes.
//!
//! # Usage
//!
//! ```bash
//! EXPIRE_INTERVAL_SECS=600 cargo run --bin scheduler
//! ```

use std::sync::Arc;

use anyhow::Result;
use tokio_util::sync::CancellationToken;

use tinylinks::application::jobs::{JobDispatcher, Scheduler};
use tinylinks::config;
use tinylinks::infrastructure::persistence::PgJobRepository;
use tinylinks::server;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = config::load_from_env()?;
    tinylinks::telemetry::init(&config.log_level, &config.log_format);

    let pool = Arc::new(server::connect(&config).await?);
    let dispatcher = JobDispatcher::new(Arc::new(PgJobRepository::new(pool)));

    let scheduler = Scheduler::standard(dispatcher, config.schedule_intervals())?;

    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        server::shutdown_signal().await;
        signal_token.cancel();
    });

    scheduler.run(shutdown).await;
    Ok(())
}

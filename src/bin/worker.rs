//! Job worker process.
//!
//! Leases jobs from the shared queue and runs the geo enrichment, spam
//! detection, expiry and pending cleanup handlers. Any number of worker
//! processes may run against the same database.
//!
//! # Usage
//!
//! ```bash
//! WORKER_COUNT=8 GEO_ENDPOINT="https://geo.example.com/{ip}" cargo run --bin worker
//! ```
//!
//! On SIGINT/SIGTERM each worker finishes its current job and exits.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;

use tinylinks::application::jobs::handlers::{
    DetectSpamHandler, ExpireHandler, ParseGeoHandler, RemovePendingHandler,
};
use tinylinks::application::jobs::{HandlerRegistry, JobDispatcher, WorkerPool};
use tinylinks::config;
use tinylinks::domain::entities::JobKind;
use tinylinks::domain::repositories::JobRepository;
use tinylinks::infrastructure::geo::{GeoResolver, HttpGeoResolver, NullGeoResolver};
use tinylinks::infrastructure::persistence::{
    PgAnalyticsRepository, PgJobRepository, PgLinkRepository,
};
use tinylinks::infrastructure::threat::{NullThreatLookup, SafeBrowsingClient, ThreatLookup};
use tinylinks::server;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = config::load_from_env()?;
    tinylinks::telemetry::init(&config.log_level, &config.log_format);
    config.print_summary();

    let pool = Arc::new(server::connect(&config).await?);

    let geo: Arc<dyn GeoResolver> = match &config.geo_endpoint {
        Some(endpoint) => Arc::new(
            HttpGeoResolver::new(endpoint.clone()).context("Failed to build geo client")?,
        ),
        None => {
            tracing::warn!("GEO_ENDPOINT not set, clicks will not be located");
            Arc::new(NullGeoResolver::new())
        }
    };

    let threats: Arc<dyn ThreatLookup> = match &config.safe_browsing_api_key {
        Some(key) => Arc::new(
            SafeBrowsingClient::new(key.clone()).context("Failed to build Safe Browsing client")?,
        ),
        None => {
            tracing::warn!("SAFE_BROWSING_API_KEY not set, spam detection reports no threats");
            Arc::new(NullThreatLookup::new())
        }
    };

    let links = Arc::new(PgLinkRepository::new(pool.clone()));
    let analytics = Arc::new(PgAnalyticsRepository::new(pool.clone()));
    let jobs: Arc<dyn JobRepository> = Arc::new(PgJobRepository::new(pool.clone()));

    let registry = HandlerRegistry::new()
        .with(ParseGeoHandler::new(analytics, geo))?
        .with(
            DetectSpamHandler::new(links.clone(), threats)
                .with_time_budget(config.spam_scan_budget(), JobDispatcher::new(jobs.clone())),
        )?
        .with(ExpireHandler::new(links.clone()))?
        .with(RemovePendingHandler::new(links))?;

    let workers = WorkerPool::new(
        jobs,
        registry,
        config.worker_config(),
        config.worker_count,
        &JobKind::ALL,
    )?;

    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        server::shutdown_signal().await;
        signal_token.cancel();
    });

    workers.run(shutdown).await;
    Ok(())
}

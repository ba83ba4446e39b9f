//! `GET /health`: database reachability and job queue depth.

use axum::{Json, extract::State, http::StatusCode};

use crate::api::dto::health::{CheckResult, HealthChecks, HealthResponse, ServiceStatus};
use crate::state::AppState;

/// Checks PostgreSQL and the job table.
///
/// Answers `200` when both checks pass and `503` otherwise. The body has the
/// same shape either way:
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "checks": {
///     "database": { "status": "ok", "message": "Connected" },
///     "job_queue": {
///       "status": "ok",
///       "message": "pending: 3, leased: 1, dead: 0",
///       "depth": { "pending": 3, "leased": 1, "dead": 0 }
///     }
///   }
/// }
/// ```
pub async fn health_handler(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let checks = HealthChecks {
        database: check_database(&state).await,
        job_queue: check_job_queue(&state).await,
    };

    let (code, status) = if checks.database.is_ok() && checks.job_queue.is_ok() {
        (StatusCode::OK, ServiceStatus::Healthy)
    } else {
        tracing::warn!(
            database = %checks.database.message,
            job_queue = %checks.job_queue.message,
            "Health check degraded"
        );
        (StatusCode::SERVICE_UNAVAILABLE, ServiceStatus::Degraded)
    };

    let body = HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        checks,
    };
    (code, Json(body))
}

async fn check_database(state: &AppState) -> CheckResult {
    match sqlx::query("SELECT 1").execute(state.pool.as_ref()).await {
        Ok(_) => CheckResult::ok("Connected"),
        Err(e) => CheckResult::error(format!("Database error: {e}")),
    }
}

// Dead jobs are reported but never degrade health.
async fn check_job_queue(state: &AppState) -> CheckResult {
    match state.jobs.queue_stats().await {
        Ok(stats) => CheckResult {
            depth: Some(stats),
            ..CheckResult::ok(format!(
                "pending: {}, leased: {}, dead: {}",
                stats.pending, stats.leased, stats.dead
            ))
        },
        Err(e) => CheckResult::error(format!("Job queue error: {e}")),
    }
}

//! PostgreSQL implementation of the job queue.
//!
//! Leasing uses the `FOR UPDATE SKIP LOCKED` pattern: the inner `SELECT`
//! locks one candidate row and skips rows already locked by a concurrent
//! claimant, and the outer `UPDATE` stamps the lease in the same statement.
//! Workers therefore never block on each other and never receive the same
//! job twice while a lease is live.
//!
//! `attempts` is bumped when a job is leased, not when it fails, so a job
//! whose worker dies mid-run still moves toward the dead-letter ceiling.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;

use crate::domain::entities::{
    DeadJob, FailureDisposition, Job, JobFailure, JobId, JobKind, NewJob, QueueStats,
};
use crate::domain::repositories::JobRepository;
use crate::error::AppError;

#[derive(sqlx::FromRow)]
struct JobRow {
    id: i64,
    kind: String,
    payload: serde_json::Value,
    queued_at: DateTime<Utc>,
    run_at: DateTime<Utc>,
    attempts: i32,
    last_error: Option<String>,
    lease_owner: Option<String>,
    lease_expires_at: Option<DateTime<Utc>>,
}

impl TryFrom<JobRow> for Job {
    type Error = AppError;

    fn try_from(r: JobRow) -> Result<Self, Self::Error> {
        let kind = r.kind.parse::<JobKind>().map_err(|e| {
            AppError::internal("Unknown job kind in queue", json!({ "reason": e.to_string() }))
        })?;

        Ok(Job {
            id: JobId(r.id),
            kind,
            payload: r.payload,
            queued_at: r.queued_at,
            run_at: r.run_at,
            attempts: r.attempts,
            last_error: r.last_error,
            lease_owner: r.lease_owner,
            lease_expires_at: r.lease_expires_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct DeadJobRow {
    id: i64,
    kind: String,
    payload: serde_json::Value,
    attempts: i32,
    last_error: Option<String>,
    queued_at: DateTime<Utc>,
    dead_at: DateTime<Utc>,
}

/// PostgreSQL-backed durable job store.
pub struct PgJobRepository {
    pool: Arc<PgPool>,
}

impl PgJobRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobRepository for PgJobRepository {
    async fn enqueue(&self, job: NewJob) -> Result<JobId, AppError> {
        let id: i64 =
            sqlx::query_scalar("INSERT INTO jobs (kind, payload) VALUES ($1, $2) RETURNING id")
                .bind(job.kind.as_str())
                .bind(&job.payload)
                .fetch_one(self.pool.as_ref())
                .await?;

        Ok(JobId(id))
    }

    async fn lease_next(
        &self,
        worker_id: &str,
        kinds: &[JobKind],
        lease_duration: Duration,
    ) -> Result<Option<Job>, AppError> {
        let kinds: Vec<String> = kinds.iter().map(|k| k.as_str().to_string()).collect();

        let row = sqlx::query_as::<_, JobRow>(
            r#"
            UPDATE jobs
            SET lease_owner = $1,
                lease_expires_at = NOW() + make_interval(secs => $3),
                attempts = attempts + 1
            WHERE id = (
                SELECT id
                FROM jobs
                WHERE kind = ANY($2)
                  AND dead_at IS NULL
                  AND run_at <= NOW()
                  AND (lease_expires_at IS NULL OR lease_expires_at < NOW())
                ORDER BY run_at, id
                LIMIT 1
                FOR UPDATE SKIP LOCKED
            )
            RETURNING id, kind, payload, queued_at, run_at, attempts, last_error,
                      lease_owner, lease_expires_at
            "#,
        )
        .bind(worker_id)
        .bind(&kinds)
        .bind(lease_duration.as_secs_f64())
        .fetch_optional(self.pool.as_ref())
        .await?;

        row.map(Job::try_from).transpose()
    }

    async fn retire(&self, id: JobId) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM jobs WHERE id = $1")
            .bind(id.0)
            .execute(self.pool.as_ref())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn release_failed(&self, id: JobId, failure: JobFailure) -> Result<(), AppError> {
        match failure.disposition {
            FailureDisposition::RetryAt(run_at) => {
                sqlx::query(
                    r#"
                    UPDATE jobs
                    SET lease_owner = NULL,
                        lease_expires_at = NULL,
                        last_error = $2,
                        run_at = $3
                    WHERE id = $1
                    "#,
                )
                .bind(id.0)
                .bind(&failure.error)
                .bind(run_at)
                .execute(self.pool.as_ref())
                .await?;
            }
            FailureDisposition::DeadLetter => {
                sqlx::query(
                    r#"
                    UPDATE jobs
                    SET lease_owner = NULL,
                        lease_expires_at = NULL,
                        last_error = $2,
                        dead_at = NOW()
                    WHERE id = $1
                    "#,
                )
                .bind(id.0)
                .bind(&failure.error)
                .execute(self.pool.as_ref())
                .await?;
            }
        }

        Ok(())
    }

    async fn queue_stats(&self) -> Result<QueueStats, AppError> {
        let (pending, leased, dead): (i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT
                COUNT(*) FILTER (
                    WHERE dead_at IS NULL
                      AND (lease_expires_at IS NULL OR lease_expires_at < NOW())
                ),
                COUNT(*) FILTER (WHERE dead_at IS NULL AND lease_expires_at >= NOW()),
                COUNT(*) FILTER (WHERE dead_at IS NOT NULL)
            FROM jobs
            "#,
        )
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(QueueStats {
            pending,
            leased,
            dead,
        })
    }

    async fn list_dead(&self, limit: i64) -> Result<Vec<DeadJob>, AppError> {
        let rows = sqlx::query_as::<_, DeadJobRow>(
            r#"
            SELECT id, kind, payload, attempts, last_error, queued_at, dead_at
            FROM jobs
            WHERE dead_at IS NOT NULL
            ORDER BY dead_at DESC, id DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| DeadJob {
                id: JobId(r.id),
                kind: r.kind,
                payload: r.payload,
                attempts: r.attempts,
                last_error: r.last_error,
                queued_at: r.queued_at,
                dead_at: r.dead_at,
            })
            .collect())
    }

    async fn requeue_dead(&self, id: JobId) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE jobs
            SET dead_at = NULL,
                attempts = 0,
                run_at = NOW(),
                lease_owner = NULL,
                lease_expires_at = NULL
            WHERE id = $1 AND dead_at IS NOT NULL
            "#,
        )
        .bind(id.0)
        .execute(self.pool.as_ref())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn purge_dead(&self) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM jobs WHERE dead_at IS NOT NULL")
            .execute(self.pool.as_ref())
            .await?;

        Ok(result.rows_affected())
    }
}

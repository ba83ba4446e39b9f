//! Repository trait for the durable job queue.

use crate::domain::entities::{DeadJob, Job, JobFailure, JobId, JobKind, NewJob, QueueStats};
use crate::error::AppError;
use async_trait::async_trait;
use std::time::Duration;

/// The durable job store.
///
/// A job is pending, leased, dead, or retired (deleted). Leasing is atomic:
/// two concurrent callers of [`JobRepository::lease_next`] never receive the
/// same job, and a worker that crashes mid-job loses its lease once
/// `lease_duration` elapses, making the job eligible again. Delivery is
/// therefore at-least-once.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgJobRepository`] - PostgreSQL (`FOR UPDATE SKIP LOCKED`)
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait JobRepository: Send + Sync {
    /// Appends a new pending job.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] if the store is unavailable.
    async fn enqueue(&self, job: NewJob) -> Result<JobId, AppError>;

    /// Claims the oldest due job whose kind is in `kinds` and increments its
    /// `attempts`.
    ///
    /// Returns `None` when nothing is eligible; the caller is expected to
    /// back off before polling again.
    async fn lease_next(
        &self,
        worker_id: &str,
        kinds: &[JobKind],
        lease_duration: Duration,
    ) -> Result<Option<Job>, AppError>;

    /// Deletes a job after successful processing.
    ///
    /// Returns `false` if the job no longer exists.
    async fn retire(&self, id: JobId) -> Result<bool, AppError>;

    /// Clears the lease after a failed attempt, records the error and
    /// reschedules or dead-letters the job.
    async fn release_failed(&self, id: JobId, failure: JobFailure) -> Result<(), AppError>;

    /// Counts pending, leased and dead jobs.
    async fn queue_stats(&self) -> Result<QueueStats, AppError>;

    /// Lists dead-lettered jobs, most recent first.
    async fn list_dead(&self, limit: i64) -> Result<Vec<DeadJob>, AppError>;

    /// Puts a dead job back into rotation with a fresh attempt count.
    ///
    /// Returns `false` if no dead job has this id.
    async fn requeue_dead(&self, id: JobId) -> Result<bool, AppError>;

    /// Deletes every dead job. Returns the number removed.
    async fn purge_dead(&self) -> Result<u64, AppError>;
}

//! Worker loops that lease jobs and run their handlers.
//!
//! Each worker is a long-running task:
//!
//! ```text
//! Idle -> Leasing -> Executing -> (Retiring | ReleasingFailed) -> Idle
//! ```
//!
//! The shared [`CancellationToken`] is only checked between jobs, so a
//! shutdown lets the in-flight handler finish before the worker exits.
//! Handlers run in their own task: a panic surfaces as a [`JoinError`] and is
//! recorded as a failed attempt instead of taking the worker down.
//!
//! The store counts a delivery when it leases the job. A job that comes back
//! with more deliveries than the retry ceiling allows crashed its worker every
//! time, so it is dead-lettered without running the handler again.

use chrono::Utc;
use std::any::Any;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::error::{JobError, RegistryError};
use super::handler::HandlerRegistry;
use super::retry::RetryPolicy;
use crate::domain::entities::{FailureDisposition, Job, JobFailure, JobKind};
use crate::domain::repositories::JobRepository;
use crate::error::AppError;

/// Tuning shared by every worker of a pool.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Sleep between polls when the queue has nothing eligible.
    pub poll_interval: Duration,
    /// How long a lease hides a job from other workers.
    pub lease_duration: Duration,
    /// Hard limit for one handler invocation. Must be shorter than the lease.
    pub job_timeout: Duration,
    pub retry: RetryPolicy,
    /// Leading part of worker ids, followed by the process id and an index.
    pub id_prefix: String,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(1000),
            lease_duration: Duration::from_secs(300),
            job_timeout: Duration::from_secs(120),
            retry: RetryPolicy::default(),
            id_prefix: "worker".to_string(),
        }
    }
}

/// Result of processing one leased job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Retired,
    Rescheduled,
    DeadLettered,
}

/// A single worker loop.
pub struct Worker {
    id: String,
    kinds: Vec<JobKind>,
    jobs: Arc<dyn JobRepository>,
    registry: Arc<HandlerRegistry>,
    config: WorkerConfig,
}

impl Worker {
    pub fn new(
        id: impl Into<String>,
        jobs: Arc<dyn JobRepository>,
        registry: Arc<HandlerRegistry>,
        config: WorkerConfig,
    ) -> Self {
        let kinds = registry.kinds();
        Self {
            id: id.into(),
            kinds,
            jobs,
            registry,
            config,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Runs until `shutdown` is cancelled.
    pub async fn run(self, shutdown: CancellationToken) {
        info!(worker = %self.id, kinds = ?self.kinds, "Worker started");

        while !shutdown.is_cancelled() {
            match self.run_once().await {
                Ok(Some(_)) => continue,
                Ok(None) => {}
                Err(e) => error!(worker = %self.id, error = %e, "Failed to lease job"),
            }

            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(self.config.poll_interval) => {}
            }
        }

        info!(worker = %self.id, "Worker stopped");
    }

    /// Leases and processes at most one job.
    ///
    /// Returns `Ok(None)` when nothing is eligible.
    pub async fn run_once(&self) -> Result<Option<JobOutcome>, AppError> {
        let Some(job) = self
            .jobs
            .lease_next(&self.id, &self.kinds, self.config.lease_duration)
            .await?
        else {
            return Ok(None);
        };

        Ok(Some(self.process(job).await))
    }

    async fn process(&self, job: Job) -> JobOutcome {
        let job_id = job.id;
        let kind = job.kind;
        let attempts = job.attempts;
        debug!(worker = %self.id, job_id = %job_id, kind = %kind, attempts, "Job leased");

        let ceiling = i32::try_from(self.config.retry.max_attempts).unwrap_or(i32::MAX);
        let result = if attempts > ceiling {
            Err(JobError::Abandoned(attempts - 1))
        } else {
            self.execute(job).await
        };

        match result {
            Ok(()) => {
                if let Err(e) = self.jobs.retire(job_id).await {
                    // The lease runs out and the job is delivered again.
                    error!(job_id = %job_id, kind = %kind, error = %e, "Failed to retire job");
                }
                metrics::counter!("jobs_retired_total", "kind" => kind.as_str()).increment(1);
                info!(worker = %self.id, job_id = %job_id, kind = %kind, "Job completed");
                JobOutcome::Retired
            }
            Err(job_error) => {
                metrics::counter!("jobs_failed_total", "kind" => kind.as_str()).increment(1);

                let disposition = self.config.retry.disposition(attempts, Utc::now());
                let outcome = match disposition {
                    FailureDisposition::RetryAt(run_at) => {
                        warn!(
                            job_id = %job_id, kind = %kind, attempts,
                            retry_at = %run_at, error = %job_error, "Job failed, rescheduled"
                        );
                        JobOutcome::Rescheduled
                    }
                    FailureDisposition::DeadLetter => {
                        metrics::counter!("jobs_dead_lettered_total", "kind" => kind.as_str())
                            .increment(1);
                        error!(
                            job_id = %job_id, kind = %kind, attempts,
                            error = %job_error, "Job failed permanently, dead-lettered"
                        );
                        JobOutcome::DeadLettered
                    }
                };

                let failure = JobFailure {
                    error: job_error.to_string(),
                    disposition,
                };
                if let Err(e) = self.jobs.release_failed(job_id, failure).await {
                    error!(job_id = %job_id, kind = %kind, error = %e, "Failed to release job");
                }

                outcome
            }
        }
    }

    async fn execute(&self, job: Job) -> Result<(), JobError> {
        let handler = self
            .registry
            .get(job.kind)
            .ok_or(JobError::Unhandled(job.kind))?;

        let mut task = tokio::spawn(async move { handler.handle(&job).await });

        match tokio::time::timeout(self.config.job_timeout, &mut task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_error)) => Err(JobError::Panicked(join_error_message(join_error))),
            Err(_) => {
                task.abort();
                Err(JobError::TimedOut(self.config.job_timeout))
            }
        }
    }
}

fn join_error_message(error: JoinError) -> String {
    if !error.is_panic() {
        return error.to_string();
    }
    panic_message(error.into_panic())
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// A fixed-size set of workers sharing one registry and one store.
pub struct WorkerPool {
    jobs: Arc<dyn JobRepository>,
    registry: Arc<HandlerRegistry>,
    config: WorkerConfig,
    size: usize,
}

impl WorkerPool {
    /// Builds a pool that must be able to run every kind in `required`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::MissingHandler`] if a required kind has no
    /// handler.
    pub fn new(
        jobs: Arc<dyn JobRepository>,
        registry: HandlerRegistry,
        config: WorkerConfig,
        size: usize,
        required: &[JobKind],
    ) -> Result<Self, RegistryError> {
        registry.require(required)?;

        Ok(Self {
            jobs,
            registry: Arc::new(registry),
            config,
            size: size.max(1),
        })
    }

    /// Spawns the workers and waits until they have all stopped.
    pub async fn run(self, shutdown: CancellationToken) {
        let mut workers = self.spawn(shutdown);
        while let Some(result) = workers.join_next().await {
            if let Err(e) = result {
                error!(error = %e, "Worker task ended abnormally");
            }
        }
        info!("Worker pool shutdown complete");
    }

    /// Spawns the workers onto the runtime.
    pub fn spawn(self, shutdown: CancellationToken) -> JoinSet<()> {
        let prefix = &self.config.id_prefix;
        let pid = std::process::id();
        let mut set = JoinSet::new();

        for n in 0..self.size {
            let worker = Worker::new(
                format!("{prefix}-{pid}-{n}"),
                self.jobs.clone(),
                self.registry.clone(),
                self.config.clone(),
            );
            set.spawn(worker.run(shutdown.clone()));
        }

        info!(size = self.size, "Worker pool started");
        set
    }
}

//! Typed job enqueueing for request paths and the scheduler.

use serde_json::json;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::domain::entities::{JobArgs, JobId, NewJob};
use crate::domain::repositories::JobRepository;
use crate::error::AppError;

/// Enqueues jobs into the durable store.
///
/// Request handlers use [`JobDispatcher::dispatch`], which never fails the
/// request: a lost geo or spam-scan trigger is not a correctness problem for
/// the redirect path. The scheduler uses [`JobDispatcher::enqueue_job`] and
/// retries on its own.
#[derive(Clone)]
pub struct JobDispatcher {
    jobs: Arc<dyn JobRepository>,
}

impl JobDispatcher {
    pub fn new(jobs: Arc<dyn JobRepository>) -> Self {
        Self { jobs }
    }

    /// Serializes `args` and enqueues a job of the matching kind.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] if serialization or the insert fails.
    pub async fn enqueue<T: JobArgs>(&self, args: &T) -> Result<JobId, AppError> {
        let job = NewJob::from_args(args).map_err(|e| {
            AppError::internal(
                "Failed to serialize job payload",
                json!({ "kind": T::KIND.as_str(), "reason": e.to_string() }),
            )
        })?;
        self.enqueue_job(job).await
    }

    /// Enqueues a prepared job envelope.
    pub async fn enqueue_job(&self, job: NewJob) -> Result<JobId, AppError> {
        let kind = job.kind;
        let id = self.jobs.enqueue(job).await?;

        metrics::counter!("jobs_enqueued_total", "kind" => kind.as_str()).increment(1);
        debug!(job_id = %id, kind = %kind, "Job enqueued");

        Ok(id)
    }

    /// Fire-and-forget enqueue: failures are logged and swallowed.
    pub async fn dispatch<T: JobArgs>(&self, args: &T) -> Option<JobId> {
        match self.enqueue(args).await {
            Ok(id) => Some(id),
            Err(e) => {
                warn!(kind = %T::KIND, error = %e, "Failed to enqueue job");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{JobKind, ParseGeoRequest};
    use crate::domain::repositories::MockJobRepository;

    #[tokio::test]
    async fn test_enqueue_serializes_payload() {
        let mut jobs = MockJobRepository::new();
        jobs.expect_enqueue()
            .withf(|job| {
                job.kind == JobKind::ParseGeo
                    && job.payload == json!({ "ip": "1.2.3.4", "slug": "abc123" })
            })
            .times(1)
            .returning(|_| Ok(JobId(7)));

        let dispatcher = JobDispatcher::new(Arc::new(jobs));
        let id = dispatcher
            .enqueue(&ParseGeoRequest {
                ip: "1.2.3.4".to_string(),
                slug: "abc123".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(id, JobId(7));
    }

    #[tokio::test]
    async fn test_dispatch_swallows_store_errors() {
        let mut jobs = MockJobRepository::new();
        jobs.expect_enqueue()
            .times(1)
            .returning(|_| Err(AppError::internal("Database error", json!({}))));

        let dispatcher = JobDispatcher::new(Arc::new(jobs));
        let id = dispatcher
            .dispatch(&ParseGeoRequest {
                ip: "1.2.3.4".to_string(),
                slug: "abc123".to_string(),
            })
            .await;

        assert_eq!(id, None);
    }
}

//! Error types for job processing.

use std::time::Duration;

use crate::domain::entities::JobKind;
use crate::error::AppError;
use crate::infrastructure::threat::ThreatError;

/// Why a single job attempt failed.
///
/// Every variant is retryable from the queue's point of view; the retry
/// policy alone decides between rescheduling and dead-lettering.
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("invalid {kind} payload: {source}")]
    InvalidPayload {
        kind: JobKind,
        #[source]
        source: serde_json::Error,
    },

    #[error("storage error: {0}")]
    Storage(#[from] AppError),

    #[error("collaborator error: {0}")]
    Collaborator(String),

    #[error("no handler registered for {0}")]
    Unhandled(JobKind),

    #[error("handler panicked: {0}")]
    Panicked(String),

    #[error("handler timed out after {0:?}")]
    TimedOut(Duration),

    #[error("abandoned after {0} deliveries without a result")]
    Abandoned(i32),
}

impl From<ThreatError> for JobError {
    fn from(e: ThreatError) -> Self {
        JobError::Collaborator(e.to_string())
    }
}

/// Startup-time wiring errors between job kinds and handlers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("handler for {0} registered twice")]
    DuplicateHandler(JobKind),

    #[error("no handler registered for {0}")]
    MissingHandler(JobKind),
}

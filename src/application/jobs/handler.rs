//! Job handler trait and the kind-to-handler registry.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

use super::error::{JobError, RegistryError};
use crate::domain::entities::{Job, JobArgs, JobKind};

/// Processes one kind of job.
///
/// Handlers must be idempotent: a job may be delivered again after a crash
/// between execution and retirement.
#[async_trait]
pub trait JobHandler: Send + Sync {
    fn kind(&self) -> JobKind;

    async fn handle(&self, job: &Job) -> Result<(), JobError>;
}

/// Decodes a job payload, reporting the kind on failure.
pub fn decode_args<T: JobArgs>(job: &Job) -> Result<T, JobError> {
    job.decode::<T>().map_err(|source| JobError::InvalidPayload {
        kind: job.kind,
        source,
    })
}

/// Explicit kind → handler table, built once at startup.
#[derive(Default, Clone)]
pub struct HandlerRegistry {
    handlers: HashMap<JobKind, Arc<dyn JobHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a handler for its kind.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateHandler`] if the kind already has one.
    pub fn register<H: JobHandler + 'static>(&mut self, handler: H) -> Result<(), RegistryError> {
        let kind = handler.kind();
        if self.handlers.contains_key(&kind) {
            return Err(RegistryError::DuplicateHandler(kind));
        }
        self.handlers.insert(kind, Arc::new(handler));
        Ok(())
    }

    /// Builder-style [`Self::register`].
    pub fn with<H: JobHandler + 'static>(mut self, handler: H) -> Result<Self, RegistryError> {
        self.register(handler)?;
        Ok(self)
    }

    pub fn get(&self, kind: JobKind) -> Option<Arc<dyn JobHandler>> {
        self.handlers.get(&kind).cloned()
    }

    /// Registered kinds in a stable order.
    pub fn kinds(&self) -> Vec<JobKind> {
        let mut kinds: Vec<JobKind> = self.handlers.keys().copied().collect();
        kinds.sort();
        kinds
    }

    /// Fails if any of `kinds` has no handler.
    pub fn require(&self, kinds: &[JobKind]) -> Result<(), RegistryError> {
        match kinds.iter().find(|k| !self.handlers.contains_key(k)) {
            Some(kind) => Err(RegistryError::MissingHandler(*kind)),
            None => Ok(()),
        }
    }
}

//! Cleanup of links that were never confirmed.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

use crate::application::jobs::error::JobError;
use crate::application::jobs::handler::JobHandler;
use crate::domain::entities::{Job, JobKind};
use crate::domain::repositories::LinkRepository;

/// Deletes every link still `pending`.
///
/// How long an unconfirmed link may live is decided by how often the
/// scheduler enqueues this job.
pub struct RemovePendingHandler<L: LinkRepository> {
    links: Arc<L>,
}

impl<L: LinkRepository> RemovePendingHandler<L> {
    pub fn new(links: Arc<L>) -> Self {
        Self { links }
    }
}

#[async_trait]
impl<L: LinkRepository + 'static> JobHandler for RemovePendingHandler<L> {
    fn kind(&self) -> JobKind {
        JobKind::RemovePending
    }

    async fn handle(&self, _job: &Job) -> Result<(), JobError> {
        let removed = self.links.delete_pending().await?;
        info!(removed, "Removed unconfirmed links");
        Ok(())
    }
}

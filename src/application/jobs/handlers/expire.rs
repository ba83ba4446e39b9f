//! Bulk expiry of links past their deadline.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

use crate::application::jobs::error::JobError;
use crate::application::jobs::handler::JobHandler;
use crate::domain::entities::{Job, JobKind};
use crate::domain::repositories::LinkRepository;

pub struct ExpireHandler<L: LinkRepository> {
    links: Arc<L>,
}

impl<L: LinkRepository> ExpireHandler<L> {
    pub fn new(links: Arc<L>) -> Self {
        Self { links }
    }
}

#[async_trait]
impl<L: LinkRepository + 'static> JobHandler for ExpireHandler<L> {
    fn kind(&self) -> JobKind {
        JobKind::Expire
    }

    async fn handle(&self, _job: &Job) -> Result<(), JobError> {
        let expired = self.links.expire_overdue().await?;
        info!(expired, "Expired overdue links");
        Ok(())
    }
}

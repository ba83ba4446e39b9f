//! Shared application state injected into every handler.

use sqlx::PgPool;
use std::sync::Arc;

use crate::application::jobs::JobDispatcher;
use crate::application::services::{AnalyticsService, LinkPolicy, LinkService};
use crate::domain::repositories::JobRepository;
use crate::infrastructure::persistence::{
    PgAnalyticsRepository, PgDomainRepository, PgJobRepository, PgLinkRepository,
};

pub type AppLinkService = LinkService<PgLinkRepository, PgDomainRepository>;
pub type AppAnalyticsService = AnalyticsService<PgAnalyticsRepository, PgLinkRepository>;

#[derive(Clone)]
pub struct AppState {
    pub pool: Arc<PgPool>,
    pub link_service: Arc<AppLinkService>,
    pub analytics_service: Arc<AppAnalyticsService>,
    pub jobs: Arc<dyn JobRepository>,
    /// Read the client IP from proxy headers instead of the peer address.
    pub behind_proxy: bool,
}

impl AppState {
    /// Wires the PostgreSQL repositories into the services.
    pub fn new(pool: Arc<PgPool>, policy: LinkPolicy, behind_proxy: bool) -> Self {
        let link_repository = Arc::new(PgLinkRepository::new(pool.clone()));
        let domain_repository = Arc::new(PgDomainRepository::new(pool.clone()));
        let analytics_repository = Arc::new(PgAnalyticsRepository::new(pool.clone()));
        let jobs: Arc<dyn JobRepository> = Arc::new(PgJobRepository::new(pool.clone()));

        let link_service = Arc::new(LinkService::new(
            link_repository.clone(),
            domain_repository,
            JobDispatcher::new(jobs.clone()),
            policy,
        ));
        let analytics_service = Arc::new(AnalyticsService::new(
            analytics_repository,
            link_repository,
        ));

        Self {
            pool,
            link_service,
            analytics_service,
            jobs,
            behind_proxy,
        }
    }
}

//! Geo enrichment of a single click.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::application::jobs::error::JobError;
use crate::application::jobs::handler::{JobHandler, decode_args};
use crate::domain::entities::{GeoHit, Job, JobKind, ParseGeoRequest};
use crate::domain::repositories::AnalyticsRepository;
use crate::infrastructure::geo::GeoResolver;
use crate::utils::client_ip::split_chain;

/// Resolves every address of a click and bumps the per-location counter.
///
/// Unresolvable addresses are skipped; only a storage failure fails the job.
/// The link row itself is never touched.
pub struct ParseGeoHandler<A: AnalyticsRepository> {
    analytics: Arc<A>,
    geo: Arc<dyn GeoResolver>,
}

impl<A: AnalyticsRepository> ParseGeoHandler<A> {
    pub fn new(analytics: Arc<A>, geo: Arc<dyn GeoResolver>) -> Self {
        Self { analytics, geo }
    }
}

#[async_trait]
impl<A: AnalyticsRepository + 'static> JobHandler for ParseGeoHandler<A> {
    fn kind(&self) -> JobKind {
        JobKind::ParseGeo
    }

    async fn handle(&self, job: &Job) -> Result<(), JobError> {
        let request: ParseGeoRequest = decode_args(job)?;

        let mut resolved = 0usize;
        for ip in split_chain(&request.ip) {
            let location = match self.geo.resolve(ip).await {
                Ok(Some(location)) => location,
                Ok(None) => {
                    debug!(slug = %request.slug, ip, "Address not found in geo database");
                    continue;
                }
                Err(e) => {
                    warn!(slug = %request.slug, ip, error = %e, "Geo lookup failed");
                    continue;
                }
            };

            self.analytics
                .upsert_hit(GeoHit::new(
                    request.slug.as_str(),
                    location.country,
                    location.region,
                    location.city,
                ))
                .await?;
            resolved += 1;
        }

        debug!(slug = %request.slug, resolved, "Geo enrichment finished");
        Ok(())
    }
}

//! Geo analytics read side.

use std::sync::Arc;

use serde::Serialize;
use serde_json::json;

use crate::domain::entities::AnalyticsRecord;
use crate::domain::repositories::{AnalyticsRepository, LinkRepository};
use crate::error::AppError;

/// Click summary for one short link.
#[derive(Debug, Clone, Serialize)]
pub struct SlugAnalytics {
    pub slug: String,
    /// Raw click counter on the link, including clicks whose location could
    /// not be resolved.
    pub click_counter: i64,
    /// Sum of all geo-attributed clicks.
    pub located_clicks: i64,
    pub records: Vec<AnalyticsRecord>,
}

/// Service for reading the per-slug geo aggregate.
///
/// The aggregate itself is written by the geo enrichment job; this service
/// only joins it with the link's own counter.
pub struct AnalyticsService<A: AnalyticsRepository, L: LinkRepository> {
    analytics_repository: Arc<A>,
    link_repository: Arc<L>,
}

impl<A: AnalyticsRepository, L: LinkRepository> AnalyticsService<A, L> {
    /// Creates a new analytics service.
    pub fn new(analytics_repository: Arc<A>, link_repository: Arc<L>) -> Self {
        Self {
            analytics_repository,
            link_repository,
        }
    }

    /// Returns the geo breakdown for `slug`, highest counter first.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if no link matches the slug.
    /// Returns [`AppError::Internal`] on database errors.
    pub async fn for_slug(&self, slug: &str) -> Result<SlugAnalytics, AppError> {
        let link = self
            .link_repository
            .find_by_slug(slug)
            .await?
            .ok_or_else(|| AppError::not_found("Short link not found", json!({ "slug": slug })))?;

        let records = self.analytics_repository.list_for_slug(slug).await?;
        let located_clicks = records.iter().map(|r| r.click_counter).sum();

        Ok(SlugAnalytics {
            slug: link.slug,
            click_counter: link.click_counter,
            located_clicks,
            records,
        })
    }
}

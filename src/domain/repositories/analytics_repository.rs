//! Repository trait for the per-slug geo click aggregate.

use crate::domain::entities::{AnalyticsRecord, GeoHit};
use crate::error::AppError;
use async_trait::async_trait;

/// Repository interface for click analytics.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgAnalyticsRepository`] - PostgreSQL implementation
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AnalyticsRepository: Send + Sync {
    /// Inserts a row for `(slug, country, region)` with counter 1, or
    /// increments the existing row by 1.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn upsert_hit(&self, hit: GeoHit) -> Result<(), AppError>;

    /// Returns every record for a slug, highest counter first.
    async fn list_for_slug(&self, slug: &str) -> Result<Vec<AnalyticsRecord>, AppError>;
}

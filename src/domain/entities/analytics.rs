//! Geo analytics aggregate for short links.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Per-slug click counter for one `(country, region)` pair.
///
/// Rows are upserted by the geo enrichment job: a resolved click either
/// inserts a row with counter 1 or increments the existing row.
#[derive(Debug, Clone, Serialize)]
pub struct AnalyticsRecord {
    pub slug: String,
    pub country: String,
    pub region: String,
    pub city: String,
    pub click_counter: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A single resolved click to fold into the aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeoHit {
    pub slug: String,
    pub country: String,
    pub region: String,
    pub city: String,
}

impl GeoHit {
    pub fn new(
        slug: impl Into<String>,
        country: impl Into<String>,
        region: impl Into<String>,
        city: impl Into<String>,
    ) -> Self {
        Self {
            slug: slug.into(),
            country: country.into(),
            region: region.into(),
            city: city.into(),
        }
    }
}

//! DTOs for geo analytics.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Geo breakdown for one short link.
#[derive(Debug, Serialize)]
pub struct AnalyticsResponse {
    pub slug: String,
    pub click_counter: i64,
    pub located_clicks: i64,
    pub items: Vec<AnalyticsItem>,
}

/// Click count for one `(country, region)` pair.
#[derive(Debug, Serialize)]
pub struct AnalyticsItem {
    pub country: String,
    pub region: String,
    pub city: String,
    pub click_counter: i64,
    pub updated_at: DateTime<Utc>,
}

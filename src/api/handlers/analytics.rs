//! Handler for per-slug geo analytics.

use axum::{
    Json,
    extract::{Path, State},
};

use crate::api::dto::analytics::{AnalyticsItem, AnalyticsResponse};
use crate::error::AppError;
use crate::state::AppState;

/// Returns the geo breakdown of a link's clicks.
///
/// # Endpoint
///
/// `GET /api/analytics/{slug}`
///
/// Items are ordered by click count, highest first. Clicks whose address
/// could not be located count towards `click_counter` only.
///
/// # Errors
///
/// Returns 404 Not Found if the slug does not exist.
pub async fn analytics_handler(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<AnalyticsResponse>, AppError> {
    let summary = state.analytics_service.for_slug(&slug).await?;

    Ok(Json(AnalyticsResponse {
        slug: summary.slug,
        click_counter: summary.click_counter,
        located_clicks: summary.located_clicks,
        items: summary
            .records
            .into_iter()
            .map(|r| AnalyticsItem {
                country: r.country,
                region: r.region,
                city: r.city,
                click_counter: r.click_counter,
                updated_at: r.updated_at,
            })
            .collect(),
    }))
}

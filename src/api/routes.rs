//! API route configuration.

use crate::api::handlers::{
    analytics_handler, confirm_link_handler, link_list_handler, link_lookup_handler,
    shorten_handler,
};
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};

/// All JSON API routes, nested under `/api`.
///
/// # Endpoints
///
/// - `POST /shorten`              - Create or reuse a short link
/// - `GET  /links`                - List links (paginated, optional owner filter)
/// - `GET  /links/{slug}`         - Redirect state of one link, no click counted
/// - `POST /links/{slug}/confirm` - Promote a pending link to active
/// - `GET  /analytics/{slug}`     - Geo click breakdown for a link
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/shorten", post(shorten_handler))
        .route("/links", get(link_list_handler))
        .route("/links/{slug}", get(link_lookup_handler))
        .route("/links/{slug}/confirm", post(confirm_link_handler))
        .route("/analytics/{slug}", get(analytics_handler))
}

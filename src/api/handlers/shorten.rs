//! Handler for link shortening endpoint.

use axum::{
    Json,
    extract::{ConnectInfo, State},
    http::HeaderMap,
};
use std::net::SocketAddr;
use validator::Validate;

use crate::api::dto::shorten::{ShortenRequest, ShortenResponse};
use crate::application::services::CreateLink;
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::client_ip::client_ip;

/// Creates a short link, or returns the existing one for the same URL.
///
/// # Endpoint
///
/// `POST /api/shorten`
///
/// # Request Body
///
/// ```json
/// {
///   "url": "example.com/page",
///   "alias": "promo",        // optional
///   "password": "secret",    // optional
///   "expiration": 1900000000, // optional, unix seconds
///   "mindful": false         // optional
/// }
/// ```
///
/// # Response
///
/// ```json
/// {
///   "success": true,
///   "slug": "promo",
///   "short": "https://s.example.com/promo",
///   "original": "https://example.com/page",
///   "status": "pending",
///   "expiration": 1900000000
/// }
/// ```
///
/// # Errors
///
/// Returns 400 Bad Request for invalid URLs, aliases or expirations.
/// Returns 403 Forbidden if the target host is blacklisted.
pub async fn shorten_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(payload): Json<ShortenRequest>,
) -> Result<Json<ShortenResponse>, AppError> {
    payload.validate()?;
    let expires_at = payload.expires_at()?;

    let link = state
        .link_service
        .create_or_get(CreateLink {
            url: payload.url,
            slug_hint: payload.alias.filter(|a| !a.is_empty()),
            password: payload.password,
            expires_at,
            mindful: payload.mindful,
            owner_ip: Some(client_ip(&headers, addr, state.behind_proxy)),
            owner_username: None,
        })
        .await?;

    Ok(Json(ShortenResponse {
        success: true,
        short: state.link_service.get_short_url(&link.slug),
        slug: link.slug,
        original: link.url,
        status: link.status.to_string(),
        expiration: link.expires_at.map(|at| at.timestamp()),
    }))
}

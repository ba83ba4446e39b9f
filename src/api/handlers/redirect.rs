//! Handler for short URL redirect.

use axum::{
    Json,
    extract::{ConnectInfo, Path, Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use std::net::SocketAddr;

use crate::api::dto::redirect::{Interstitial, PasswordChallenge, RedirectQuery};
use crate::application::services::RedirectDecision;
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::client_ip::client_ip;

/// Resolves a slug and redirects to its target.
///
/// # Endpoint
///
/// `GET /{slug}[?password=...]`
///
/// # Outcomes
///
/// - **Redirect**: `302 Found` to the original URL
/// - **Unknown slug**: `302` to `{BASE_URL}/?not-found={slug}`
/// - **Expired**: `302` to `{BASE_URL}/?expired={slug}`
/// - **Flagged**: `302` to `{BASE_URL}/?threat={type}&slug={slug}`
/// - **Password protected**: `401` with a JSON challenge
/// - **Mindful link**: `200` with the target in a JSON body
///
/// Every lookup of an existing slug counts as a click and enqueues a geo
/// enrichment job for the client address.
///
/// # Errors
///
/// Returns 500 Internal Server Error on storage errors.
pub async fn redirect_handler(
    Path(slug): Path<String>,
    Query(query): Query<RedirectQuery>,
    State(state): State<AppState>,
    headers: HeaderMap,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
) -> Result<Response, AppError> {
    let ip = client_ip(&headers, addr, state.behind_proxy);

    let decision = state
        .link_service
        .resolve(&slug, query.password.as_deref(), &ip)
        .await?;

    let base = state.link_service.base_url();

    let response = match decision {
        RedirectDecision::Redirect(url) => found(&url),
        RedirectDecision::NotFound => found(&home_with(base, &[("not-found", slug.as_str())])),
        RedirectDecision::Expired => found(&home_with(base, &[("expired", slug.as_str())])),
        RedirectDecision::Flagged(threat) => found(&home_with(
            base,
            &[("threat", threat.as_str()), ("slug", slug.as_str())],
        )),
        RedirectDecision::PasswordRequired => password_challenge(slug, "Password required"),
        RedirectDecision::PasswordIncorrect => password_challenge(slug, "Incorrect password"),
        RedirectDecision::ShowInterstitial(url) => Json(Interstitial {
            slug,
            url,
            mindful: true,
        })
        .into_response(),
    };

    Ok(response)
}

fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

pub(crate) fn password_challenge(slug: String, message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(PasswordChallenge {
            slug,
            password_required: true,
            message: message.to_string(),
        }),
    )
        .into_response()
}

/// Builds `{base}/?k=v&...` with form-encoded values.
fn home_with(base: &str, pairs: &[(&str, &str)]) -> String {
    let query = url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish();
    format!("{}/?{}", base.trim_end_matches('/'), query)
}

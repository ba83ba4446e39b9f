//! Handlers for link listing, lookup and confirmation.

use axum::{
    Json,
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::api::dto::links::{
    LinkItem, LinkListResponse, LinkLookupQuery, LinkLookupResponse, LinkOutcome,
    LinksQueryParams,
};
use crate::api::dto::pagination::PaginationMeta;
use crate::api::handlers::redirect::password_challenge;
use crate::application::services::RedirectDecision;
use crate::domain::entities::ShortLink;
use crate::error::AppError;
use crate::state::AppState;

fn to_item(state: &AppState, link: ShortLink) -> LinkItem {
    LinkItem {
        short_url: state.link_service.get_short_url(&link.slug),
        status: link.status.to_string(),
        protected: link.requires_password(),
        slug: link.slug,
        url: link.url,
        click_counter: link.click_counter,
        mindful: link.mindful,
        expires_at: link.expires_at,
        owner_username: link.owner_username,
        created_at: link.created_at,
    }
}

/// Lists links, newest first.
///
/// # Endpoint
///
/// `GET /api/links`
///
/// # Query Parameters
///
/// - `page` (optional): Page number (default: 1)
/// - `page_size` (optional): Items per page (default: 25, max: 100)
/// - `owner` (optional): Only links created by this user
///
/// # Errors
///
/// Returns 400 Bad Request if pagination parameters are invalid.
pub async fn link_list_handler(
    State(state): State<AppState>,
    Query(params): Query<LinksQueryParams>,
) -> Result<Json<LinkListResponse>, AppError> {
    let (page, page_size) = params
        .pagination
        .validate()
        .map_err(|e| AppError::bad_request(e, json!({})))?;

    let (links, total) = state
        .link_service
        .list_links(page as i64, page_size as i64, params.owner)
        .await?;

    let items = links.into_iter().map(|link| to_item(&state, link)).collect();

    Ok(Json(LinkListResponse {
        pagination: PaginationMeta::new(page, page_size, total),
        items,
    }))
}

/// Reports what following a link would do, without following it.
///
/// # Endpoint
///
/// `GET /api/links/{slug}[?password=...]`
///
/// Unlike the public redirect this counts no click and enqueues nothing.
/// Password protection applies the same way: without the right password the
/// response is the `401` challenge and the target stays hidden.
///
/// # Errors
///
/// Returns 404 Not Found if the slug does not exist.
pub async fn link_lookup_handler(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(query): Query<LinkLookupQuery>,
) -> Result<Response, AppError> {
    let (link, decision) = state
        .link_service
        .inspect(&slug, query.password.as_deref())
        .await?;

    let (outcome, url, threat) = match decision {
        RedirectDecision::Redirect(url) => (LinkOutcome::Redirect, Some(url), None),
        RedirectDecision::ShowInterstitial(url) => (LinkOutcome::Interstitial, Some(url), None),
        RedirectDecision::Expired => (LinkOutcome::Expired, None, None),
        RedirectDecision::Flagged(threat) => {
            (LinkOutcome::Flagged, None, Some(threat.to_string()))
        }
        RedirectDecision::PasswordRequired => {
            return Ok(password_challenge(link.slug, "Password required"));
        }
        RedirectDecision::PasswordIncorrect => {
            return Ok(password_challenge(link.slug, "Incorrect password"));
        }
        RedirectDecision::NotFound => {
            return Err(AppError::not_found(
                "Short link not found",
                json!({ "slug": slug }),
            ));
        }
    };

    let protected = link.requires_password();
    Ok(Json(LinkLookupResponse {
        short_url: state.link_service.get_short_url(&link.slug),
        slug: link.slug,
        outcome,
        url,
        threat,
        protected,
        click_counter: link.click_counter,
        expires_at: link.expires_at,
    })
    .into_response())
}

/// Confirms a pending link so it survives the pending cleanup.
///
/// # Endpoint
///
/// `POST /api/links/{slug}/confirm`
///
/// Confirming an active, expired or flagged link is a no-op that returns
/// the link unchanged.
///
/// # Errors
///
/// Returns 404 Not Found if the slug does not exist.
pub async fn confirm_link_handler(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<LinkItem>, AppError> {
    let link = state.link_service.confirm(&slug).await?;
    Ok(Json(to_item(&state, link)))
}

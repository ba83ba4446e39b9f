//! DTOs for link listing, lookup and confirmation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::pagination::{PaginationMeta, PaginationParams};

/// Query parameters for `GET /api/links`.
#[derive(Debug, Deserialize)]
pub struct LinksQueryParams {
    #[serde(flatten)]
    pub pagination: PaginationParams,

    pub owner: Option<String>,
}

/// Paginated list of links.
#[derive(Debug, Serialize)]
pub struct LinkListResponse {
    pub pagination: PaginationMeta,
    pub items: Vec<LinkItem>,
}

/// Public view of a short link.
#[derive(Debug, Serialize)]
pub struct LinkItem {
    pub slug: String,
    pub url: String,
    pub short_url: String,
    pub status: String,
    pub click_counter: i64,
    pub protected: bool,
    pub mindful: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_username: Option<String>,

    pub created_at: DateTime<Utc>,
}

/// Query parameters for `GET /api/links/{slug}`.
#[derive(Debug, Default, Deserialize)]
pub struct LinkLookupQuery {
    pub password: Option<String>,
}

/// What following a short link would do right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkOutcome {
    Redirect,
    Interstitial,
    Expired,
    Flagged,
}

/// Read-only view of a link's redirect state.
///
/// `url` is only present when the link would lead somewhere, and `threat`
/// only when it is flagged.
#[derive(Debug, Serialize)]
pub struct LinkLookupResponse {
    pub slug: String,
    pub short_url: String,
    pub outcome: LinkOutcome,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub threat: Option<String>,

    pub protected: bool,
    pub click_counter: i64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

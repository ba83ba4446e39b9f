//! DTOs for the redirect endpoint's non-redirect outcomes.

use serde::{Deserialize, Serialize};

/// Query string accepted by `GET /{slug}`.
#[derive(Debug, Default, Deserialize)]
pub struct RedirectQuery {
    pub password: Option<String>,
}

/// Body returned when the link is password protected.
#[derive(Debug, Serialize)]
pub struct PasswordChallenge {
    pub slug: String,
    pub password_required: bool,
    pub message: String,
}

/// Body returned for links that ask for confirmation before leaving.
#[derive(Debug, Serialize)]
pub struct Interstitial {
    pub slug: String,
    pub url: String,
    pub mindful: bool,
}

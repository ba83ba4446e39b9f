//! DTOs for link shortening endpoint.

use chrono::{DateTime, TimeZone, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use validator::Validate;

use crate::error::AppError;

static ALIAS_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("alias pattern compiles"));

/// Request to shorten a URL.
///
/// The URL may omit its scheme; `https://` is assumed. Slug rules for
/// `alias` are enforced by the link service.
#[derive(Debug, Deserialize, Validate)]
pub struct ShortenRequest {
    #[validate(length(min = 1, max = 2048, message = "URL must be 1-2048 characters"))]
    pub url: String,

    /// Preferred slug. Taken by another URL means `alias-XX` is issued instead.
    #[validate(length(min = 3, max = 50))]
    #[validate(regex(path = "*ALIAS_REGEX", message = "Alias may only contain letters, digits, '-' and '_'"))]
    pub alias: Option<String>,

    #[validate(length(max = 128))]
    pub password: Option<String>,

    /// Expiry as unix seconds.
    pub expiration: Option<i64>,

    /// Show an interstitial before redirecting.
    #[serde(default)]
    pub mindful: bool,
}

impl ShortenRequest {
    /// Converts `expiration` into a timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if the value is out of range.
    pub fn expires_at(&self) -> Result<Option<DateTime<Utc>>, AppError> {
        self.expiration
            .map(|secs| {
                Utc.timestamp_opt(secs, 0).single().ok_or_else(|| {
                    AppError::bad_request(
                        "Invalid expiration timestamp",
                        serde_json::json!({ "expiration": secs }),
                    )
                })
            })
            .transpose()
    }
}

/// Successful shortening result.
#[derive(Debug, Serialize)]
pub struct ShortenResponse {
    pub success: bool,
    pub slug: String,
    pub short: String,
    pub original: String,
    pub status: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_request() {
        let req: ShortenRequest = serde_json::from_str(r#"{"url": "example.com"}"#).unwrap();
        assert!(req.validate().is_ok());
        assert!(!req.mindful);
        assert!(req.expires_at().unwrap().is_none());
    }

    #[test]
    fn test_expiration_is_unix_seconds() {
        let req: ShortenRequest =
            serde_json::from_str(r#"{"url": "example.com", "expiration": 1900000000}"#).unwrap();
        assert_eq!(req.expires_at().unwrap().unwrap().timestamp(), 1_900_000_000);
    }

    #[test]
    fn test_out_of_range_expiration() {
        let req: ShortenRequest =
            serde_json::from_str(r#"{"url": "example.com", "expiration": 9223372036854775807}"#)
                .unwrap();
        assert!(req.expires_at().is_err());
    }

    #[test]
    fn test_empty_url_fails_validation() {
        let req: ShortenRequest = serde_json::from_str(r#"{"url": ""}"#).unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_short_alias_fails_validation() {
        let req: ShortenRequest =
            serde_json::from_str(r#"{"url": "example.com", "alias": "ab"}"#).unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_alias_charset() {
        let ok: ShortenRequest =
            serde_json::from_str(r#"{"url": "example.com", "alias": "Spring_sale-24"}"#).unwrap();
        assert!(ok.validate().is_ok());

        let bad: ShortenRequest =
            serde_json::from_str(r#"{"url": "example.com", "alias": "spring sale"}"#).unwrap();
        assert!(bad.validate().is_err());
    }
}

//! Short link entity and its lifecycle status.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Threat classification reported by the reputation service.
///
/// Stored verbatim in the `status` column (e.g. `MALWARE`, `SOCIAL_ENGINEERING`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ThreatType(String);

impl ThreatType {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ThreatType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle state of a short link.
///
/// `Pending`, `Active` and `Expired` describe the lifecycle; `Flagged` is the
/// terminal state set by spam detection and blocks redirection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkStatus {
    Pending,
    Active,
    Expired,
    Flagged(ThreatType),
}

impl LinkStatus {
    pub const PENDING: &'static str = "pending";
    pub const ACTIVE: &'static str = "active";
    pub const EXPIRED: &'static str = "expired";

    /// Decodes the persisted `status` column.
    ///
    /// Anything that is not a lifecycle keyword is a threat type.
    pub fn from_db(value: &str) -> Self {
        match value {
            Self::PENDING => Self::Pending,
            Self::ACTIVE => Self::Active,
            Self::EXPIRED => Self::Expired,
            other => Self::Flagged(ThreatType::new(other)),
        }
    }

    /// Encodes the status for the `status` column.
    pub fn as_db_str(&self) -> &str {
        match self {
            Self::Pending => Self::PENDING,
            Self::Active => Self::ACTIVE,
            Self::Expired => Self::EXPIRED,
            Self::Flagged(threat) => threat.as_str(),
        }
    }

    pub fn is_flagged(&self) -> bool {
        matches!(self, Self::Flagged(_))
    }
}

impl fmt::Display for LinkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_db_str())
    }
}

impl Serialize for LinkStatus {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_db_str())
    }
}

/// A shortened URL and its metadata.
#[derive(Debug, Clone, Serialize)]
pub struct ShortLink {
    pub id: i64,
    pub url: String,
    pub slug: String,
    pub owner_ip: Option<String>,
    pub status: LinkStatus,
    pub click_counter: i64,
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub mindful: bool,
    pub owner_username: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ShortLink {
    /// Returns true once `expires_at` has passed.
    pub fn is_past_expiry(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }

    /// Returns true if the link is expired either by status or by timestamp.
    ///
    /// The periodic expire job may not have run yet, so the timestamp is
    /// checked on every read.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.status == LinkStatus::Expired || self.is_past_expiry(now)
    }

    pub fn requires_password(&self) -> bool {
        self.password_hash.is_some()
    }

    /// Returns true if `slug` is `hint` followed by `-` and a 2-character suffix.
    pub fn is_disambiguated_from(&self, hint: &str) -> bool {
        self.slug
            .strip_prefix(hint)
            .and_then(|rest| rest.strip_prefix('-'))
            .is_some_and(|suffix| suffix.chars().count() == 2)
    }
}

/// Input data for persisting a new short link.
#[derive(Debug, Clone)]
pub struct NewShortLink {
    pub url: String,
    pub slug: String,
    pub owner_ip: Option<String>,
    pub status: LinkStatus,
    pub password_hash: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub mindful: bool,
    pub owner_username: Option<String>,
}

#[cfg(test)]
pub(crate) fn sample_link(id: i64, slug: &str, url: &str) -> ShortLink {
    let now = Utc::now();
    ShortLink {
        id,
        url: url.to_string(),
        slug: slug.to_string(),
        owner_ip: None,
        status: LinkStatus::Active,
        click_counter: 0,
        password_hash: None,
        expires_at: None,
        mindful: false,
        owner_username: None,
        created_at: now,
        updated_at: now,
    }
}

//! Threat lookup trait and error types.

use crate::domain::entities::ThreatType;
use async_trait::async_trait;

/// Errors from the reputation service. Any of them fails the whole scan page.
#[derive(Debug, thiserror::Error)]
pub enum ThreatError {
    #[error("Threat lookup request failed: {0}")]
    Request(String),
    #[error("Threat lookup returned an unreadable response: {0}")]
    Decode(String),
}

/// A single reputation hit for a URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreatMatch {
    pub threat_type: ThreatType,
    pub platform_type: String,
}

impl ThreatMatch {
    pub fn new(threat_type: impl Into<String>) -> Self {
        Self {
            threat_type: ThreatType::new(threat_type),
            platform_type: "ANY_PLATFORM".to_string(),
        }
    }
}

/// Bulk URL reputation lookup.
///
/// The result holds one list per input URL, aligned by index. An empty list
/// means the URL is clean.
///
/// # Implementations
///
/// - [`crate::infrastructure::threat::SafeBrowsingClient`] - Google Safe Browsing
/// - [`crate::infrastructure::threat::NullThreatLookup`] - Everything is clean
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ThreatLookup: Send + Sync {
    async fn lookup_bulk(&self, urls: &[String]) -> Result<Vec<Vec<ThreatMatch>>, ThreatError>;
}

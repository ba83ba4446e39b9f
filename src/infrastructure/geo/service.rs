//! Geo resolver trait and error types.

use async_trait::async_trait;

/// Errors that can occur while resolving an address.
#[derive(Debug, thiserror::Error)]
pub enum GeoError {
    #[error("Invalid IP address: {0}")]
    InvalidAddress(String),
    #[error("Geo lookup request failed: {0}")]
    Request(String),
    #[error("Geo lookup returned an unreadable response: {0}")]
    Decode(String),
}

/// Location of a resolved address. Missing parts are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeoLocation {
    pub country: String,
    pub region: String,
    pub city: String,
}

/// Resolves an IP address to a location.
///
/// `Ok(None)` means the address is valid but unknown to the database
/// (private ranges, reserved blocks). Callers treat both `None` and errors as
/// a skipped address.
///
/// # Implementations
///
/// - [`crate::infrastructure::geo::HttpGeoResolver`] - HTTP JSON lookup
/// - [`crate::infrastructure::geo::NullGeoResolver`] - Always `Ok(None)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GeoResolver: Send + Sync {
    async fn resolve(&self, ip: &str) -> Result<Option<GeoLocation>, GeoError>;
}

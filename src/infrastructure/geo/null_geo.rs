//! No-op geo resolver for deployments without a lookup service.

use super::service::{GeoError, GeoLocation, GeoResolver};
use async_trait::async_trait;
use tracing::debug;

/// A resolver that knows no addresses.
///
/// Clicks are still counted on the link; only the per-country aggregate stays
/// empty.
pub struct NullGeoResolver;

impl NullGeoResolver {
    pub fn new() -> Self {
        debug!("Using NullGeoResolver (geo enrichment disabled)");
        Self
    }
}

impl Default for NullGeoResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GeoResolver for NullGeoResolver {
    async fn resolve(&self, _ip: &str) -> Result<Option<GeoLocation>, GeoError> {
        Ok(None)
    }
}

//! Geo-IP resolution used by click enrichment.
//!
//! Provides a [`GeoResolver`] trait with two implementations:
//! - [`HttpGeoResolver`] - JSON lookup service reached over HTTP
//! - [`NullGeoResolver`] - Resolves nothing, used when no endpoint is configured

mod http_geo;
mod null_geo;
mod service;

pub use http_geo::HttpGeoResolver;
pub use null_geo::NullGeoResolver;
pub use service::{GeoError, GeoLocation, GeoResolver};

#[cfg(test)]
pub use service::MockGeoResolver;

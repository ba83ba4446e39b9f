//! URL reputation lookups used by spam detection.
//!
//! Provides a [`ThreatLookup`] trait with two implementations:
//! - [`SafeBrowsingClient`] - Google Safe Browsing v4 `threatMatches:find`
//! - [`NullThreatLookup`] - Reports no threats, used when no API key is configured

mod null_threat;
mod safe_browsing;
mod service;

pub use null_threat::NullThreatLookup;
pub use safe_browsing::SafeBrowsingClient;
pub use service::{ThreatError, ThreatLookup, ThreatMatch};

#[cfg(test)]
pub use service::MockThreatLookup;

//! Core domain entities representing the business data model.
//!
//! Entities are plain data structures; business rules live in
//! [`crate::application`].
//!
//! # Entity Types
//!
//! - [`ShortLink`] - A shortened URL mapping and its lifecycle [`LinkStatus`]
//! - [`AnalyticsRecord`] - Per-slug geo click counters
//! - [`Domain`] - Host-level policy (blacklist)
//! - [`Job`] - A queued unit of background work
//!
//! # Design Pattern
//!
//! Entities follow the "New Type" pattern with separate structs for creation:
//! `NewShortLink`, `NewJob`, and `GeoHit` for analytics upserts.

pub mod analytics;
pub mod domain;
pub mod job;
pub mod link;

pub use analytics::{AnalyticsRecord, GeoHit};
pub use domain::Domain;
pub use job::{
    DeadJob, DetectSpamRequest, ExpireLinks, FailureDisposition, Job, JobArgs, JobFailure, JobId,
    JobKind, NewJob, ParseGeoRequest, QueueStats, RemovePendingLinks, UnknownJobKind,
};
pub use link::{LinkStatus, NewShortLink, ShortLink, ThreatType};

#[cfg(test)]
pub(crate) use link::sample_link;

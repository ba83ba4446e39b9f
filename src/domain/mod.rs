//! Domain layer containing business entities and repository contracts.
//!
//! # Architecture
//!
//! - [`entities`] - Links, analytics records, hosts and jobs
//! - [`repositories`] - Data access trait definitions
//!
//! # Design Principles
//!
//! - Domain layer has no dependencies on infrastructure or presentation layers
//! - Repository traits define contracts implemented by infrastructure layer
//! - Business logic lives in [`crate::application`]
//!
//! # Link Lifecycle
//!
//! ```text
//! Pending --click/confirm--> Active --expires_at passed--> Expired
//!    |                          |
//!    +----- threat match -------+--> Flagged(threat)
//! ```
//!
//! Pending links that are never clicked or confirmed are removed by the
//! pending cleanup job.

pub mod entities;
pub mod repositories;

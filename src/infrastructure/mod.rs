//! Infrastructure layer for external integrations.
//!
//! This layer implements interfaces defined by the domain layer, providing
//! concrete implementations for data persistence and the two network
//! collaborators used by background jobs.
//!
//! # Modules
//!
//! - [`geo`] - Geo-IP resolution (HTTP and no-op implementations)
//! - [`persistence`] - PostgreSQL repository implementations
//! - [`threat`] - URL reputation lookups (Safe Browsing and no-op implementations)

pub mod geo;
pub mod persistence;
pub mod threat;

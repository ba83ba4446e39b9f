//! Repository trait definitions for the domain layer.
//!
//! These traits abstract data access following the Repository pattern and are
//! implemented in `crate::infrastructure::persistence`.
//!
//! # Available Repositories
//!
//! - [`LinkRepository`] - Short link storage, click counting and bulk status updates
//! - [`AnalyticsRepository`] - Geo click aggregate upserts and reads
//! - [`DomainRepository`] - Host blacklist lookups
//! - [`JobRepository`] - The durable job queue
//!
//! # Testing
//!
//! Mock implementations are generated via `mockall` for unit tests. See
//! `tests/repository_*.rs` for PostgreSQL-backed suites and `tests/common`
//! for the in-memory implementations used by the end-to-end tests.

pub mod analytics_repository;
pub mod domain_repository;
pub mod job_repository;
pub mod link_repository;

pub use analytics_repository::AnalyticsRepository;
pub use domain_repository::DomainRepository;
pub use job_repository::JobRepository;
pub use link_repository::{LinkRepository, LinkScan};

#[cfg(test)]
pub use analytics_repository::MockAnalyticsRepository;
#[cfg(test)]
pub use domain_repository::MockDomainRepository;
#[cfg(test)]
pub use job_repository::MockJobRepository;
#[cfg(test)]
pub use link_repository::MockLinkRepository;

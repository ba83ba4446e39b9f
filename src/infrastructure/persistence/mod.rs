//! PostgreSQL repository implementations.
//!
//! Concrete implementations of domain repository traits using SQLx runtime
//! queries mapped through `FromRow` row structs.
//!
//! # Repositories
//!
//! - [`PgLinkRepository`] - Short link storage, click counting, housekeeping
//! - [`PgAnalyticsRepository`] - Geo click aggregate upserts
//! - [`PgDomainRepository`] - Host blacklist
//! - [`PgJobRepository`] - Durable job queue (`FOR UPDATE SKIP LOCKED`)

pub mod pg_analytics_repository;
pub mod pg_domain_repository;
pub mod pg_job_repository;
pub mod pg_link_repository;

pub use pg_analytics_repository::PgAnalyticsRepository;
pub use pg_domain_repository::PgDomainRepository;
pub use pg_job_repository::PgJobRepository;
pub use pg_link_repository::PgLinkRepository;

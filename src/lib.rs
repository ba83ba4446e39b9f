//! # tinylinks
//!
//! A URL shortener built with Axum and PostgreSQL, with a durable job queue
//! in the same database for the work that does not belong on the request
//! path.
//!
//! ## Architecture
//!
//! This crate follows Clean Architecture principles with clear layer separation:
//!
//! - **Domain Layer** ([`domain`]) - Core business entities and repository traits
//! - **Application Layer** ([`application`]) - Link services and the job subsystem
//! - **Infrastructure Layer** ([`infrastructure`]) - Database and external collaborators
//! - **API Layer** ([`api`]) - REST API handlers, DTOs, and middleware
//!
//! ## Features
//!
//! - Slug allocation with idempotent reuse and `hint-XX` disambiguation
//! - Pending / active / expired / flagged link lifecycle
//! - Geo click analytics, enriched asynchronously
//! - URL reputation checks on creation and as a periodic sweep
//! - At-least-once job delivery with leases, bounded retry and dead-lettering
//!
//! ## Binaries
//!
//! - `tinylinks` - HTTP server
//! - `worker` - job worker pool
//! - `scheduler` - periodic job triggers
//! - `admin` - operator CLI
//!
//! ## Configuration
//!
//! Every binary loads its settings from environment variables via
//! [`config::Config`].

pub mod api;
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod state;
pub mod telemetry;
pub mod utils;

pub mod config;
pub mod server;

pub mod routes;

pub use error::AppError;
pub use state::AppState;

/// Commonly used types for external consumers.
///
/// Re-exports frequently used types to simplify imports for library users
/// and integration tests.
pub mod prelude {
    pub use crate::application::jobs::{
        HandlerRegistry, JobDispatcher, JobHandler, Scheduler, WorkerConfig, WorkerPool,
    };
    pub use crate::application::services::{
        AnalyticsService, CreateLink, LinkPolicy, LinkService, RedirectDecision,
    };
    pub use crate::domain::entities::{Job, JobKind, LinkStatus, NewJob, ShortLink};
    pub use crate::error::AppError;
    pub use crate::state::AppState;
}

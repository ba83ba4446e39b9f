//! Application layer: business services and the background job subsystem.
//!
//! Services orchestrate repository calls, validation, and business rules,
//! and provide a clean API for HTTP handlers. Jobs carry the asynchronous
//! half of the system.
//!
//! # Contents
//!
//! - [`services::link_service::LinkService`] - Link creation, redirect resolution, confirmation
//! - [`services::analytics_service::AnalyticsService`] - Per-slug geo statistics
//! - [`jobs`] - Dispatcher, worker pool, scheduler and job handlers

pub mod jobs;
pub mod services;

//! Tower layers applied in [`crate::routes::app_router`].

pub mod rate_limit;
pub mod tracing;

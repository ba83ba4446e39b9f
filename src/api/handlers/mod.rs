//! Axum handlers, one module per endpoint group.
//!
//! Errors are returned as [`crate::error::AppError`] and rendered by its
//! `IntoResponse` impl; only the redirect and health handlers build their
//! responses by hand.

pub mod analytics;
pub mod health;
pub mod links;
pub mod redirect;
pub mod shorten;

pub use analytics::analytics_handler;
pub use health::health_handler;
pub use links::{confirm_link_handler, link_list_handler, link_lookup_handler};
pub use redirect::redirect_handler;
pub use shorten::shorten_handler;

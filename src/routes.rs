//! Top-level router configuration.
//!
//! # Route Structure
//!
//! - `GET  /{slug}`  - Short link redirect
//! - `GET  /health`  - Health check: database and job queue
//! - `/api/*`        - JSON API
//!
//! # Middleware
//!
//! - **Tracing** - Structured request/response logging
//! - **Rate limiting** - Per-IP token bucket (proxy-aware when configured)
//! - **Path normalization** - Trailing slash handling

use crate::api;
use crate::api::handlers::{health_handler, redirect_handler};
use crate::api::middleware::{rate_limit, tracing};
use crate::state::AppState;
use axum::Router;
use axum::routing::get;
use tower::Layer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};

/// Constructs the application router with all routes and middleware.
///
/// # Arguments
///
/// - `state` - shared application state injected into all handlers
/// - `rate_limit` - requests per second allowed per client IP
///
/// `state.behind_proxy` selects whether rate limiting keys on proxy headers
/// or on the socket peer address.
pub fn app_router(state: AppState, rate_limit: u32) -> NormalizePath<Router> {
    let behind_proxy = state.behind_proxy;

    let limited = Router::new()
        .route("/{slug}", get(redirect_handler))
        .nest("/api", api::routes::api_routes());

    let limited = if behind_proxy {
        limited.layer(rate_limit::proxy_layer(rate_limit))
    } else {
        limited.layer(rate_limit::layer(rate_limit))
    };

    let router = Router::new()
        .route("/health", get(health_handler))
        .merge(limited)
        .with_state(state)
        .layer(tracing::layer());

    NormalizePathLayer::trim_trailing_slash().layer(router)
}

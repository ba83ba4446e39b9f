//! Rate limiting middleware using token bucket algorithm.

use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use std::sync::Arc;
use tower_governor::{
    GovernorLayer,
    governor::GovernorConfigBuilder,
    key_extractor::{KeyExtractor, PeerIpKeyExtractor, SmartIpKeyExtractor},
};

fn build<K: KeyExtractor>(
    per_second: u32,
    key_extractor: K,
) -> GovernorLayer<K, NoOpMiddleware<QuantaInstant>, axum::body::Body> {
    let per_second = per_second.max(1);
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_millisecond((1000 / u64::from(per_second)).max(1))
            .burst_size(per_second)
            .key_extractor(key_extractor)
            .finish()
            .expect("period and burst size are non-zero"),
    );

    GovernorLayer::new(governor_conf)
}

/// Creates a per-IP rate limiter keyed by the socket peer address.
///
/// # Limits
///
/// - **Rate**: `per_second` requests per second, replenished one at a time
/// - **Burst**: `per_second` requests
///
/// Requests exceeding the limit receive `429 Too Many Requests`.
///
/// # Example
///
/// ```rust,ignore
/// let app = Router::new()
///     .route("/api/shorten", post(shorten_handler))
///     .layer(rate_limit::layer(10));
/// ```
pub fn layer(
    per_second: u32,
) -> GovernorLayer<PeerIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body> {
    build(per_second, PeerIpKeyExtractor)
}

/// Same limits as [`layer`], keyed by `X-Forwarded-For` / `X-Real-IP` /
/// `Forwarded` with the peer address as fallback.
///
/// Use only behind a trusted reverse proxy; otherwise clients can pick
/// their own key.
pub fn proxy_layer(
    per_second: u32,
) -> GovernorLayer<SmartIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body> {
    build(per_second, SmartIpKeyExtractor)
}

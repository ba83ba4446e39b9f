//! Client address extraction for click attribution.

use axum::http::HeaderMap;
use std::net::SocketAddr;

const X_FORWARDED_FOR: &str = "x-forwarded-for";
const X_REAL_IP: &str = "x-real-ip";

/// Returns the client address string recorded for a request.
///
/// Behind a trusted proxy this is the raw `X-Forwarded-For` chain (which may
/// hold several comma-separated addresses) or `X-Real-IP`; otherwise, and when
/// neither header is usable, it is the socket peer address.
pub fn client_ip(headers: &HeaderMap, peer: SocketAddr, behind_proxy: bool) -> String {
    if behind_proxy && let Some(chain) = forwarded_chain(headers) {
        return chain;
    }
    peer.ip().to_string()
}

/// Splits a comma-separated address chain, dropping blanks.
pub fn split_chain(chain: &str) -> impl Iterator<Item = &str> {
    chain.split(',').map(str::trim).filter(|s| !s.is_empty())
}

fn forwarded_chain(headers: &HeaderMap) -> Option<String> {
    [X_FORWARDED_FOR, X_REAL_IP].iter().find_map(|name| {
        headers
            .get(*name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    })
}

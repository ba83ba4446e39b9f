//! URL normalization utilities.
//!
//! Input is trimmed and given an `https://` scheme when none is present. The
//! stored form is that trimmed string, not the re-serialized [`Url`], so a
//! link created for `https://example.com` redirects to exactly that.

use url::Url;

/// Errors that can occur during URL normalization.
#[derive(Debug, thiserror::Error)]
pub enum UrlNormalizationError {
    #[error("URL is empty")]
    Empty,

    #[error("Invalid URL format: {0}")]
    InvalidFormat(String),

    #[error("Only HTTP and HTTPS protocols are allowed")]
    UnsupportedProtocol,

    #[error("URL has no host")]
    MissingHost,
}

/// A validated target URL together with its lowercase host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedUrl {
    pub url: String,
    pub host: String,
}

/// Schemes that parse as absolute URLs but must never be prefixed.
const FOREIGN_SCHEMES: &[&str] = &[
    "javascript", "data", "mailto", "file", "ftp", "tel", "vbscript", "blob",
];

/// Normalizes a user-supplied URL.
///
/// # Normalization Rules
///
/// 1. Surrounding whitespace is removed
/// 2. `https://` is prepended when the input carries no HTTP(S) scheme
/// 3. The result must parse, use HTTP or HTTPS, and have a host
///
/// # Errors
///
/// Returns [`UrlNormalizationError::UnsupportedProtocol`] for `javascript:`,
/// `ftp://` and other non-HTTP schemes, and the remaining variants for
/// malformed input.
///
/// # Examples
///
/// ```ignore
/// let n = normalize_url("  example.com/path ").unwrap();
/// assert_eq!(n.url, "https://example.com/path");
/// assert_eq!(n.host, "example.com");
/// ```
pub fn normalize_url(input: &str) -> Result<NormalizedUrl, UrlNormalizationError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(UrlNormalizationError::Empty);
    }

    let candidate = if has_http_scheme(trimmed) {
        trimmed.to_string()
    } else if has_foreign_scheme(trimmed) {
        return Err(UrlNormalizationError::UnsupportedProtocol);
    } else {
        format!("https://{trimmed}")
    };

    let parsed =
        Url::parse(&candidate).map_err(|e| UrlNormalizationError::InvalidFormat(e.to_string()))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(UrlNormalizationError::UnsupportedProtocol);
    }

    let host = parsed
        .host_str()
        .filter(|h| !h.is_empty())
        .ok_or(UrlNormalizationError::MissingHost)?
        .to_ascii_lowercase();

    Ok(NormalizedUrl {
        url: candidate,
        host,
    })
}

fn has_http_scheme(s: &str) -> bool {
    let lower = s.get(..8).unwrap_or(s).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

fn has_foreign_scheme(s: &str) -> bool {
    if s.contains("://") {
        return true;
    }
    s.split_once(':').is_some_and(|(scheme, _)| {
        FOREIGN_SCHEMES.contains(&scheme.to_ascii_lowercase().as_str())
    })
}

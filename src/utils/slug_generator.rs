//! Slug generation and validation utilities.
//!
//! Random slugs are drawn from an alphabet without look-alike characters so
//! they survive being read aloud or retyped. Uniqueness is not guaranteed here;
//! the link service checks and regenerates on collision.

use crate::error::AppError;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::json;

/// Characters used for generated slugs. `0`, `O`, `I` and `l` are left out.
pub const SLUG_ALPHABET: &str = "123456789abcdefghijkmnopqrstuvwxyzABCDEFGHJKLMNPQRSTUVWXYZ";

/// Default length of a generated slug.
pub const DEFAULT_SLUG_LENGTH: usize = 6;

/// Length of the suffix appended to a colliding custom slug.
pub const SUFFIX_LENGTH: usize = 2;

const CUSTOM_SLUG_MIN: usize = 3;
const CUSTOM_SLUG_MAX: usize = 50;

/// Slugs that would shadow fixed routes.
const RESERVED_SLUGS: &[&str] = &["api", "health", "admin", "static", "favicon.ico"];

/// Generates a random slug of `length` characters from [`SLUG_ALPHABET`].
///
/// A fresh RNG is seeded from the OS for every call.
pub fn generate_slug(length: usize) -> String {
    let alphabet = SLUG_ALPHABET.as_bytes();
    let mut rng = StdRng::from_os_rng();

    (0..length)
        .map(|_| alphabet[rng.random_range(0..alphabet.len())] as char)
        .collect()
}

/// Builds the disambiguated form of a custom slug: `hint-XX`.
pub fn disambiguate(hint: &str) -> String {
    format!("{}-{}", hint, generate_slug(SUFFIX_LENGTH))
}

/// Validates a user-provided custom slug.
///
/// # Rules
///
/// - Length: 3-50 characters
/// - Allowed characters: ASCII letters, digits, hyphens, underscores
/// - Cannot start or end with a hyphen
/// - Cannot be a reserved route name
///
/// # Errors
///
/// Returns [`AppError::Validation`] if any rule is violated.
pub fn validate_custom_slug(slug: &str) -> Result<(), AppError> {
    let len = slug.chars().count();
    if !(CUSTOM_SLUG_MIN..=CUSTOM_SLUG_MAX).contains(&len) {
        return Err(AppError::bad_request(
            format!("Custom slug must be {CUSTOM_SLUG_MIN}-{CUSTOM_SLUG_MAX} characters"),
            json!({ "provided_length": len }),
        ));
    }

    if !slug
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(AppError::bad_request(
            "Custom slug can only contain letters, digits, hyphens and underscores",
            json!({ "slug": slug }),
        ));
    }

    if slug.starts_with('-') || slug.ends_with('-') {
        return Err(AppError::bad_request(
            "Custom slug cannot start or end with a hyphen",
            json!({ "slug": slug }),
        ));
    }

    if RESERVED_SLUGS.contains(&slug.to_ascii_lowercase().as_str()) {
        return Err(AppError::bad_request(
            "This slug is reserved",
            json!({ "slug": slug }),
        ));
    }

    Ok(())
}

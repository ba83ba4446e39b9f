//! Utility functions for slug generation, URL processing, and request handling.
//!
//! This module provides helper functions used across the application:
//!
//! - [`slug_generator`] - Random slug generation and custom slug validation
//! - [`url_normalizer`] - URL normalization and host extraction
//! - [`password`] - Argon2 hashing for link passwords
//! - [`client_ip`] - Client address extraction from request headers

pub mod client_ip;
pub mod password;
pub mod slug_generator;
pub mod url_normalizer;

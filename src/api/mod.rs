//! HTTP surface of tinylinks.
//!
//! Handlers stay thin: they parse input into DTOs, call
//! [`crate::application::services`], and map the outcome to a status code.
//! The redirect endpoint is the only one that touches the job queue, and it
//! does so indirectly through [`crate::application::services::LinkService`].
//!
//! - [`dto`] holds the JSON request and response shapes
//! - [`handlers`] holds one module per endpoint group
//! - [`middleware`] holds request tracing and per-IP rate limiting
//! - [`routes`] mounts everything under `/api` plus the public redirect

pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod routes;

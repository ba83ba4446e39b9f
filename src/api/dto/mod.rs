//! Wire shapes for the JSON API.
//!
//! Request types derive `Validate`; handlers call `validate()` before touching
//! a service.

pub mod analytics;
pub mod health;
pub mod links;
pub mod pagination;
pub mod redirect;
pub mod shorten;

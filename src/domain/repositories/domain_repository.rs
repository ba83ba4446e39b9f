//! Repository trait for host policy.

use crate::domain::entities::Domain;
use crate::error::AppError;
use async_trait::async_trait;

/// Repository interface for known hosts and their blacklist flag.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgDomainRepository`] - PostgreSQL implementation
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DomainRepository: Send + Sync {
    /// Finds a host record. `host` is expected in lowercase.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn find_by_host(&self, host: &str) -> Result<Option<Domain>, AppError>;

    /// Inserts or updates the blacklist flag for a host.
    async fn set_blacklisted(&self, host: &str, blacklisted: bool) -> Result<Domain, AppError>;

    /// Lists every blacklisted host.
    async fn list_blacklisted(&self) -> Result<Vec<Domain>, AppError>;
}

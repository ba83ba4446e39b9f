//! Repository trait for short link data access.

use crate::domain::entities::{LinkStatus, NewShortLink, ShortLink};
use crate::error::AppError;
use async_trait::async_trait;

/// Selection used by the spam scanner when paging through links.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkScan {
    /// Every link stored for this exact URL, whatever its status.
    Url(String),
    /// Every link currently in the `active` state.
    Active,
}

/// Repository interface for managing short links.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgLinkRepository`] - PostgreSQL implementation
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LinkRepository: Send + Sync {
    /// Creates a new short link.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if the slug already exists.
    /// Returns [`AppError::Internal`] on database errors.
    async fn create(&self, new_link: NewShortLink) -> Result<ShortLink, AppError>;

    /// Finds a link by its slug.
    async fn find_by_slug(&self, slug: &str) -> Result<Option<ShortLink>, AppError>;

    /// Finds every link stored for a URL, oldest first.
    async fn find_by_url(&self, url: &str) -> Result<Vec<ShortLink>, AppError>;

    /// Counts a click in a single statement: increments `click_counter` and
    /// promotes `pending` to `active`.
    ///
    /// Returns the updated link, or `None` if the slug does not exist.
    async fn record_click(&self, slug: &str) -> Result<Option<ShortLink>, AppError>;

    /// Promotes a `pending` link to `active` without counting a click.
    ///
    /// Returns the link after the update, or `None` if the slug does not exist.
    async fn confirm(&self, slug: &str) -> Result<Option<ShortLink>, AppError>;

    /// Overwrites the status of a link.
    ///
    /// Returns `false` if the slug does not exist.
    async fn set_status(&self, slug: &str, status: LinkStatus) -> Result<bool, AppError>;

    /// Returns up to `limit` links matching `scan` with `id > after_id`,
    /// ordered by id.
    async fn scan_page(
        &self,
        scan: LinkScan,
        after_id: i64,
        limit: i64,
    ) -> Result<Vec<ShortLink>, AppError>;

    /// Marks every link whose `expires_at` has passed as `expired`.
    ///
    /// Threat-flagged links keep their flag. Returns the number of rows changed.
    async fn expire_overdue(&self) -> Result<u64, AppError>;

    /// Deletes every link still in the `pending` state.
    ///
    /// Returns the number of rows deleted.
    async fn delete_pending(&self) -> Result<u64, AppError>;

    /// Lists links newest first, optionally restricted to one owner.
    ///
    /// `page` is 1-indexed.
    async fn list(
        &self,
        page: i64,
        page_size: i64,
        owner: Option<String>,
    ) -> Result<Vec<ShortLink>, AppError>;

    /// Counts links, optionally restricted to one owner.
    async fn count(&self, owner: Option<String>) -> Result<i64, AppError>;
}

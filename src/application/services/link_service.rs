//! Link creation, redirect resolution and confirmation.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::{debug, info};

use crate::application::jobs::JobDispatcher;
use crate::domain::entities::{
    DetectSpamRequest, LinkStatus, NewShortLink, ParseGeoRequest, ShortLink, ThreatType,
};
use crate::domain::repositories::{DomainRepository, LinkRepository};
use crate::error::AppError;
use crate::utils::password::{hash_password, verify_password};
use crate::utils::slug_generator::{disambiguate, generate_slug, validate_custom_slug};
use crate::utils::url_normalizer::normalize_url;

/// Number of candidate slugs tried before giving up.
const MAX_SLUG_ATTEMPTS: usize = 10;

/// Deployment-level link policy.
#[derive(Debug, Clone)]
pub struct LinkPolicy {
    /// Public base URL short links are served from.
    pub base_url: String,
    /// Length of generated slugs.
    pub slug_length: usize,
    /// New links start `pending` until the first click or an explicit
    /// confirmation when true, `active` otherwise.
    pub require_confirmation: bool,
}

impl Default for LinkPolicy {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            slug_length: crate::utils::slug_generator::DEFAULT_SLUG_LENGTH,
            require_confirmation: true,
        }
    }
}

/// Input for [`LinkService::create_or_get`].
#[derive(Debug, Clone, Default)]
pub struct CreateLink {
    pub url: String,
    pub slug_hint: Option<String>,
    pub password: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub mindful: bool,
    pub owner_ip: Option<String>,
    pub owner_username: Option<String>,
}

/// What a slug lookup should turn into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedirectDecision {
    NotFound,
    Expired,
    Flagged(ThreatType),
    PasswordRequired,
    PasswordIncorrect,
    ShowInterstitial(String),
    Redirect(String),
}

/// Result of slug allocation: either a row that was already stored for the
/// URL or one inserted by this call.
enum Allocation {
    Existing(ShortLink),
    Inserted(ShortLink),
}

/// Service for creating short links and resolving slugs.
///
/// Handles URL normalization, host policy, slug allocation with collision
/// handling, and the click-side state transitions. Background work (spam scan
/// on creation, geo enrichment on click) is dispatched fire-and-forget.
pub struct LinkService<L: LinkRepository, D: DomainRepository> {
    link_repository: Arc<L>,
    domain_repository: Arc<D>,
    dispatcher: JobDispatcher,
    policy: LinkPolicy,
}

impl<L: LinkRepository, D: DomainRepository> LinkService<L, D> {
    /// Creates a new link service.
    pub fn new(
        link_repository: Arc<L>,
        domain_repository: Arc<D>,
        dispatcher: JobDispatcher,
        policy: LinkPolicy,
    ) -> Self {
        Self {
            link_repository,
            domain_repository,
            dispatcher,
            policy,
        }
    }

    /// Creates a short link or returns the one already stored.
    ///
    /// # Slug Allocation
    ///
    /// - No hint: an existing link for the same URL is reused, otherwise a
    ///   random slug is generated
    /// - Hint unused: the hint becomes the slug
    /// - Hint used by the same URL: that link is returned unchanged
    /// - Hint used by a different URL: `hint-XX` is allocated, or the link
    ///   already stored under such a slug for this URL is returned
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] for a malformed URL, slug or an expiry
    /// in the past.
    /// Returns [`AppError::Forbidden`] if the URL's host is blacklisted.
    /// Returns [`AppError::Internal`] on storage errors or if no free slug
    /// could be found.
    pub async fn create_or_get(&self, request: CreateLink) -> Result<ShortLink, AppError> {
        let normalized = normalize_url(&request.url).map_err(|e| {
            AppError::bad_request(
                "Invalid URL format",
                json!({ "url": request.url, "reason": e.to_string() }),
            )
        })?;

        if let Some(hint) = &request.slug_hint {
            validate_custom_slug(hint)?;
        }

        if let Some(expires_at) = request.expires_at
            && expires_at <= Utc::now()
        {
            return Err(AppError::bad_request(
                "Expiration must be in the future",
                json!({ "expiration": expires_at.timestamp() }),
            ));
        }

        if let Some(domain) = self
            .domain_repository
            .find_by_host(&normalized.host)
            .await?
            && domain.blacklisted
        {
            return Err(AppError::forbidden(
                "Domain is blacklisted",
                json!({ "host": normalized.host }),
            ));
        }

        let url = normalized.url;
        let allocation = match request.slug_hint.clone() {
            Some(hint) => self.create_with_hint(&url, &hint, &request).await?,
            None => match self.link_repository.find_by_url(&url).await?.into_iter().next() {
                Some(existing) => Allocation::Existing(existing),
                None => {
                    let length = self.policy.slug_length;
                    Allocation::Inserted(
                        self.create_with_generated(&url, &request, || generate_slug(length))
                            .await?,
                    )
                }
            },
        };

        let link = match allocation {
            Allocation::Existing(existing) => {
                debug!(slug = %existing.slug, "Reusing existing link for URL");
                return Ok(existing);
            }
            Allocation::Inserted(link) => link,
        };

        metrics::counter!("links_created_total").increment(1);
        info!(slug = %link.slug, status = %link.status, "Short link created");

        self.dispatcher
            .dispatch(&DetectSpamRequest::scoped(link.url.clone()))
            .await;

        Ok(link)
    }

    async fn create_with_hint(
        &self,
        url: &str,
        hint: &str,
        request: &CreateLink,
    ) -> Result<Allocation, AppError> {
        match self.link_repository.find_by_slug(hint).await? {
            Some(existing) if existing.url == url => return Ok(Allocation::Existing(existing)),
            Some(_) => return self.disambiguate_hint(url, hint, request).await,
            None => {}
        }

        match self
            .link_repository
            .create(self.draft(url, hint.to_string(), request)?)
            .await
        {
            Ok(link) => Ok(Allocation::Inserted(link)),
            Err(AppError::Conflict { .. }) => {
                // Lost a race for the hint; re-read to decide between reuse and suffixing.
                match self.link_repository.find_by_slug(hint).await? {
                    Some(existing) if existing.url == url => Ok(Allocation::Existing(existing)),
                    _ => self.disambiguate_hint(url, hint, request).await,
                }
            }
            Err(e) => Err(e),
        }
    }

    async fn disambiguate_hint(
        &self,
        url: &str,
        hint: &str,
        request: &CreateLink,
    ) -> Result<Allocation, AppError> {
        if let Some(previous) = self
            .link_repository
            .find_by_url(url)
            .await?
            .into_iter()
            .find(|link| link.is_disambiguated_from(hint))
        {
            return Ok(Allocation::Existing(previous));
        }

        debug!(hint, "Requested slug taken by another URL, adding suffix");
        self.create_with_generated(url, request, || disambiguate(hint))
            .await
            .map(Allocation::Inserted)
    }

    /// Tries candidates from `next_slug` until one is free and inserted.
    async fn create_with_generated(
        &self,
        url: &str,
        request: &CreateLink,
        mut next_slug: impl FnMut() -> String + Send,
    ) -> Result<ShortLink, AppError> {
        for _ in 0..MAX_SLUG_ATTEMPTS {
            let slug = next_slug();

            if self.link_repository.find_by_slug(&slug).await?.is_some() {
                continue;
            }

            match self
                .link_repository
                .create(self.draft(url, slug, request)?)
                .await
            {
                Ok(link) => return Ok(link),
                Err(AppError::Conflict { .. }) => continue,
                Err(e) => return Err(e),
            }
        }

        Err(AppError::internal(
            "Failed to generate unique slug",
            json!({ "reason": "Too many collisions" }),
        ))
    }

    fn draft(&self, url: &str, slug: String, request: &CreateLink) -> Result<NewShortLink, AppError> {
        let password_hash = match request.password.as_deref() {
            Some(password) if !password.is_empty() => Some(hash_password(password)?),
            _ => None,
        };

        let status = if self.policy.require_confirmation {
            LinkStatus::Pending
        } else {
            LinkStatus::Active
        };

        Ok(NewShortLink {
            url: url.to_string(),
            slug,
            owner_ip: request.owner_ip.clone(),
            status,
            password_hash,
            expires_at: request.expires_at,
            mindful: request.mindful,
            owner_username: request.owner_username.clone(),
        })
    }

    /// Counts a click on `slug` and decides where the visitor goes.
    ///
    /// The click is counted (and a pending link activated) before any other
    /// check, and a geo enrichment job is dispatched for `client_ip`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors. An unknown slug is
    /// [`RedirectDecision::NotFound`], not an error.
    pub async fn resolve(
        &self,
        slug: &str,
        supplied_password: Option<&str>,
        client_ip: &str,
    ) -> Result<RedirectDecision, AppError> {
        let Some(link) = self.link_repository.record_click(slug).await? else {
            debug!(slug, "Unknown slug");
            return Ok(RedirectDecision::NotFound);
        };

        metrics::counter!("link_clicks_total").increment(1);

        self.dispatcher
            .dispatch(&ParseGeoRequest {
                ip: client_ip.to_string(),
                slug: link.slug.clone(),
            })
            .await;

        Ok(decide(&link, supplied_password))
    }

    /// Evaluates `slug` the way [`Self::resolve`] would, without counting a
    /// click or dispatching anything.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the slug does not exist.
    pub async fn inspect(
        &self,
        slug: &str,
        supplied_password: Option<&str>,
    ) -> Result<(ShortLink, RedirectDecision), AppError> {
        let link = self.get_link(slug).await?;
        let decision = decide(&link, supplied_password);
        Ok((link, decision))
    }

    /// Explicit confirmation signal: promotes a pending link to active.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the slug does not exist.
    pub async fn confirm(&self, slug: &str) -> Result<ShortLink, AppError> {
        let link = self
            .link_repository
            .confirm(slug)
            .await?
            .ok_or_else(|| AppError::not_found("Short link not found", json!({ "slug": slug })))?;

        info!(slug, status = %link.status, "Link confirmed");
        Ok(link)
    }

    /// Retrieves a link by slug without counting a click.
    pub async fn get_link(&self, slug: &str) -> Result<ShortLink, AppError> {
        self.link_repository
            .find_by_slug(slug)
            .await?
            .ok_or_else(|| AppError::not_found("Short link not found", json!({ "slug": slug })))
    }

    /// Lists links newest first with the total for pagination.
    pub async fn list_links(
        &self,
        page: i64,
        page_size: i64,
        owner: Option<String>,
    ) -> Result<(Vec<ShortLink>, i64), AppError> {
        let items = self
            .link_repository
            .list(page, page_size, owner.clone())
            .await?;
        let total = self.link_repository.count(owner).await?;
        Ok((items, total))
    }

    /// Constructs the public short URL for a slug.
    pub fn get_short_url(&self, slug: &str) -> String {
        format!("{}/{}", self.policy.base_url.trim_end_matches('/'), slug)
    }

    /// The public base URL, used for flag redirects.
    pub fn base_url(&self) -> &str {
        &self.policy.base_url
    }
}

/// Ordered checks applied to an existing link: expiry, threat flag,
/// password, interstitial.
fn decide(link: &ShortLink, supplied_password: Option<&str>) -> RedirectDecision {
    if link.is_expired(Utc::now()) {
        return RedirectDecision::Expired;
    }

    if let LinkStatus::Flagged(threat) = &link.status {
        return RedirectDecision::Flagged(threat.clone());
    }

    if let Some(hash) = &link.password_hash {
        match supplied_password.filter(|p| !p.is_empty()) {
            None => return RedirectDecision::PasswordRequired,
            Some(password) if !verify_password(password, hash) => {
                return RedirectDecision::PasswordIncorrect;
            }
            Some(_) => {}
        }
    }

    if link.mindful {
        return RedirectDecision::ShowInterstitial(link.url.clone());
    }

    RedirectDecision::Redirect(link.url.clone())
}

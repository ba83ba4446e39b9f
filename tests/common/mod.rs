#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tinylinks::application::jobs::JobDispatcher;
use tinylinks::application::services::{LinkPolicy, LinkService};
use tinylinks::domain::entities::{
    AnalyticsRecord, DeadJob, Domain, FailureDisposition, GeoHit, Job, JobFailure, JobId, JobKind,
    LinkStatus, NewJob, NewShortLink, QueueStats, ShortLink,
};
use tinylinks::domain::repositories::{
    AnalyticsRepository, DomainRepository, JobRepository, LinkRepository, LinkScan,
};
use tinylinks::error::AppError;
use tinylinks::infrastructure::geo::{GeoError, GeoLocation, GeoResolver};
use tinylinks::infrastructure::threat::{ThreatError, ThreatLookup, ThreatMatch};
use tinylinks::state::AppState;

pub const TEST_BASE_URL: &str = "http://sho.rt";

pub fn test_policy() -> LinkPolicy {
    LinkPolicy {
        base_url: TEST_BASE_URL.to_string(),
        ..LinkPolicy::default()
    }
}

pub fn create_test_state(pool: PgPool) -> AppState {
    AppState::new(Arc::new(pool), test_policy(), false)
}

// ---------------------------------------------------------------------------
// PostgreSQL fixtures
// ---------------------------------------------------------------------------

pub async fn insert_link(pool: &PgPool, slug: &str, url: &str, status: &str) -> i64 {
    sqlx::query_scalar("INSERT INTO links (slug, url, status) VALUES ($1, $2, $3) RETURNING id")
        .bind(slug)
        .bind(url)
        .bind(status)
        .fetch_one(pool)
        .await
        .unwrap()
}

pub async fn insert_expiring_link(pool: &PgPool, slug: &str, url: &str, status: &str, hours: i32) {
    sqlx::query(
        "INSERT INTO links (slug, url, status, expires_at) VALUES ($1, $2, $3, NOW() + make_interval(hours => $4))",
    )
    .bind(slug)
    .bind(url)
    .bind(status)
    .bind(hours)
    .execute(pool)
    .await
    .unwrap();
}

pub async fn insert_protected_link(pool: &PgPool, slug: &str, url: &str, password: &str) {
    let hash = tinylinks::utils::password::hash_password(password).unwrap();
    sqlx::query(
        "INSERT INTO links (slug, url, status, password_hash) VALUES ($1, $2, 'active', $3)",
    )
    .bind(slug)
    .bind(url)
    .bind(hash)
    .execute(pool)
    .await
    .unwrap();
}

pub async fn link_status(pool: &PgPool, slug: &str) -> Option<String> {
    sqlx::query_scalar("SELECT status FROM links WHERE slug = $1")
        .bind(slug)
        .fetch_optional(pool)
        .await
        .unwrap()
}

pub async fn click_counter(pool: &PgPool, slug: &str) -> i64 {
    sqlx::query_scalar("SELECT click_counter FROM links WHERE slug = $1")
        .bind(slug)
        .fetch_one(pool)
        .await
        .unwrap()
}

pub async fn blacklist_host(pool: &PgPool, host: &str) {
    sqlx::query("INSERT INTO domains (host, blacklisted) VALUES ($1, TRUE)")
        .bind(host)
        .execute(pool)
        .await
        .unwrap();
}

pub async fn queued_kinds(pool: &PgPool) -> Vec<String> {
    sqlx::query_scalar("SELECT kind FROM jobs ORDER BY id")
        .fetch_all(pool)
        .await
        .unwrap()
}

// ---------------------------------------------------------------------------
// In-memory repositories
// ---------------------------------------------------------------------------

/// In-memory link store with the same observable behavior as the PostgreSQL
/// repository.
#[derive(Default)]
pub struct MemoryLinkRepository {
    links: Mutex<Vec<ShortLink>>,
}

impl MemoryLinkRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a link directly, bypassing the service.
    pub fn seed(&self, slug: &str, url: &str, status: LinkStatus) -> ShortLink {
        self.insert(NewShortLink {
            url: url.to_string(),
            slug: slug.to_string(),
            owner_ip: None,
            status,
            password_hash: None,
            expires_at: None,
            mindful: false,
            owner_username: None,
        })
        .unwrap()
    }

    pub fn set_expires_at(&self, slug: &str, expires_at: DateTime<Utc>) {
        let mut links = self.links.lock().unwrap();
        if let Some(link) = links.iter_mut().find(|l| l.slug == slug) {
            link.expires_at = Some(expires_at);
        }
    }

    pub fn get(&self, slug: &str) -> Option<ShortLink> {
        self.links
            .lock()
            .unwrap()
            .iter()
            .find(|l| l.slug == slug)
            .cloned()
    }

    pub fn all(&self) -> Vec<ShortLink> {
        self.links.lock().unwrap().clone()
    }

    fn insert(&self, new_link: NewShortLink) -> Result<ShortLink, AppError> {
        let mut links = self.links.lock().unwrap();
        if links.iter().any(|l| l.slug == new_link.slug) {
            return Err(AppError::conflict(
                "Slug already exists",
                json!({ "slug": new_link.slug }),
            ));
        }

        let now = Utc::now();
        let link = ShortLink {
            id: links.iter().map(|l| l.id).max().unwrap_or(0) + 1,
            url: new_link.url,
            slug: new_link.slug,
            owner_ip: new_link.owner_ip,
            status: new_link.status,
            click_counter: 0,
            password_hash: new_link.password_hash,
            expires_at: new_link.expires_at,
            mindful: new_link.mindful,
            owner_username: new_link.owner_username,
            created_at: now,
            updated_at: now,
        };
        links.push(link.clone());
        Ok(link)
    }

    fn update<F: FnOnce(&mut ShortLink)>(&self, slug: &str, f: F) -> Option<ShortLink> {
        let mut links = self.links.lock().unwrap();
        let link = links.iter_mut().find(|l| l.slug == slug)?;
        f(link);
        link.updated_at = Utc::now();
        Some(link.clone())
    }
}

#[async_trait]
impl LinkRepository for MemoryLinkRepository {
    async fn create(&self, new_link: NewShortLink) -> Result<ShortLink, AppError> {
        self.insert(new_link)
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<ShortLink>, AppError> {
        Ok(self.get(slug))
    }

    async fn find_by_url(&self, url: &str) -> Result<Vec<ShortLink>, AppError> {
        Ok(self.all().into_iter().filter(|l| l.url == url).collect())
    }

    async fn record_click(&self, slug: &str) -> Result<Option<ShortLink>, AppError> {
        Ok(self.update(slug, |link| {
            link.click_counter += 1;
            if link.status == LinkStatus::Pending {
                link.status = LinkStatus::Active;
            }
        }))
    }

    async fn confirm(&self, slug: &str) -> Result<Option<ShortLink>, AppError> {
        Ok(self.update(slug, |link| {
            if link.status == LinkStatus::Pending {
                link.status = LinkStatus::Active;
            }
        }))
    }

    async fn set_status(&self, slug: &str, status: LinkStatus) -> Result<bool, AppError> {
        Ok(self.update(slug, |link| link.status = status).is_some())
    }

    async fn scan_page(
        &self,
        scan: LinkScan,
        after_id: i64,
        limit: i64,
    ) -> Result<Vec<ShortLink>, AppError> {
        let mut page: Vec<ShortLink> = self
            .all()
            .into_iter()
            .filter(|l| l.id > after_id)
            .filter(|l| match &scan {
                LinkScan::Url(url) => &l.url == url,
                LinkScan::Active => l.status == LinkStatus::Active,
            })
            .collect();
        page.sort_by_key(|l| l.id);
        page.truncate(limit.max(0) as usize);
        Ok(page)
    }

    async fn expire_overdue(&self) -> Result<u64, AppError> {
        let now = Utc::now();
        let mut links = self.links.lock().unwrap();
        let mut changed = 0;
        for link in links.iter_mut() {
            let live = matches!(link.status, LinkStatus::Pending | LinkStatus::Active);
            if live && link.expires_at.is_some_and(|at| at < now) {
                link.status = LinkStatus::Expired;
                changed += 1;
            }
        }
        Ok(changed)
    }

    async fn delete_pending(&self) -> Result<u64, AppError> {
        let mut links = self.links.lock().unwrap();
        let before = links.len();
        links.retain(|l| l.status != LinkStatus::Pending);
        Ok((before - links.len()) as u64)
    }

    async fn list(
        &self,
        page: i64,
        page_size: i64,
        owner: Option<String>,
    ) -> Result<Vec<ShortLink>, AppError> {
        let mut links: Vec<ShortLink> = self
            .all()
            .into_iter()
            .filter(|l| owner.is_none() || l.owner_username == owner)
            .collect();
        links.sort_by(|a, b| b.id.cmp(&a.id));
        let skip = ((page.max(1) - 1) * page_size) as usize;
        Ok(links.into_iter().skip(skip).take(page_size as usize).collect())
    }

    async fn count(&self, owner: Option<String>) -> Result<i64, AppError> {
        Ok(self
            .all()
            .iter()
            .filter(|l| owner.is_none() || l.owner_username == owner)
            .count() as i64)
    }
}

/// In-memory geo aggregate keyed on `(slug, country, region)`.
#[derive(Default)]
pub struct MemoryAnalyticsRepository {
    rows: Mutex<HashMap<(String, String, String), AnalyticsRecord>>,
}

impl MemoryAnalyticsRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn counter(&self, slug: &str, country: &str, region: &str) -> i64 {
        self.rows
            .lock()
            .unwrap()
            .get(&(slug.to_string(), country.to_string(), region.to_string()))
            .map(|r| r.click_counter)
            .unwrap_or(0)
    }
}

#[async_trait]
impl AnalyticsRepository for MemoryAnalyticsRepository {
    async fn upsert_hit(&self, hit: GeoHit) -> Result<(), AppError> {
        let now = Utc::now();
        let key = (hit.slug.clone(), hit.country.clone(), hit.region.clone());
        let mut rows = self.rows.lock().unwrap();
        rows.entry(key)
            .and_modify(|r| {
                r.click_counter += 1;
                r.city = hit.city.clone();
                r.updated_at = now;
            })
            .or_insert_with(|| AnalyticsRecord {
                slug: hit.slug.clone(),
                country: hit.country.clone(),
                region: hit.region.clone(),
                city: hit.city.clone(),
                click_counter: 1,
                created_at: now,
                updated_at: now,
            });
        Ok(())
    }

    async fn list_for_slug(&self, slug: &str) -> Result<Vec<AnalyticsRecord>, AppError> {
        let mut records: Vec<AnalyticsRecord> = self
            .rows
            .lock()
            .unwrap()
            .values()
            .filter(|r| r.slug == slug)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.click_counter.cmp(&a.click_counter));
        Ok(records)
    }
}

#[derive(Default)]
pub struct MemoryDomainRepository {
    hosts: Mutex<HashMap<String, Domain>>,
}

impl MemoryDomainRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DomainRepository for MemoryDomainRepository {
    async fn find_by_host(&self, host: &str) -> Result<Option<Domain>, AppError> {
        Ok(self.hosts.lock().unwrap().get(host).cloned())
    }

    async fn set_blacklisted(&self, host: &str, blacklisted: bool) -> Result<Domain, AppError> {
        let now = Utc::now();
        let mut hosts = self.hosts.lock().unwrap();
        let domain = hosts
            .entry(host.to_string())
            .or_insert_with(|| Domain::new(host.to_string(), blacklisted, now, now));
        domain.blacklisted = blacklisted;
        domain.updated_at = now;
        Ok(domain.clone())
    }

    async fn list_blacklisted(&self) -> Result<Vec<Domain>, AppError> {
        let mut domains: Vec<Domain> = self
            .hosts
            .lock()
            .unwrap()
            .values()
            .filter(|d| d.blacklisted)
            .cloned()
            .collect();
        domains.sort_by(|a, b| a.host.cmp(&b.host));
        Ok(domains)
    }
}

#[derive(Debug, Clone)]
struct StoredJob {
    job: Job,
    dead_at: Option<DateTime<Utc>>,
}

/// In-memory job queue with lease, retry and dead-letter bookkeeping.
#[derive(Default)]
pub struct MemoryJobRepository {
    jobs: Mutex<Vec<StoredJob>>,
    next_id: Mutex<i64>,
}

impl MemoryJobRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Jobs not yet retired, dead ones included, in insertion order.
    pub fn snapshot(&self) -> Vec<Job> {
        self.jobs
            .lock()
            .unwrap()
            .iter()
            .map(|s| s.job.clone())
            .collect()
    }

    pub fn kinds(&self) -> Vec<JobKind> {
        self.snapshot().iter().map(|j| j.kind).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.lock().unwrap().is_empty()
    }

    /// Makes every rescheduled job eligible right away.
    pub fn make_all_due(&self) {
        let now = Utc::now();
        for stored in self.jobs.lock().unwrap().iter_mut() {
            stored.job.run_at = now;
        }
    }
}

#[async_trait]
impl JobRepository for MemoryJobRepository {
    async fn enqueue(&self, job: NewJob) -> Result<JobId, AppError> {
        let id = {
            let mut next = self.next_id.lock().unwrap();
            *next += 1;
            JobId(*next)
        };
        let now = Utc::now();
        self.jobs.lock().unwrap().push(StoredJob {
            job: Job {
                id,
                kind: job.kind,
                payload: job.payload,
                queued_at: now,
                run_at: now,
                attempts: 0,
                last_error: None,
                lease_owner: None,
                lease_expires_at: None,
            },
            dead_at: None,
        });
        Ok(id)
    }

    async fn lease_next(
        &self,
        worker_id: &str,
        kinds: &[JobKind],
        lease_duration: Duration,
    ) -> Result<Option<Job>, AppError> {
        let now = Utc::now();
        let lease = chrono::Duration::from_std(lease_duration).unwrap_or(chrono::Duration::zero());
        let mut jobs = self.jobs.lock().unwrap();

        let next = jobs
            .iter_mut()
            .filter(|s| s.dead_at.is_none())
            .filter(|s| kinds.contains(&s.job.kind))
            .filter(|s| s.job.run_at <= now)
            .filter(|s| s.job.lease_expires_at.is_none_or(|at| at < now))
            .min_by_key(|s| (s.job.run_at, s.job.id));

        Ok(next.map(|stored| {
            stored.job.lease_owner = Some(worker_id.to_string());
            stored.job.lease_expires_at = Some(now + lease);
            stored.job.attempts += 1;
            stored.job.clone()
        }))
    }

    async fn retire(&self, id: JobId) -> Result<bool, AppError> {
        let mut jobs = self.jobs.lock().unwrap();
        let before = jobs.len();
        jobs.retain(|s| s.job.id != id);
        Ok(jobs.len() < before)
    }

    async fn release_failed(&self, id: JobId, failure: JobFailure) -> Result<(), AppError> {
        let mut jobs = self.jobs.lock().unwrap();
        if let Some(stored) = jobs.iter_mut().find(|s| s.job.id == id) {
            stored.job.lease_owner = None;
            stored.job.lease_expires_at = None;
            stored.job.last_error = Some(failure.error);
            match failure.disposition {
                FailureDisposition::RetryAt(run_at) => stored.job.run_at = run_at,
                FailureDisposition::DeadLetter => stored.dead_at = Some(Utc::now()),
            }
        }
        Ok(())
    }

    async fn queue_stats(&self) -> Result<QueueStats, AppError> {
        let now = Utc::now();
        let jobs = self.jobs.lock().unwrap();
        let mut stats = QueueStats::default();
        for stored in jobs.iter() {
            if stored.dead_at.is_some() {
                stats.dead += 1;
            } else if stored.job.lease_expires_at.is_some_and(|at| at >= now) {
                stats.leased += 1;
            } else {
                stats.pending += 1;
            }
        }
        Ok(stats)
    }

    async fn list_dead(&self, limit: i64) -> Result<Vec<DeadJob>, AppError> {
        let mut dead: Vec<DeadJob> = self
            .jobs
            .lock()
            .unwrap()
            .iter()
            .filter_map(|s| {
                s.dead_at.map(|dead_at| DeadJob {
                    id: s.job.id,
                    kind: s.job.kind.as_str().to_string(),
                    payload: s.job.payload.clone(),
                    attempts: s.job.attempts,
                    last_error: s.job.last_error.clone(),
                    queued_at: s.job.queued_at,
                    dead_at,
                })
            })
            .collect();
        dead.sort_by(|a, b| b.dead_at.cmp(&a.dead_at).then(b.id.cmp(&a.id)));
        dead.truncate(limit.max(0) as usize);
        Ok(dead)
    }

    async fn requeue_dead(&self, id: JobId) -> Result<bool, AppError> {
        let mut jobs = self.jobs.lock().unwrap();
        let Some(stored) = jobs
            .iter_mut()
            .find(|s| s.job.id == id && s.dead_at.is_some())
        else {
            return Ok(false);
        };
        stored.dead_at = None;
        stored.job.attempts = 0;
        stored.job.run_at = Utc::now();
        Ok(true)
    }

    async fn purge_dead(&self) -> Result<u64, AppError> {
        let mut jobs = self.jobs.lock().unwrap();
        let before = jobs.len();
        jobs.retain(|s| s.dead_at.is_none());
        Ok((before - jobs.len()) as u64)
    }
}

// ---------------------------------------------------------------------------
// External collaborators
// ---------------------------------------------------------------------------

/// Geo resolver backed by a fixed address table. Unknown addresses resolve
/// to `None`.
#[derive(Default)]
pub struct StaticGeoResolver {
    table: HashMap<String, GeoLocation>,
}

impl StaticGeoResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, ip: &str, country: &str, region: &str, city: &str) -> Self {
        self.table.insert(
            ip.to_string(),
            GeoLocation {
                country: country.to_string(),
                region: region.to_string(),
                city: city.to_string(),
            },
        );
        self
    }
}

#[async_trait]
impl GeoResolver for StaticGeoResolver {
    async fn resolve(&self, ip: &str) -> Result<Option<GeoLocation>, GeoError> {
        if ip.parse::<std::net::IpAddr>().is_err() {
            return Err(GeoError::InvalidAddress(ip.to_string()));
        }
        Ok(self.table.get(ip).cloned())
    }
}

/// Reputation lookup that reports a fixed set of URLs and records every
/// batch it receives.
#[derive(Default)]
pub struct StaticThreatLookup {
    threats: HashMap<String, String>,
    batches: Mutex<Vec<usize>>,
    fail: bool,
    delay: Duration,
}

impl StaticThreatLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, url: &str, threat_type: &str) -> Self {
        self.threats.insert(url.to_string(), threat_type.to_string());
        self
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Makes every lookup take `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Sizes of the batches received so far.
    pub fn batches(&self) -> Vec<usize> {
        self.batches.lock().unwrap().clone()
    }
}

#[async_trait]
impl ThreatLookup for StaticThreatLookup {
    async fn lookup_bulk(&self, urls: &[String]) -> Result<Vec<Vec<ThreatMatch>>, ThreatError> {
        self.batches.lock().unwrap().push(urls.len());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.fail {
            return Err(ThreatError::Request("connection refused".to_string()));
        }
        Ok(urls
            .iter()
            .map(|url| {
                self.threats
                    .get(url)
                    .map(|t| vec![ThreatMatch::new(t.as_str())])
                    .unwrap_or_default()
            })
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Service harness
// ---------------------------------------------------------------------------

/// A link service wired to in-memory stores.
pub struct Harness {
    pub links: Arc<MemoryLinkRepository>,
    pub domains: Arc<MemoryDomainRepository>,
    pub analytics: Arc<MemoryAnalyticsRepository>,
    pub jobs: Arc<MemoryJobRepository>,
    pub service: LinkService<MemoryLinkRepository, MemoryDomainRepository>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_policy(test_policy())
    }

    pub fn with_policy(policy: LinkPolicy) -> Self {
        let links = Arc::new(MemoryLinkRepository::new());
        let domains = Arc::new(MemoryDomainRepository::new());
        let analytics = Arc::new(MemoryAnalyticsRepository::new());
        let jobs = Arc::new(MemoryJobRepository::new());
        let service = LinkService::new(
            links.clone(),
            domains.clone(),
            JobDispatcher::new(jobs.clone()),
            policy,
        );

        Self {
            links,
            domains,
            analytics,
            jobs,
            service,
        }
    }

    pub fn job_store(&self) -> Arc<dyn JobRepository> {
        self.jobs.clone()
    }
}

// ---------------------------------------------------------------------------
// HTTP helpers
// ---------------------------------------------------------------------------

/// Inserts a fixed `ConnectInfo` so handlers can be served without a socket.
#[derive(Clone)]
pub struct MockConnectInfoLayer;

impl<S> tower::Layer<S> for MockConnectInfoLayer {
    type Service = MockConnectInfoService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        MockConnectInfoService { inner }
    }
}

#[derive(Clone)]
pub struct MockConnectInfoService<S> {
    inner: S,
}

impl<S, B> tower::Service<axum::http::Request<B>> for MockConnectInfoService<S>
where
    S: tower::Service<axum::http::Request<B>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    B: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: axum::http::Request<B>) -> Self::Future {
        let addr: std::net::SocketAddr = "127.0.0.1:12345".parse().unwrap();
        req.extensions_mut().insert(axum::extract::ConnectInfo(addr));
        self.inner.call(req)
    }
}

//! Threat scanning of stored links.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::application::jobs::dispatcher::JobDispatcher;
use crate::application::jobs::error::JobError;
use crate::application::jobs::handler::{JobHandler, decode_args};
use crate::domain::entities::{DetectSpamRequest, Job, JobKind, LinkStatus};
use crate::domain::repositories::{LinkRepository, LinkScan};
use crate::infrastructure::threat::ThreatLookup;

/// Number of links sent to the reputation service per request.
pub const DETECT_SPAM_BATCH_SIZE: i64 = 20;

/// Flags links whose URL the reputation service reports as a threat.
///
/// A scoped request checks every link stored for one URL; an unscoped request
/// sweeps all `active` links. Pages are keyed on the last seen id, so links
/// that get flagged (and leave the active set) do not shift later pages.
/// A reputation service failure fails the whole job.
///
/// With a time budget set, a scan that is still paging when the budget runs
/// out enqueues its own continuation (same scope, `after_id` of the last
/// page) and finishes, so no single job outlives the worker timeout however
/// large the table is.
pub struct DetectSpamHandler<L: LinkRepository> {
    links: Arc<L>,
    threats: Arc<dyn ThreatLookup>,
    batch_size: i64,
    budget: Option<(Duration, JobDispatcher)>,
}

impl<L: LinkRepository> DetectSpamHandler<L> {
    pub fn new(links: Arc<L>, threats: Arc<dyn ThreatLookup>) -> Self {
        Self {
            links,
            threats,
            batch_size: DETECT_SPAM_BATCH_SIZE,
            budget: None,
        }
    }

    /// Splits long scans into continuation jobs once `budget` has elapsed.
    pub fn with_time_budget(mut self, budget: Duration, dispatcher: JobDispatcher) -> Self {
        self.budget = Some((budget, dispatcher));
        self
    }
}

#[async_trait]
impl<L: LinkRepository + 'static> JobHandler for DetectSpamHandler<L> {
    fn kind(&self) -> JobKind {
        JobKind::DetectSpam
    }

    async fn handle(&self, job: &Job) -> Result<(), JobError> {
        let request: DetectSpamRequest = decode_args(job)?;
        let scan = match request.url_filter() {
            Some(url) => LinkScan::Url(url.to_string()),
            None => LinkScan::Active,
        };

        let started = Instant::now();
        let mut after_id = request.after_id.unwrap_or(0);
        let mut scanned = 0usize;
        let mut flagged = 0usize;

        loop {
            if let Some((budget, dispatcher)) = &self.budget
                && scanned > 0
                && started.elapsed() >= *budget
            {
                let continuation = dispatcher.enqueue(&request.resume_after(after_id)).await?;
                info!(
                    scope = ?request.url_filter(), scanned, flagged, after_id,
                    continuation = %continuation, "Spam scan out of time, continuing in a new job"
                );
                return Ok(());
            }

            let page = self
                .links
                .scan_page(scan.clone(), after_id, self.batch_size)
                .await?;
            let Some(last) = page.last() else {
                break;
            };
            after_id = last.id;
            scanned += page.len();

            let urls: Vec<String> = page.iter().map(|link| link.url.clone()).collect();
            let results = self.threats.lookup_bulk(&urls).await?;
            if results.len() != page.len() {
                return Err(JobError::Collaborator(format!(
                    "threat lookup returned {} results for {} urls",
                    results.len(),
                    page.len()
                )));
            }

            for (link, matches) in page.iter().zip(results) {
                let Some(first) = matches.into_iter().next() else {
                    continue;
                };
                let status = LinkStatus::Flagged(first.threat_type);
                if link.status == status {
                    continue;
                }

                debug!(slug = %link.slug, threat = %status, "Link flagged");
                self.links.set_status(&link.slug, status).await?;
                flagged += 1;
            }
        }

        info!(scope = ?request.url_filter(), scanned, flagged, "Spam scan finished");
        Ok(())
    }
}

//! Periodic triggers for sweeps and housekeeping.

use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_retry::Retry;
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use super::dispatcher::JobDispatcher;
use crate::domain::entities::{
    DetectSpamRequest, ExpireLinks, JobArgs, JobId, NewJob, RemovePendingLinks,
};
use crate::error::AppError;

/// Number of retries for a scheduled enqueue before the tick is skipped.
const ENQUEUE_RETRIES: usize = 5;

/// One periodic trigger.
#[derive(Debug, Clone)]
pub struct ScheduleEntry {
    pub job: NewJob,
    pub every: Duration,
}

impl ScheduleEntry {
    /// Builds an entry from typed arguments.
    ///
    /// # Errors
    ///
    /// Fails only if the arguments cannot be serialized.
    pub fn new<T: JobArgs>(args: &T, every: Duration) -> Result<Self, serde_json::Error> {
        Ok(Self {
            job: NewJob::from_args(args)?,
            every,
        })
    }
}

/// Intervals for the built-in triggers.
#[derive(Debug, Clone, Copy)]
pub struct ScheduleIntervals {
    pub spam_scan: Duration,
    pub expire: Duration,
    pub remove_pending: Duration,
}

impl Default for ScheduleIntervals {
    fn default() -> Self {
        Self {
            spam_scan: Duration::from_secs(24 * 3600),
            expire: Duration::from_secs(3600),
            remove_pending: Duration::from_secs(72 * 3600),
        }
    }
}

/// Enqueues jobs on fixed intervals.
///
/// The first run of each entry happens one interval after start. Unlike the
/// request path, the scheduler owns its triggers, so a failed enqueue is
/// retried with jittered exponential backoff before the tick is given up.
pub struct Scheduler {
    dispatcher: JobDispatcher,
    entries: Vec<ScheduleEntry>,
}

impl Scheduler {
    pub fn new(dispatcher: JobDispatcher) -> Self {
        Self {
            dispatcher,
            entries: Vec::new(),
        }
    }

    /// Scheduler with the unscoped spam sweep, expiry and pending cleanup.
    pub fn standard(
        dispatcher: JobDispatcher,
        intervals: ScheduleIntervals,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self::new(dispatcher)
            .every(ScheduleEntry::new(&DetectSpamRequest::all(), intervals.spam_scan)?)
            .every(ScheduleEntry::new(&ExpireLinks, intervals.expire)?)
            .every(ScheduleEntry::new(&RemovePendingLinks, intervals.remove_pending)?))
    }

    pub fn every(mut self, entry: ScheduleEntry) -> Self {
        self.entries.push(entry);
        self
    }

    pub fn entries(&self) -> &[ScheduleEntry] {
        &self.entries
    }

    /// Runs every entry until `shutdown` is cancelled.
    pub async fn run(self, shutdown: CancellationToken) {
        let mut set = JoinSet::new();
        for entry in self.entries {
            set.spawn(run_entry(self.dispatcher.clone(), entry, shutdown.clone()));
        }

        while let Some(result) = set.join_next().await {
            if let Err(e) = result {
                error!(error = %e, "Schedule task ended abnormally");
            }
        }
        info!("Scheduler stopped");
    }
}

async fn run_entry(dispatcher: JobDispatcher, entry: ScheduleEntry, shutdown: CancellationToken) {
    let kind = entry.job.kind;
    let mut ticker = tokio::time::interval_at(Instant::now() + entry.every, entry.every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    info!(kind = %kind, every_secs = entry.every.as_secs(), "Schedule registered");

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = ticker.tick() => {}
        }

        match enqueue_with_retry(&dispatcher, &entry.job).await {
            Ok(id) => info!(kind = %kind, job_id = %id, "Scheduled job enqueued"),
            Err(e) => error!(kind = %kind, error = %e, "Scheduled enqueue failed, skipping tick"),
        }
    }
}

/// Enqueues `job`, retrying with jittered exponential backoff.
pub async fn enqueue_with_retry(dispatcher: &JobDispatcher, job: &NewJob) -> Result<JobId, AppError> {
    let strategy = ExponentialBackoff::from_millis(100)
        .max_delay(Duration::from_secs(10))
        .map(jitter)
        .take(ENQUEUE_RETRIES);

    Retry::start(strategy, || dispatcher.enqueue_job(job.clone())).await
}

//! CLI administration tool for tinylinks.
//!
//! Provides commands for inspecting the job queue, handling dead jobs,
//! managing the host blacklist and performing database checks without
//! going through the HTTP API.
//!
//! # Usage
//!
//! ```bash
//! # Queue depth
//! cargo run --bin admin -- jobs stats
//!
//! # Inspect, retry and purge dead jobs
//! cargo run --bin admin -- jobs dead --limit 20
//! cargo run --bin admin -- jobs retry 42
//! cargo run --bin admin -- jobs purge-dead
//!
//! # Trigger a job by hand
//! cargo run --bin admin -- jobs enqueue detect-spam --url https://example.com
//! cargo run --bin admin -- jobs enqueue expire
//!
//! # Host blacklist
//! cargo run --bin admin -- domain block spam.example
//! cargo run --bin admin -- domain list
//!
//! # Link and analytics counts
//! cargo run --bin admin -- stats
//!
//! # Check database connection
//! cargo run --bin admin -- db check
//! ```
//!
//! # Environment Variables
//!
//! Database settings as for the server (`DATABASE_URL` or `DB_*`).

use tinylinks::application::jobs::JobDispatcher;
use tinylinks::config::Config;
use tinylinks::domain::entities::{DetectSpamRequest, ExpireLinks, JobId, RemovePendingLinks};
use tinylinks::domain::repositories::{DomainRepository, JobRepository};
use tinylinks::infrastructure::persistence::{PgDomainRepository, PgJobRepository};
use tinylinks::server;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use dialoguer::Confirm;
use sqlx::PgPool;
use std::sync::Arc;

/// CLI tool for managing tinylinks.
#[derive(Parser)]
#[command(name = "admin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Top-level command groups.
#[derive(Subcommand)]
enum Commands {
    /// Inspect and manage the job queue
    Jobs {
        #[command(subcommand)]
        action: JobsAction,
    },

    /// Manage the host blacklist
    Domain {
        #[command(subcommand)]
        action: DomainAction,
    },

    /// Show link and analytics counts
    Stats,

    /// Database operations
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
}

/// Job queue subcommands.
#[derive(Subcommand)]
enum JobsAction {
    /// Show pending, leased and dead job counts
    Stats,

    /// List dead-lettered jobs, newest first
    Dead {
        #[arg(short, long, default_value_t = 20)]
        limit: i64,
    },

    /// Put a dead job back in the queue with a fresh attempt budget
    Retry { id: i64 },

    /// Delete every dead job
    PurgeDead {
        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Enqueue a job by hand
    Enqueue {
        kind: ManualJob,

        /// Restrict a spam scan to one URL
        #[arg(long)]
        url: Option<String>,
    },
}

/// Job kinds that can be triggered without request context.
#[derive(Clone, Copy, ValueEnum)]
enum ManualJob {
    DetectSpam,
    Expire,
    RemovePending,
}

/// Host blacklist subcommands.
#[derive(Subcommand)]
enum DomainAction {
    /// Reject new links to this host
    Block { host: String },

    /// Allow new links to this host again
    Unblock { host: String },

    /// List blacklisted hosts
    List,
}

/// Database operation subcommands.
#[derive(Subcommand)]
enum DbAction {
    /// Check database connection
    Check,

    /// Show database info
    Info,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config = Config::from_env()?;
    let pool = server::connect(&config).await?;

    match cli.command {
        Commands::Jobs { action } => handle_jobs_action(action, &pool).await?,
        Commands::Domain { action } => handle_domain_action(action, &pool).await?,
        Commands::Stats => handle_stats(&pool).await?,
        Commands::Db { action } => handle_db_action(action, &pool).await?,
    }

    Ok(())
}

/// Dispatches job queue commands.
async fn handle_jobs_action(action: JobsAction, pool: &PgPool) -> Result<()> {
    let repo: Arc<dyn JobRepository> = Arc::new(PgJobRepository::new(Arc::new(pool.clone())));

    match action {
        JobsAction::Stats => job_stats(repo).await?,
        JobsAction::Dead { limit } => list_dead(repo, limit).await?,
        JobsAction::Retry { id } => retry_dead(repo, id).await?,
        JobsAction::PurgeDead { yes } => purge_dead(repo, yes).await?,
        JobsAction::Enqueue { kind, url } => enqueue(repo, kind, url).await?,
    }

    Ok(())
}

async fn job_stats(repo: Arc<dyn JobRepository>) -> Result<()> {
    println!("{}", "📊 Job Queue".bright_blue().bold());
    println!();

    let stats = repo
        .queue_stats()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to read queue stats: {}", e))?;

    println!("  Pending: {}", stats.pending.to_string().bright_green().bold());
    println!("  Leased:  {}", stats.leased.to_string().bright_cyan().bold());
    let dead = stats.dead.to_string();
    println!(
        "  Dead:    {}",
        if stats.dead > 0 {
            dead.red().bold()
        } else {
            dead.bright_black()
        }
    );
    println!();

    Ok(())
}

/// Lists dead jobs with their last error.
///
/// # Output Format
///
/// ```text
///   ID    Kind                 Attempts  Dead since        Last error
///   ─────────────────────────────────────────────────────────────────
///   42    DetectSpamJob        5         2026-01-15 10:30  Threat lookup failed: ...
/// ```
async fn list_dead(repo: Arc<dyn JobRepository>, limit: i64) -> Result<()> {
    println!("{}", "💀 Dead Jobs".bright_blue().bold());
    println!();

    let jobs = repo
        .list_dead(limit)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to list dead jobs: {}", e))?;

    if jobs.is_empty() {
        println!("{}", "  No dead jobs".green());
        return Ok(());
    }

    println!(
        "  {:<6} {:<20} {:<9} {:<17} {}",
        "ID".bright_white().bold(),
        "Kind".bright_white().bold(),
        "Attempts".bright_white().bold(),
        "Dead since".bright_white().bold(),
        "Last error".bright_white().bold()
    );
    println!("  {}", "─".repeat(75).bright_black());

    for job in &jobs {
        println!(
            "  {:<6} {:<20} {:<9} {:<17} {}",
            job.id.to_string().bright_black(),
            job.kind.cyan(),
            job.attempts,
            job.dead_at.format("%Y-%m-%d %H:%M").to_string().bright_black(),
            job.last_error.as_deref().unwrap_or("-").red()
        );
        println!("         {}", job.payload.to_string().bright_black());
    }

    println!();
    println!("  Shown: {}", jobs.len().to_string().bright_white().bold());
    println!();

    Ok(())
}

async fn retry_dead(repo: Arc<dyn JobRepository>, id: i64) -> Result<()> {
    let requeued = repo
        .requeue_dead(JobId(id))
        .await
        .map_err(|e| anyhow::anyhow!("Failed to requeue job: {}", e))?;

    if requeued {
        println!("{}", format!("✅ Job {id} requeued").green().bold());
    } else {
        println!("{}", format!("⚠️  No dead job with id {id}").yellow());
    }

    Ok(())
}

/// Deletes all dead jobs after confirmation (default: No).
async fn purge_dead(repo: Arc<dyn JobRepository>, skip_confirm: bool) -> Result<()> {
    if !skip_confirm {
        let confirmed = Confirm::new()
            .with_prompt("Delete all dead jobs?")
            .default(false)
            .interact()?;

        if !confirmed {
            println!("{}", "❌ Cancelled".red());
            return Ok(());
        }
    }

    let purged = repo
        .purge_dead()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to purge dead jobs: {}", e))?;

    println!(
        "{}",
        format!("✅ Purged {purged} dead job(s)").green().bold()
    );

    Ok(())
}

async fn enqueue(repo: Arc<dyn JobRepository>, kind: ManualJob, url: Option<String>) -> Result<()> {
    let dispatcher = JobDispatcher::new(repo);

    let id = match (kind, url) {
        (ManualJob::DetectSpam, Some(url)) => {
            dispatcher.enqueue(&DetectSpamRequest::scoped(url)).await
        }
        (ManualJob::DetectSpam, None) => dispatcher.enqueue(&DetectSpamRequest::all()).await,
        (ManualJob::Expire, _) => dispatcher.enqueue(&ExpireLinks).await,
        (ManualJob::RemovePending, _) => dispatcher.enqueue(&RemovePendingLinks).await,
    }
    .map_err(|e| anyhow::anyhow!("Failed to enqueue job: {}", e))?;

    println!("{}", format!("✅ Enqueued job {id}").green().bold());

    Ok(())
}

/// Dispatches host blacklist commands.
async fn handle_domain_action(action: DomainAction, pool: &PgPool) -> Result<()> {
    let repo = PgDomainRepository::new(Arc::new(pool.clone()));

    match action {
        DomainAction::Block { host } => {
            let domain = repo
                .set_blacklisted(&host.trim().to_lowercase(), true)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to block host: {}", e))?;
            println!("{}", format!("🚫 Blocked {}", domain.host).red().bold());
        }
        DomainAction::Unblock { host } => {
            let domain = repo
                .set_blacklisted(&host.trim().to_lowercase(), false)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to unblock host: {}", e))?;
            println!("{}", format!("✅ Unblocked {}", domain.host).green().bold());
        }
        DomainAction::List => {
            println!("{}", "🚫 Blacklisted Hosts".bright_blue().bold());
            println!();

            let domains = repo
                .list_blacklisted()
                .await
                .map_err(|e| anyhow::anyhow!("Failed to list hosts: {}", e))?;

            if domains.is_empty() {
                println!("{}", "  No blacklisted hosts".yellow());
                return Ok(());
            }

            for domain in &domains {
                println!(
                    "  {:<40} {}",
                    domain.host.cyan(),
                    domain
                        .updated_at
                        .format("%Y-%m-%d %H:%M")
                        .to_string()
                        .bright_black()
                );
            }
            println!();
        }
    }

    Ok(())
}

/// Displays link and analytics counts.
async fn handle_stats(pool: &PgPool) -> Result<()> {
    println!("{}", "📊 Statistics".bright_blue().bold());
    println!();

    let by_status: Vec<(String, i64)> = sqlx::query_as(
        "SELECT status, COUNT(*) FROM links GROUP BY status ORDER BY COUNT(*) DESC",
    )
    .fetch_all(pool)
    .await
    .context("Failed to count links")?;

    let clicks: i64 = sqlx::query_scalar("SELECT COALESCE(SUM(click_counter), 0)::BIGINT FROM links")
        .fetch_one(pool)
        .await?;

    let located: i64 =
        sqlx::query_scalar("SELECT COALESCE(SUM(click_counter), 0)::BIGINT FROM link_analytics")
            .fetch_one(pool)
            .await?;

    for (status, count) in &by_status {
        println!(
            "  Links ({:<10}) {}",
            status,
            count.to_string().bright_green().bold()
        );
    }
    println!("  Clicks:            {}", clicks.to_string().bright_green().bold());
    println!("  Located clicks:    {}", located.to_string().bright_green().bold());
    println!();

    Ok(())
}

/// Handles database diagnostic commands.
async fn handle_db_action(action: DbAction, pool: &PgPool) -> Result<()> {
    match action {
        DbAction::Check => {
            println!("{}", "🔍 Checking database connection...".bright_blue());

            sqlx::query("SELECT 1").fetch_one(pool).await?;

            println!("{}", "✅ Database connection OK".green().bold());
        }
        DbAction::Info => {
            println!("{}", "ℹ️  Database Information".bright_blue().bold());
            println!();

            let version: String = sqlx::query_scalar("SELECT version()")
                .fetch_one(pool)
                .await?;

            println!("  PostgreSQL: {}", version.bright_white());
            println!();
        }
    }

    Ok(())
}

mod common;

use chrono::{Duration as ChronoDuration, Utc};
use serde_json::json;
use sqlx::PgPool;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tinylinks::domain::entities::{
    ExpireLinks, FailureDisposition, JobFailure, JobKind, NewJob, ParseGeoRequest,
};
use tinylinks::domain::repositories::JobRepository;
use tinylinks::infrastructure::persistence::PgJobRepository;

const LEASE: Duration = Duration::from_secs(60);

fn geo_job(slug: &str) -> NewJob {
    NewJob::from_args(&ParseGeoRequest {
        ip: "1.2.3.4".to_string(),
        slug: slug.to_string(),
    })
    .unwrap()
}

#[sqlx::test]
async fn test_enqueue_and_lease(pool: PgPool) {
    let repo = PgJobRepository::new(Arc::new(pool));

    let id = repo.enqueue(geo_job("abc123")).await.unwrap();
    let job = repo
        .lease_next("w1", &[JobKind::ParseGeo], LEASE)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(job.id, id);
    assert_eq!(job.kind, JobKind::ParseGeo);
    assert_eq!(job.payload, json!({ "ip": "1.2.3.4", "slug": "abc123" }));
    assert_eq!(job.attempts, 1);
    assert_eq!(job.lease_owner.as_deref(), Some("w1"));
    assert!(job.lease_expires_at.unwrap() > Utc::now());
}

#[sqlx::test]
async fn test_leased_job_is_hidden_from_other_workers(pool: PgPool) {
    let repo = PgJobRepository::new(Arc::new(pool));
    repo.enqueue(geo_job("abc123")).await.unwrap();

    assert!(repo.lease_next("w1", &[JobKind::ParseGeo], LEASE).await.unwrap().is_some());
    assert!(repo.lease_next("w2", &[JobKind::ParseGeo], LEASE).await.unwrap().is_none());

    let stats = repo.queue_stats().await.unwrap();
    assert_eq!((stats.pending, stats.leased, stats.dead), (0, 1, 0));
}

#[sqlx::test]
async fn test_expired_lease_is_delivered_again(pool: PgPool) {
    let repo = PgJobRepository::new(Arc::new(pool));
    let id = repo.enqueue(geo_job("abc123")).await.unwrap();

    repo.lease_next("w1", &[JobKind::ParseGeo], Duration::from_millis(1))
        .await
        .unwrap()
        .unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    let again = repo
        .lease_next("w2", &[JobKind::ParseGeo], LEASE)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(again.id, id);
    assert_eq!(again.lease_owner.as_deref(), Some("w2"));
}

#[sqlx::test]
async fn test_expired_lease_counts_attempt(pool: PgPool) {
    let repo = PgJobRepository::new(Arc::new(pool));
    let id = repo.enqueue(geo_job("abc123")).await.unwrap();

    // Two workers die holding the lease; neither reports back.
    for worker in ["w1", "w2"] {
        repo.lease_next(worker, &[JobKind::ParseGeo], Duration::from_millis(1))
            .await
            .unwrap()
            .unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    let job = repo
        .lease_next("w3", &[JobKind::ParseGeo], LEASE)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(job.id, id);
    assert_eq!(job.attempts, 3);
}

#[sqlx::test]
async fn test_lease_filters_by_kind(pool: PgPool) {
    let repo = PgJobRepository::new(Arc::new(pool));
    repo.enqueue(geo_job("abc123")).await.unwrap();

    assert!(repo.lease_next("w1", &[JobKind::Expire], LEASE).await.unwrap().is_none());

    repo.enqueue(NewJob::from_args(&ExpireLinks).unwrap())
        .await
        .unwrap();
    let job = repo
        .lease_next("w1", &[JobKind::Expire], LEASE)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(job.kind, JobKind::Expire);
}

#[sqlx::test]
async fn test_concurrent_leases_never_share_a_job(pool: PgPool) {
    let repo = Arc::new(PgJobRepository::new(Arc::new(pool)));
    for n in 0..20 {
        repo.enqueue(geo_job(&format!("slug{n:02}"))).await.unwrap();
    }

    let mut tasks = Vec::new();
    for w in 0..8 {
        let repo = repo.clone();
        tasks.push(tokio::spawn(async move {
            let mut leased = Vec::new();
            while let Some(job) = repo
                .lease_next(&format!("w{w}"), &[JobKind::ParseGeo], LEASE)
                .await
                .unwrap()
            {
                leased.push(job.id);
            }
            leased
        }));
    }

    let mut all = Vec::new();
    for task in tasks {
        all.extend(task.await.unwrap());
    }
    let unique: HashSet<_> = all.iter().copied().collect();

    assert_eq!(all.len(), 20);
    assert_eq!(unique.len(), 20);
}

#[sqlx::test]
async fn test_retire_deletes_job(pool: PgPool) {
    let repo = PgJobRepository::new(Arc::new(pool));
    let id = repo.enqueue(geo_job("abc123")).await.unwrap();

    assert!(repo.retire(id).await.unwrap());
    assert!(!repo.retire(id).await.unwrap());
    assert_eq!(repo.queue_stats().await.unwrap().pending, 0);
}

#[sqlx::test]
async fn test_release_failed_reschedules(pool: PgPool) {
    let repo = PgJobRepository::new(Arc::new(pool));
    let id = repo.enqueue(geo_job("abc123")).await.unwrap();
    repo.lease_next("w1", &[JobKind::ParseGeo], LEASE)
        .await
        .unwrap()
        .unwrap();

    repo.release_failed(
        id,
        JobFailure {
            error: "geo service down".to_string(),
            disposition: FailureDisposition::RetryAt(Utc::now() + ChronoDuration::hours(1)),
        },
    )
    .await
    .unwrap();

    // Not due yet.
    assert!(repo.lease_next("w1", &[JobKind::ParseGeo], LEASE).await.unwrap().is_none());
    assert_eq!(repo.queue_stats().await.unwrap().pending, 1);

    repo.release_failed(
        id,
        JobFailure {
            error: "geo service down again".to_string(),
            disposition: FailureDisposition::RetryAt(Utc::now() - ChronoDuration::seconds(1)),
        },
    )
    .await
    .unwrap();

    let job = repo
        .lease_next("w1", &[JobKind::ParseGeo], LEASE)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(job.attempts, 2);
    assert_eq!(job.last_error.as_deref(), Some("geo service down again"));
}

#[sqlx::test]
async fn test_dead_letter_lifecycle(pool: PgPool) {
    let repo = PgJobRepository::new(Arc::new(pool));
    let id = repo.enqueue(geo_job("abc123")).await.unwrap();
    repo.lease_next("w1", &JobKind::ALL, LEASE)
        .await
        .unwrap()
        .unwrap();

    repo.release_failed(
        id,
        JobFailure {
            error: "payload rejected".to_string(),
            disposition: FailureDisposition::DeadLetter,
        },
    )
    .await
    .unwrap();

    assert!(repo.lease_next("w1", &JobKind::ALL, LEASE).await.unwrap().is_none());

    let dead = repo.list_dead(10).await.unwrap();
    assert_eq!(dead.len(), 1);
    assert_eq!(dead[0].id, id);
    assert_eq!(dead[0].kind, "ParseGeoRequestJob");
    assert_eq!(dead[0].attempts, 1);
    assert_eq!(dead[0].last_error.as_deref(), Some("payload rejected"));

    assert!(repo.requeue_dead(id).await.unwrap());
    assert!(!repo.requeue_dead(id).await.unwrap());
    let job = repo
        .lease_next("w1", &JobKind::ALL, LEASE)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(job.attempts, 1);
}

#[sqlx::test]
async fn test_purge_dead_keeps_live_jobs(pool: PgPool) {
    let repo = PgJobRepository::new(Arc::new(pool));
    let dead_id = repo.enqueue(geo_job("dead01")).await.unwrap();
    repo.enqueue(geo_job("live01")).await.unwrap();
    repo.release_failed(
        dead_id,
        JobFailure {
            error: "boom".to_string(),
            disposition: FailureDisposition::DeadLetter,
        },
    )
    .await
    .unwrap();

    assert_eq!(repo.purge_dead().await.unwrap(), 1);

    let stats = repo.queue_stats().await.unwrap();
    assert_eq!((stats.pending, stats.dead), (1, 0));
}

//! PostgreSQL implementation of domain repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::entities::Domain;
use crate::domain::repositories::DomainRepository;
use crate::error::AppError;

#[derive(sqlx::FromRow)]
struct DomainRow {
    host: String,
    blacklisted: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<DomainRow> for Domain {
    fn from(r: DomainRow) -> Self {
        Domain::new(r.host, r.blacklisted, r.created_at, r.updated_at)
    }
}

/// PostgreSQL repository for host policy.
pub struct PgDomainRepository {
    pool: Arc<PgPool>,
}

impl PgDomainRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DomainRepository for PgDomainRepository {
    async fn find_by_host(&self, host: &str) -> Result<Option<Domain>, AppError> {
        let row = sqlx::query_as::<_, DomainRow>(
            "SELECT host, blacklisted, created_at, updated_at FROM domains WHERE host = $1",
        )
        .bind(host)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(row.map(Into::into))
    }

    async fn set_blacklisted(&self, host: &str, blacklisted: bool) -> Result<Domain, AppError> {
        let row = sqlx::query_as::<_, DomainRow>(
            r#"
            INSERT INTO domains (host, blacklisted)
            VALUES ($1, $2)
            ON CONFLICT (host) DO UPDATE
            SET blacklisted = EXCLUDED.blacklisted, updated_at = NOW()
            RETURNING host, blacklisted, created_at, updated_at
            "#,
        )
        .bind(host)
        .bind(blacklisted)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(row.into())
    }

    async fn list_blacklisted(&self) -> Result<Vec<Domain>, AppError> {
        let rows = sqlx::query_as::<_, DomainRow>(
            r#"
            SELECT host, blacklisted, created_at, updated_at
            FROM domains
            WHERE blacklisted = TRUE
            ORDER BY host
            "#,
        )
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}

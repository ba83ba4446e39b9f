//! PostgreSQL implementation of link repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::entities::{LinkStatus, NewShortLink, ShortLink};
use crate::domain::repositories::{LinkRepository, LinkScan};
use crate::error::AppError;

const LINK_COLUMNS: &str = "id, url, slug, owner_ip, status, click_counter, password_hash, \
     expires_at, mindful, owner_username, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct LinkRow {
    id: i64,
    url: String,
    slug: String,
    owner_ip: Option<String>,
    status: String,
    click_counter: i64,
    password_hash: Option<String>,
    expires_at: Option<DateTime<Utc>>,
    mindful: bool,
    owner_username: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<LinkRow> for ShortLink {
    fn from(r: LinkRow) -> Self {
        ShortLink {
            id: r.id,
            url: r.url,
            slug: r.slug,
            owner_ip: r.owner_ip,
            status: LinkStatus::from_db(&r.status),
            click_counter: r.click_counter,
            password_hash: r.password_hash,
            expires_at: r.expires_at,
            mindful: r.mindful,
            owner_username: r.owner_username,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

/// PostgreSQL repository for short links.
///
/// Click counting, confirmation and the housekeeping jobs are single
/// statements, so concurrent requests and workers never lose updates.
pub struct PgLinkRepository {
    pool: Arc<PgPool>,
}

impl PgLinkRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LinkRepository for PgLinkRepository {
    async fn create(&self, new_link: NewShortLink) -> Result<ShortLink, AppError> {
        let sql = format!(
            r#"
            INSERT INTO links (url, slug, owner_ip, status, password_hash, expires_at, mindful, owner_username)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {LINK_COLUMNS}
            "#
        );

        let row = sqlx::query_as::<_, LinkRow>(&sql)
            .bind(&new_link.url)
            .bind(&new_link.slug)
            .bind(&new_link.owner_ip)
            .bind(new_link.status.as_db_str())
            .bind(&new_link.password_hash)
            .bind(new_link.expires_at)
            .bind(new_link.mindful)
            .bind(&new_link.owner_username)
            .fetch_one(self.pool.as_ref())
            .await?;

        Ok(row.into())
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<ShortLink>, AppError> {
        let sql = format!("SELECT {LINK_COLUMNS} FROM links WHERE slug = $1");

        let row = sqlx::query_as::<_, LinkRow>(&sql)
            .bind(slug)
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(row.map(Into::into))
    }

    async fn find_by_url(&self, url: &str) -> Result<Vec<ShortLink>, AppError> {
        let sql = format!("SELECT {LINK_COLUMNS} FROM links WHERE url = $1 ORDER BY id");

        let rows = sqlx::query_as::<_, LinkRow>(&sql)
            .bind(url)
            .fetch_all(self.pool.as_ref())
            .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn record_click(&self, slug: &str) -> Result<Option<ShortLink>, AppError> {
        let sql = format!(
            r#"
            UPDATE links
            SET click_counter = click_counter + 1,
                status = CASE WHEN status = 'pending' THEN 'active' ELSE status END,
                updated_at = NOW()
            WHERE slug = $1
            RETURNING {LINK_COLUMNS}
            "#
        );

        let row = sqlx::query_as::<_, LinkRow>(&sql)
            .bind(slug)
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(row.map(Into::into))
    }

    async fn confirm(&self, slug: &str) -> Result<Option<ShortLink>, AppError> {
        let sql = format!(
            r#"
            UPDATE links
            SET status = CASE WHEN status = 'pending' THEN 'active' ELSE status END,
                updated_at = NOW()
            WHERE slug = $1
            RETURNING {LINK_COLUMNS}
            "#
        );

        let row = sqlx::query_as::<_, LinkRow>(&sql)
            .bind(slug)
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(row.map(Into::into))
    }

    async fn set_status(&self, slug: &str, status: LinkStatus) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE links SET status = $2, updated_at = NOW() WHERE slug = $1")
            .bind(slug)
            .bind(status.as_db_str())
            .execute(self.pool.as_ref())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn scan_page(
        &self,
        scan: LinkScan,
        after_id: i64,
        limit: i64,
    ) -> Result<Vec<ShortLink>, AppError> {
        let rows = match scan {
            LinkScan::Url(url) => {
                let sql = format!(
                    "SELECT {LINK_COLUMNS} FROM links WHERE url = $1 AND id > $2 ORDER BY id LIMIT $3"
                );
                sqlx::query_as::<_, LinkRow>(&sql)
                    .bind(url)
                    .bind(after_id)
                    .bind(limit)
                    .fetch_all(self.pool.as_ref())
                    .await?
            }
            LinkScan::Active => {
                let sql = format!(
                    "SELECT {LINK_COLUMNS} FROM links WHERE status = 'active' AND id > $1 ORDER BY id LIMIT $2"
                );
                sqlx::query_as::<_, LinkRow>(&sql)
                    .bind(after_id)
                    .bind(limit)
                    .fetch_all(self.pool.as_ref())
                    .await?
            }
        };

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn expire_overdue(&self) -> Result<u64, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE links
            SET status = 'expired', updated_at = NOW()
            WHERE expires_at IS NOT NULL
              AND expires_at < NOW()
              AND status IN ('pending', 'active')
            "#,
        )
        .execute(self.pool.as_ref())
        .await?;

        Ok(result.rows_affected())
    }

    async fn delete_pending(&self) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM links WHERE status = 'pending'")
            .execute(self.pool.as_ref())
            .await?;

        Ok(result.rows_affected())
    }

    async fn list(
        &self,
        page: i64,
        page_size: i64,
        owner: Option<String>,
    ) -> Result<Vec<ShortLink>, AppError> {
        let offset = (page - 1) * page_size;
        let sql = format!(
            r#"
            SELECT {LINK_COLUMNS}
            FROM links
            WHERE ($1::text IS NULL OR owner_username = $1)
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "#
        );

        let rows = sqlx::query_as::<_, LinkRow>(&sql)
            .bind(owner)
            .bind(page_size)
            .bind(offset)
            .fetch_all(self.pool.as_ref())
            .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn count(&self, owner: Option<String>) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM links WHERE ($1::text IS NULL OR owner_username = $1)",
        )
        .bind(owner)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(count)
    }
}

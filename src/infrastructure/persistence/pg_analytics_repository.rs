//! PostgreSQL implementation of analytics repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::entities::{AnalyticsRecord, GeoHit};
use crate::domain::repositories::AnalyticsRepository;
use crate::error::AppError;

#[derive(sqlx::FromRow)]
struct AnalyticsRow {
    slug: String,
    country: String,
    region: String,
    city: String,
    click_counter: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// PostgreSQL repository for the geo click aggregate.
///
/// The upsert is keyed on the `(slug, country, region)` primary key, so a
/// redelivered geo job adds exactly one more click per resolved address.
pub struct PgAnalyticsRepository {
    pool: Arc<PgPool>,
}

impl PgAnalyticsRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AnalyticsRepository for PgAnalyticsRepository {
    async fn upsert_hit(&self, hit: GeoHit) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO link_analytics (slug, country, region, city, click_counter)
            VALUES ($1, $2, $3, $4, 1)
            ON CONFLICT ON CONSTRAINT link_analytics_slug_country_region_pkey DO UPDATE
            SET click_counter = link_analytics.click_counter + 1,
                updated_at = NOW()
            "#,
        )
        .bind(&hit.slug)
        .bind(&hit.country)
        .bind(&hit.region)
        .bind(&hit.city)
        .execute(self.pool.as_ref())
        .await?;

        Ok(())
    }

    async fn list_for_slug(&self, slug: &str) -> Result<Vec<AnalyticsRecord>, AppError> {
        let rows = sqlx::query_as::<_, AnalyticsRow>(
            r#"
            SELECT slug, country, region, city, click_counter, created_at, updated_at
            FROM link_analytics
            WHERE slug = $1
            ORDER BY click_counter DESC, country, region
            "#,
        )
        .bind(slug)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| AnalyticsRecord {
                slug: r.slug,
                country: r.country,
                region: r.region,
                city: r.city,
                click_counter: r.click_counter,
                created_at: r.created_at,
                updated_at: r.updated_at,
            })
            .collect())
    }
}

use chrono::{DateTime, Utc};
use jobscrape_core::error::AppError;
use jobscrape_core::models::{CacheEntry, NewCacheEntry, ScrapedRecord, ValidationHeaders};
use jobscrape_core::traits::CacheStore;
use sqlx::{PgPool, Pool, Postgres};
use uuid::Uuid;

const ENTRY_COLUMNS: &str = "id, url, content, extractor_name, http_status, etag, last_modified, \
     created_at, updated_at, expires_at, hit_count, (expires_at <= NOW()) AS is_expired";

/// Scrape cache persisted in the `scrape_cache` table, one row per URL.
#[derive(Clone)]
pub struct CacheRepository {
    pool: Pool<Postgres>,
    increment_hits: bool,
}

impl CacheRepository {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            increment_hits: true,
        }
    }

    /// Leave `hit_count` untouched on reads.
    pub fn without_hit_counting(mut self) -> Self {
        self.increment_hits = false;
        self
    }

    /// Check database connectivity.
    pub async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;
        Ok(())
    }
}

impl CacheStore for CacheRepository {
    fn is_ready(&self) -> bool {
        !self.pool.is_closed()
    }

    async fn get(&self, url: &str) -> Result<Option<CacheEntry>, AppError> {
        let sql = if self.increment_hits {
            format!(
                "UPDATE scrape_cache SET hit_count = hit_count + 1 WHERE url = $1 RETURNING {ENTRY_COLUMNS}"
            )
        } else {
            format!("SELECT {ENTRY_COLUMNS} FROM scrape_cache WHERE url = $1")
        };

        let row = sqlx::query_as::<_, CacheRow>(&sql)
            .bind(url)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::CacheError(e.to_string()))?;

        row.map(CacheEntry::try_from).transpose()
    }

    async fn set(&self, entry: &NewCacheEntry) -> Result<Uuid, AppError> {
        let now = Utc::now();
        let content = serde_json::to_value(&entry.content)?;

        let row: (Uuid,) = sqlx::query_as(
            r#"
            INSERT INTO scrape_cache
                (url, content, extractor_name, http_status, etag, last_modified,
                 created_at, updated_at, expires_at, hit_count)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $7, $8, 0)
            ON CONFLICT (url) DO UPDATE SET
                content = EXCLUDED.content,
                extractor_name = EXCLUDED.extractor_name,
                http_status = EXCLUDED.http_status,
                etag = EXCLUDED.etag,
                last_modified = EXCLUDED.last_modified,
                updated_at = EXCLUDED.updated_at,
                expires_at = EXCLUDED.expires_at,
                hit_count = 0
            RETURNING id
            "#,
        )
        .bind(&entry.url)
        .bind(&content)
        .bind(&entry.extractor_name)
        .bind(entry.http_status.map(i32::from))
        .bind(&entry.headers.etag)
        .bind(&entry.headers.last_modified)
        .bind(now)
        .bind(entry.expires_at(now))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::CacheError(e.to_string()))?;

        tracing::debug!(url = %entry.url, id = %row.0, "Upserted cache row");
        Ok(row.0)
    }

    async fn delete(&self, url: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM scrape_cache WHERE url = $1")
            .bind(url)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::CacheError(e.to_string()))?;
        Ok(result.rows_affected() > 0)
    }

    async fn purge_expired(&self) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM scrape_cache WHERE expires_at < NOW()")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::CacheError(e.to_string()))?;
        Ok(result.rows_affected())
    }
}

// -- Internal row type for sqlx deserialization --

#[derive(sqlx::FromRow)]
struct CacheRow {
    id: Uuid,
    url: String,
    content: serde_json::Value,
    extractor_name: String,
    http_status: Option<i32>,
    etag: Option<String>,
    last_modified: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    hit_count: i64,
    is_expired: bool,
}

impl TryFrom<CacheRow> for CacheEntry {
    type Error = AppError;

    fn try_from(row: CacheRow) -> Result<Self, Self::Error> {
        let content: ScrapedRecord = serde_json::from_value(row.content)?;
        Ok(CacheEntry {
            id: row.id,
            url: row.url,
            content,
            extractor_name: row.extractor_name,
            http_status: row.http_status.and_then(|s| u16::try_from(s).ok()),
            validation_headers: ValidationHeaders {
                etag: row.etag,
                last_modified: row.last_modified,
            },
            created_at: row.created_at,
            updated_at: row.updated_at,
            expires_at: row.expires_at,
            hit_count: row.hit_count,
            is_expired: row.is_expired,
        })
    }
}

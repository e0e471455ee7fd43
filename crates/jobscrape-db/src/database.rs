use std::time::Duration;

use jobscrape_core::AppError;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use crate::cache_repository::CacheRepository;
use crate::config::DatabaseConfig;

/// Upper bound on waiting for a free pooled connection.
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// Owns the pool behind the persistent scrape cache.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, AppError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect(&config.url)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to connect: {e}")))?;

        tracing::debug!(max_connections = config.max_connections, "Cache database pool ready");
        Ok(Self { pool })
    }

    /// Wrap a pool that is already connected, e.g. one owned by a test container.
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply the `scrape_cache` schema. Safe to call on every startup.
    pub async fn migrate(&self) -> Result<(), AppError> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Cache migration failed: {e}")))?;
        tracing::debug!("Cache schema up to date");
        Ok(())
    }

    pub fn cache_repo(&self) -> CacheRepository {
        CacheRepository::new(self.pool.clone())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

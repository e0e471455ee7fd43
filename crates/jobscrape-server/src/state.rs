use jobscrape_client::ReqwestFetcher;
use jobscrape_core::error::AppError;
use jobscrape_core::models::{CacheEntry, NewCacheEntry};
use jobscrape_core::traits::CacheStore;
use jobscrape_core::{MemoryCache, ScrapeService};
use jobscrape_db::CacheRepository;
use uuid::Uuid;

/// The cache behind the server: Postgres when `DATABASE_URL` is set, in-process otherwise.
#[derive(Clone)]
pub enum CacheBackend {
    Postgres(CacheRepository),
    Memory(MemoryCache),
}

impl CacheBackend {
    pub fn kind(&self) -> &'static str {
        match self {
            CacheBackend::Postgres(_) => "postgres",
            CacheBackend::Memory(_) => "memory",
        }
    }

    /// Round-trip check; the in-process cache is always reachable.
    pub async fn health_check(&self) -> Result<(), AppError> {
        match self {
            CacheBackend::Postgres(repo) => repo.health_check().await,
            CacheBackend::Memory(_) => Ok(()),
        }
    }
}

impl CacheStore for CacheBackend {
    fn is_ready(&self) -> bool {
        match self {
            CacheBackend::Postgres(repo) => repo.is_ready(),
            CacheBackend::Memory(cache) => cache.is_ready(),
        }
    }

    async fn get(&self, url: &str) -> Result<Option<CacheEntry>, AppError> {
        match self {
            CacheBackend::Postgres(repo) => repo.get(url).await,
            CacheBackend::Memory(cache) => cache.get(url).await,
        }
    }

    async fn set(&self, entry: &NewCacheEntry) -> Result<Uuid, AppError> {
        match self {
            CacheBackend::Postgres(repo) => repo.set(entry).await,
            CacheBackend::Memory(cache) => cache.set(entry).await,
        }
    }

    async fn delete(&self, url: &str) -> Result<bool, AppError> {
        match self {
            CacheBackend::Postgres(repo) => repo.delete(url).await,
            CacheBackend::Memory(cache) => cache.delete(url).await,
        }
    }

    async fn purge_expired(&self) -> Result<u64, AppError> {
        match self {
            CacheBackend::Postgres(repo) => repo.purge_expired().await,
            CacheBackend::Memory(cache) => cache.purge_expired().await,
        }
    }
}

pub type AppScrapeService = ScrapeService<ReqwestFetcher, CacheBackend>;

/// Shared application state, available to all route handlers via `State<Arc<AppState>>`.
pub struct AppState {
    pub service: AppScrapeService,
}

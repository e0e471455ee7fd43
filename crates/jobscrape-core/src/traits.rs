use std::future::Future;

use uuid::Uuid;

use crate::error::AppError;
use crate::models::{CacheEntry, FetchedPage, NewCacheEntry, ScrapedRecord};

/// Fetches raw HTML for a URL.
pub trait Fetcher: Send + Sync + Clone {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<FetchedPage, AppError>> + Send;
}

/// Persistent store of prior extraction results keyed by URL.
///
/// When [`is_ready`](Self::is_ready) is false the other operations are no-ops
/// and callers proceed as if no cache exists.
pub trait CacheStore: Send + Sync + Clone {
    /// Whether the backing store is configured and reachable.
    fn is_ready(&self) -> bool;

    /// Look up a URL. Hits bump `hit_count` (when enabled) and carry an
    /// `is_expired` annotation; expired rows are still returned.
    fn get(&self, url: &str) -> impl Future<Output = Result<Option<CacheEntry>, AppError>> + Send;

    /// Upsert by URL, resetting `hit_count` and recomputing `expires_at`.
    fn set(&self, entry: &NewCacheEntry) -> impl Future<Output = Result<Uuid, AppError>> + Send;

    /// Remove a single URL. Returns whether a row was deleted.
    fn delete(&self, url: &str) -> impl Future<Output = Result<bool, AppError>> + Send;

    /// Delete every row whose `expires_at` is in the past.
    fn purge_expired(&self) -> impl Future<Output = Result<u64, AppError>> + Send;
}

/// A URL-scoped strategy that turns one HTML document into a record.
///
/// `extract` parses the document once and backfills missing required fields
/// from the generic logic; validation and normalization happen in the
/// orchestrator.
pub trait Extractor: Send + Sync {
    fn name(&self) -> &str;

    /// True when the URL is well-formed and matches this strategy's patterns.
    fn can_handle(&self, url: &str) -> bool;

    /// True only for the catch-all strategy.
    fn is_fallback(&self) -> bool {
        false
    }

    fn extract(&self, html: &str, url: &str) -> ScrapedRecord;
}

/// A CacheStore that is never ready, for runs without persistence.
#[derive(Debug, Clone)]
pub struct NullCache;

impl CacheStore for NullCache {
    fn is_ready(&self) -> bool {
        false
    }

    async fn get(&self, _url: &str) -> Result<Option<CacheEntry>, AppError> {
        Ok(None)
    }

    async fn set(&self, _entry: &NewCacheEntry) -> Result<Uuid, AppError> {
        Ok(Uuid::nil())
    }

    async fn delete(&self, _url: &str) -> Result<bool, AppError> {
        Ok(false)
    }

    async fn purge_expired(&self) -> Result<u64, AppError> {
        Ok(0)
    }
}

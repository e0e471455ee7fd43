//! In-process [`CacheStore`] backed by moka.
//!
//! Expiry is soft: moka only evicts for capacity, while `expires_at` is
//! compared at read time and rows stay until [`CacheStore::purge_expired`]
//! runs. Used by the server when no database is configured, and in tests.

use std::sync::Arc;

use chrono::Utc;
use moka::future::Cache;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{CacheEntry, NewCacheEntry};
use crate::traits::CacheStore;

const DEFAULT_MAX_ENTRIES: u64 = 10_000;

#[derive(Clone)]
pub struct MemoryCache {
    entries: Cache<String, CacheEntry>,
    /// Serialises read-modify-write of a single entry (hit counting, upserts).
    write_lock: Arc<Mutex<()>>,
    increment_hits: bool,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAX_ENTRIES)
    }

    pub fn with_capacity(max_entries: u64) -> Self {
        Self {
            entries: Cache::builder().max_capacity(max_entries).build(),
            write_lock: Arc::new(Mutex::new(())),
            increment_hits: true,
        }
    }

    /// Leave `hit_count` untouched on reads.
    pub fn without_hit_counting(mut self) -> Self {
        self.increment_hits = false;
        self
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheStore for MemoryCache {
    fn is_ready(&self) -> bool {
        true
    }

    async fn get(&self, url: &str) -> Result<Option<CacheEntry>, AppError> {
        let _guard = self.write_lock.lock().await;
        let Some(mut entry) = self.entries.get(url).await else {
            return Ok(None);
        };

        if self.increment_hits {
            entry.hit_count += 1;
            self.entries.insert(url.to_string(), entry.clone()).await;
        }
        entry.is_expired = entry.is_expired_at(Utc::now());
        Ok(Some(entry))
    }

    async fn set(&self, new: &NewCacheEntry) -> Result<Uuid, AppError> {
        let _guard = self.write_lock.lock().await;
        let now = Utc::now();
        let existing = self.entries.get(&new.url).await;

        let (id, created_at) = existing
            .map(|e| (e.id, e.created_at))
            .unwrap_or_else(|| (Uuid::new_v4(), now));

        let entry = CacheEntry {
            id,
            url: new.url.clone(),
            content: new.content.clone(),
            extractor_name: new.extractor_name.clone(),
            http_status: new.http_status,
            validation_headers: new.headers.clone(),
            created_at,
            updated_at: now,
            expires_at: new.expires_at(now),
            hit_count: 0,
            is_expired: false,
        };
        self.entries.insert(new.url.clone(), entry).await;
        Ok(id)
    }

    async fn delete(&self, url: &str) -> Result<bool, AppError> {
        let _guard = self.write_lock.lock().await;
        Ok(self.entries.remove(url).await.is_some())
    }

    async fn purge_expired(&self) -> Result<u64, AppError> {
        let _guard = self.write_lock.lock().await;
        let now = Utc::now();
        let expired: Vec<Arc<String>> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.expires_at < now)
            .map(|(key, _)| key)
            .collect();

        for key in &expired {
            self.entries.invalidate(key.as_str()).await;
        }
        Ok(expired.len() as u64)
    }
}

//! Test utilities: mock implementations of the core traits.
//!
//! Handwritten mocks for dependency injection in unit tests.
//! All mocks use `Arc<Mutex<_>>` for interior mutability, allowing
//! test assertions on recorded calls.

use std::sync::{Arc, Mutex};

use uuid::Uuid;

use crate::error::AppError;
use crate::models::{CacheEntry, FetchedPage, NewCacheEntry, ScrapedRecord, ValidationHeaders};
use crate::traits::{CacheStore, Extractor, Fetcher};

// ---------------------------------------------------------------------------
// MockFetcher
// ---------------------------------------------------------------------------

/// Mock fetcher that returns queued responses and records requested URLs.
#[derive(Clone)]
pub struct MockFetcher {
    /// Queue of responses. Each call pops the first element.
    /// If empty, returns a default HTML page.
    responses: Arc<Mutex<Vec<Result<String, AppError>>>>,
    pub calls: Arc<Mutex<Vec<String>>>,
}

impl MockFetcher {
    pub fn new(html: &str) -> Self {
        Self::with_responses(vec![Ok(html.to_string())])
    }

    pub fn with_error(error: AppError) -> Self {
        Self::with_responses(vec![Err(error)])
    }

    pub fn with_responses(responses: Vec<Result<String, AppError>>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses)),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl Fetcher for MockFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, AppError> {
        self.calls.lock().unwrap().push(url.to_string());
        let next = {
            let mut responses = self.responses.lock().unwrap();
            if responses.is_empty() {
                Ok("<html><body>default</body></html>".to_string())
            } else {
                responses.remove(0)
            }
        };
        next.map(|html| FetchedPage {
            url: url.to_string(),
            final_url: url.to_string(),
            status: 200,
            html,
            headers: ValidationHeaders {
                etag: Some("\"mock\"".into()),
                last_modified: None,
            },
        })
    }
}

// ---------------------------------------------------------------------------
// FailingCache
// ---------------------------------------------------------------------------

/// Ready cache whose every operation fails.
#[derive(Clone, Default)]
pub struct FailingCache {
    pub set_calls: Arc<Mutex<u32>>,
}

impl CacheStore for FailingCache {
    fn is_ready(&self) -> bool {
        true
    }

    async fn get(&self, _url: &str) -> Result<Option<CacheEntry>, AppError> {
        Err(AppError::CacheError("connection reset".into()))
    }

    async fn set(&self, _entry: &NewCacheEntry) -> Result<Uuid, AppError> {
        *self.set_calls.lock().unwrap() += 1;
        Err(AppError::CacheError("disk full".into()))
    }

    async fn delete(&self, _url: &str) -> Result<bool, AppError> {
        Err(AppError::CacheError("connection reset".into()))
    }

    async fn purge_expired(&self) -> Result<u64, AppError> {
        Err(AppError::CacheError("connection reset".into()))
    }
}

// ---------------------------------------------------------------------------
// StaticExtractor
// ---------------------------------------------------------------------------

/// Extractor that matches a URL substring and returns a fixed record.
///
/// The HTML is ignored, except that `{html}` in the description is replaced
/// by the fetched body so tests can tell fetches apart.
#[derive(Clone)]
pub struct StaticExtractor {
    name: String,
    pattern: Option<String>,
    record: ScrapedRecord,
    pub seen_html: Arc<Mutex<Vec<String>>>,
}

impl StaticExtractor {
    pub fn new(name: &str, pattern: &str) -> Self {
        Self {
            name: name.to_string(),
            pattern: Some(pattern.to_string()),
            record: complete_record(),
            seen_html: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn fallback(name: &str) -> Self {
        Self {
            pattern: None,
            ..Self::new(name, "")
        }
    }

    pub fn returning(mut self, record: ScrapedRecord) -> Self {
        self.record = record;
        self
    }
}

impl Extractor for StaticExtractor {
    fn name(&self) -> &str {
        &self.name
    }

    fn can_handle(&self, url: &str) -> bool {
        match &self.pattern {
            Some(p) => url.to_ascii_lowercase().contains(p.as_str()),
            None => true,
        }
    }

    fn is_fallback(&self) -> bool {
        self.pattern.is_none()
    }

    fn extract(&self, html: &str, _url: &str) -> ScrapedRecord {
        self.seen_html.lock().unwrap().push(html.to_string());
        let mut record = self.record.clone();
        record.description = record.description.replace("{html}", html);
        record
    }
}

// ---------------------------------------------------------------------------
// Test helpers
// ---------------------------------------------------------------------------

/// A record that passes validation.
pub fn complete_record() -> ScrapedRecord {
    ScrapedRecord {
        title: "Senior Rust Engineer".into(),
        company: "Acme Corp".into(),
        description: "Build  reliable\n\n systems.".into(),
        location: Some("Berlin, Germany".into()),
        skills: vec!["Rust".into(), "PostgreSQL".into()],
        ..Default::default()
    }
}

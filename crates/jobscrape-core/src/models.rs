use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::util::collapse_whitespace;

/// Fields that must be non-empty for a record to be returned or cached.
pub const REQUIRED_FIELDS: [&str; 3] = ["title", "company", "description"];

/// A normalized job posting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScrapedRecord {
    pub title: String,
    pub company: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_posted: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    pub source_url: String,
    /// Name of the strategy that produced this record.
    pub extractor_name: String,
    pub keywords: Vec<String>,
    pub skills: Vec<String>,
    pub requirements: Vec<String>,
    pub benefits: Vec<String>,
    pub raw_metadata: BTreeMap<String, serde_json::Value>,
}

impl ScrapedRecord {
    /// Names of required fields that are empty or whitespace-only.
    pub fn missing_required_fields(&self) -> Vec<&'static str> {
        let values = [&self.title, &self.company, &self.description];
        REQUIRED_FIELDS
            .iter()
            .zip(values)
            .filter(|(_, v)| v.trim().is_empty())
            .map(|(name, _)| *name)
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.missing_required_fields().is_empty()
    }

    /// Copy title, company, and description from `other` where ours are empty.
    ///
    /// Only the required fields are backfilled; everything else keeps the
    /// site-specific result even when it is empty.
    pub fn fill_missing_required_from(&mut self, other: &ScrapedRecord) {
        for (ours, theirs) in [
            (&mut self.title, &other.title),
            (&mut self.company, &other.company),
            (&mut self.description, &other.description),
        ] {
            if ours.trim().is_empty() && !theirs.trim().is_empty() {
                ours.clone_from(theirs);
            }
        }
    }

    /// Collapse whitespace in every textual field and drop values left empty.
    pub fn normalize(&mut self) {
        self.title = collapse_whitespace(&self.title);
        self.company = collapse_whitespace(&self.company);
        self.description = collapse_whitespace(&self.description);

        for field in [
            &mut self.location,
            &mut self.salary,
            &mut self.job_type,
            &mut self.date_posted,
            &mut self.industry,
        ] {
            *field = field
                .as_deref()
                .map(collapse_whitespace)
                .filter(|v| !v.is_empty());
        }

        for list in [
            &mut self.keywords,
            &mut self.skills,
            &mut self.requirements,
            &mut self.benefits,
        ] {
            let cleaned: Vec<String> = list
                .iter()
                .map(|item| collapse_whitespace(item))
                .filter(|item| !item.is_empty())
                .collect();
            *list = cleaned;
        }
    }
}

/// Per-request scrape options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScrapeOptions {
    /// Skip both the cache read and the cache write.
    pub bypass_cache: bool,
}

/// HTTP validators captured from the origin response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationHeaders {
    pub etag: Option<String>,
    pub last_modified: Option<String>,
}

/// Result of a successful transport fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    /// URL as requested.
    pub url: String,
    /// URL after redirects.
    pub final_url: String,
    pub status: u16,
    pub html: String,
    pub headers: ValidationHeaders,
}

/// A cached extraction result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheEntry {
    pub id: Uuid,
    pub url: String,
    pub content: ScrapedRecord,
    pub extractor_name: String,
    pub http_status: Option<u16>,
    pub validation_headers: ValidationHeaders,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub hit_count: i64,
    /// Computed at read time; the row itself is never rewritten on expiry.
    pub is_expired: bool,
}

impl CacheEntry {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// DTO for writing a cache entry.
#[derive(Debug, Clone)]
pub struct NewCacheEntry {
    pub url: String,
    pub content: ScrapedRecord,
    pub extractor_name: String,
    pub ttl: Duration,
    pub http_status: Option<u16>,
    pub headers: ValidationHeaders,
}

impl NewCacheEntry {
    /// Expiry for an entry written at `now`.
    pub fn expires_at(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        TimeDelta::from_std(self.ttl)
            .ok()
            .and_then(|ttl| now.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

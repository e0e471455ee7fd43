use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use jobscrape_core::models::ScrapedRecord;
use jobscrape_core::telemetry::TelemetryReport;

// ---------------------------------------------------------------------------
// Scrape
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeRequest {
    /// Absolute http(s) URL of a single job posting.
    pub url: String,
    /// Skip both the cache read and the cache write.
    #[serde(default)]
    pub bypass_cache: bool,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeResponse {
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
    pub extractor_name: String,
    pub keywords: Vec<String>,
    pub skills: Vec<String>,
    pub requirements: Vec<String>,
    pub benefits: Vec<String>,
    #[schema(value_type = Object)]
    pub raw_metadata: BTreeMap<String, serde_json::Value>,
}

impl From<ScrapedRecord> for ScrapeResponse {
    fn from(r: ScrapedRecord) -> Self {
        Self {
            title: r.title,
            company: r.company,
            description: r.description,
            location: r.location,
            salary: r.salary,
            job_type: r.job_type,
            date_posted: r.date_posted,
            industry: r.industry,
            source_url: r.source_url,
            extractor_name: r.extractor_name,
            keywords: r.keywords,
            skills: r.skills,
            requirements: r.requirements,
            benefits: r.benefits,
            raw_metadata: r.raw_metadata,
        }
    }
}

// ---------------------------------------------------------------------------
// Cache
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct PurgeResponse {
    pub purged: u64,
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct CacheUrlQuery {
    /// URL whose cache row should be removed.
    pub url: String,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct DeleteResponse {
    pub deleted: bool,
}

// ---------------------------------------------------------------------------
// Telemetry
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryResponse {
    pub since: DateTime<Utc>,
    pub generated_at: DateTime<Utc>,
    pub extractors: Vec<ExtractorStats>,
    pub cache: CacheStats,
    pub rate_limit: RateLimitStats,
    pub top_domains: Vec<DomainStats>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExtractorStats {
    pub name: String,
    pub count: u64,
    pub error_count: u64,
    pub avg_ms: f64,
    pub min_ms: u64,
    pub max_ms: u64,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub errors: u64,
    pub hit_rate_percent: f64,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitStats {
    pub times_limited: u64,
    pub total_wait_ms: u64,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct DomainStats {
    pub domain: String,
    pub count: u64,
}

impl From<TelemetryReport> for TelemetryResponse {
    fn from(report: TelemetryReport) -> Self {
        Self {
            since: report.since,
            generated_at: report.generated_at,
            extractors: report
                .extractors
                .into_iter()
                .map(|e| ExtractorStats {
                    name: e.name,
                    count: e.count,
                    error_count: e.error_count,
                    avg_ms: e.avg_ms,
                    min_ms: e.min_ms,
                    max_ms: e.max_ms,
                })
                .collect(),
            cache: CacheStats {
                hits: report.cache.hits,
                misses: report.cache.misses,
                errors: report.cache.errors,
                hit_rate_percent: report.cache.hit_rate_percent,
            },
            rate_limit: RateLimitStats {
                times_limited: report.rate_limit.times_limited,
                total_wait_ms: report.rate_limit.total_wait_ms,
            },
            top_domains: report
                .top_domains
                .into_iter()
                .map(|d| DomainStats {
                    domain: d.domain,
                    count: d.count,
                })
                .collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Health & errors
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: &'static str,
    /// `postgres`, `memory`, `error`, or `disabled`.
    pub cache: &'static str,
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    /// Human-readable message.
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    /// Machine-readable code such as `INVALID_URL`.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
}

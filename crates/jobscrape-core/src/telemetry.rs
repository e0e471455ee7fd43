//! Process-wide scrape counters.
//!
//! Counters only move through [`Telemetry::record_scrape`],
//! [`Telemetry::record_cache_access`] and [`Telemetry::record_rate_limit`],
//! and are cleared only by [`Telemetry::reset`]. A poisoned lock is
//! recovered so recording can never fail a scrape.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

const DEFAULT_TOP_DOMAINS: usize = 10;

/// Outcome of a cache lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheAccess {
    Hit,
    Miss,
    Error,
}

#[derive(Debug, Default, Clone)]
struct ExtractorStats {
    count: u64,
    error_count: u64,
    total: Duration,
    min: Option<Duration>,
    max: Duration,
}

#[derive(Debug)]
struct TelemetryInner {
    since: DateTime<Utc>,
    extractors: HashMap<String, ExtractorStats>,
    cache_hits: u64,
    cache_misses: u64,
    cache_errors: u64,
    times_limited: u64,
    total_wait: Duration,
    domains: HashMap<String, u64>,
}

impl TelemetryInner {
    fn new() -> Self {
        Self {
            since: Utc::now(),
            extractors: HashMap::new(),
            cache_hits: 0,
            cache_misses: 0,
            cache_errors: 0,
            times_limited: 0,
            total_wait: Duration::ZERO,
            domains: HashMap::new(),
        }
    }
}

/// Snapshot returned by [`Telemetry::report`].
#[derive(Debug, Clone, Serialize)]
pub struct TelemetryReport {
    pub since: DateTime<Utc>,
    pub generated_at: DateTime<Utc>,
    pub extractors: Vec<ExtractorReport>,
    pub cache: CacheReport,
    pub rate_limit: RateLimitReport,
    pub top_domains: Vec<DomainCount>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExtractorReport {
    pub name: String,
    pub count: u64,
    pub error_count: u64,
    pub total_ms: u64,
    pub avg_ms: f64,
    pub min_ms: u64,
    pub max_ms: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CacheReport {
    pub hits: u64,
    pub misses: u64,
    pub errors: u64,
    pub hit_rate_percent: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RateLimitReport {
    pub times_limited: u64,
    pub total_wait_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DomainCount {
    pub domain: String,
    pub count: u64,
}

/// Shared telemetry handle. Clones record into the same counters.
#[derive(Clone)]
pub struct Telemetry {
    inner: Arc<Mutex<TelemetryInner>>,
    top_domains: usize,
}

impl Telemetry {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(TelemetryInner::new())),
            top_domains: DEFAULT_TOP_DOMAINS,
        }
    }

    /// Limit how many domains [`report`](Self::report) lists.
    pub fn with_top_domains(mut self, n: usize) -> Self {
        self.top_domains = n;
        self
    }

    fn lock_inner(&self) -> MutexGuard<'_, TelemetryInner> {
        self.inner.lock().unwrap_or_else(|poisoned| {
            tracing::warn!("Recovered from poisoned telemetry mutex");
            poisoned.into_inner()
        })
    }

    pub fn record_scrape(
        &self,
        extractor: &str,
        domain: Option<&str>,
        duration: Duration,
        success: bool,
    ) {
        let mut inner = self.lock_inner();
        let stats = inner.extractors.entry(extractor.to_string()).or_default();
        stats.count += 1;
        if !success {
            stats.error_count += 1;
        }
        stats.total += duration;
        stats.min = Some(stats.min.map_or(duration, |m| m.min(duration)));
        stats.max = stats.max.max(duration);

        if let Some(domain) = domain {
            *inner.domains.entry(domain.to_string()).or_insert(0) += 1;
        }
    }

    pub fn record_cache_access(&self, access: CacheAccess) {
        let mut inner = self.lock_inner();
        match access {
            CacheAccess::Hit => inner.cache_hits += 1,
            CacheAccess::Miss => inner.cache_misses += 1,
            CacheAccess::Error => inner.cache_errors += 1,
        }
    }

    pub fn record_rate_limit(&self, wait: Duration) {
        let mut inner = self.lock_inner();
        inner.times_limited += 1;
        inner.total_wait += wait;
    }

    pub fn reset(&self) {
        *self.lock_inner() = TelemetryInner::new();
    }

    pub fn report(&self) -> TelemetryReport {
        let inner = self.lock_inner();

        let mut extractors: Vec<ExtractorReport> = inner
            .extractors
            .iter()
            .map(|(name, s)| ExtractorReport {
                name: name.clone(),
                count: s.count,
                error_count: s.error_count,
                total_ms: s.total.as_millis() as u64,
                avg_ms: if s.count == 0 {
                    0.0
                } else {
                    s.total.as_secs_f64() * 1000.0 / s.count as f64
                },
                min_ms: s.min.unwrap_or_default().as_millis() as u64,
                max_ms: s.max.as_millis() as u64,
            })
            .collect();
        extractors.sort_by(|a, b| a.name.cmp(&b.name));

        let lookups = inner.cache_hits + inner.cache_misses;
        let hit_rate_percent = if lookups == 0 {
            0.0
        } else {
            inner.cache_hits as f64 * 100.0 / lookups as f64
        };

        let mut top_domains: Vec<DomainCount> = inner
            .domains
            .iter()
            .map(|(domain, count)| DomainCount {
                domain: domain.clone(),
                count: *count,
            })
            .collect();
        top_domains.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.domain.cmp(&b.domain)));
        top_domains.truncate(self.top_domains);

        TelemetryReport {
            since: inner.since,
            generated_at: Utc::now(),
            extractors,
            cache: CacheReport {
                hits: inner.cache_hits,
                misses: inner.cache_misses,
                errors: inner.cache_errors,
                hit_rate_percent,
            },
            rate_limit: RateLimitReport {
                times_limited: inner.times_limited,
                total_wait_ms: inner.total_wait.as_millis() as u64,
            },
            top_domains,
        }
    }
}

impl Default for Telemetry {
    fn default() -> Self {
        Self::new()
    }
}

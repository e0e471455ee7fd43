use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::ScraperConfig;
use crate::error::AppError;
use crate::models::{FetchedPage, NewCacheEntry, ScrapeOptions, ScrapedRecord};
use crate::rate_limit::RateLimiter;
use crate::registry::ExtractorRegistry;
use crate::telemetry::{CacheAccess, Telemetry};
use crate::traits::{CacheStore, Extractor, Fetcher};
use crate::util::{host_matches_domain, looks_like_html, parse_http_url, truncate_chars};

/// Characters of raw HTML kept in extraction errors.
const HTML_PREVIEW_CHARS: usize = 500;

/// Orchestrates the scrape pipeline:
/// cache → rate limit → fetch → extract → validate → normalize → cache write.
///
/// Generic over the transport and the cache via traits, so tests run
/// without real HTTP or a database.
pub struct ScrapeService<F, S>
where
    F: Fetcher,
    S: CacheStore,
{
    fetcher: F,
    registry: Arc<ExtractorRegistry>,
    limiter: RateLimiter,
    cache: Option<S>,
    telemetry: Option<Telemetry>,
    cache_ttl: Duration,
    blocked_domains: Vec<String>,
}

impl<F, S> ScrapeService<F, S>
where
    F: Fetcher,
    S: CacheStore,
{
    /// Create a service without cache or telemetry, using default settings.
    pub fn new(fetcher: F, registry: Arc<ExtractorRegistry>, limiter: RateLimiter) -> Self {
        let defaults = ScraperConfig::default();
        Self {
            fetcher,
            registry,
            limiter,
            cache: None,
            telemetry: None,
            cache_ttl: defaults.cache_ttl,
            blocked_domains: defaults.blocked_domains,
        }
    }

    /// Create a service from configuration. The limiter is built from `config.rate_limit`.
    pub fn from_config(fetcher: F, registry: Arc<ExtractorRegistry>, config: &ScraperConfig) -> Self {
        Self::new(fetcher, registry, RateLimiter::new(config.rate_limit.clone()))
            .with_cache_ttl(config.cache_ttl)
            .with_blocked_domains(config.blocked_domains.clone())
    }

    pub fn with_cache(mut self, cache: S) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_telemetry(mut self, telemetry: Telemetry) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn with_blocked_domains(mut self, domains: Vec<String>) -> Self {
        self.blocked_domains = domains;
        self
    }

    pub fn registry(&self) -> &ExtractorRegistry {
        &self.registry
    }

    pub fn telemetry(&self) -> Option<&Telemetry> {
        self.telemetry.as_ref()
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// The cache, only if it is configured and ready.
    pub fn cache(&self) -> Option<&S> {
        self.cache.as_ref().filter(|c| c.is_ready())
    }

    /// Scrape a URL with the best-matching extractor.
    ///
    /// If a site-specific extractor fails, the generic extractor gets one
    /// retry; when both fail, both messages are surfaced.
    pub async fn scrape(&self, url: &str, options: ScrapeOptions) -> Result<ScrapedRecord, AppError> {
        let parsed = parse_http_url(url).ok_or_else(|| {
            AppError::InvalidUrl(format!("'{}' is not an absolute http(s) URL", url.trim()))
        })?;
        self.ensure_supported(parsed.host_str().unwrap_or_default())?;

        let url = parsed.as_str();
        let extractor = self.registry.resolve(url);

        match self.scrape_with(extractor.as_ref(), url, options).await {
            Ok(record) => Ok(record),
            Err(primary) if !extractor.is_fallback() => {
                tracing::warn!(
                    %url,
                    extractor = extractor.name(),
                    error = %primary,
                    "Site extractor failed, retrying with generic extractor"
                );
                let fallback = self.registry.fallback();
                self.scrape_with(fallback.as_ref(), url, options)
                    .await
                    .map_err(|fallback_err| AppError::FallbackFailed {
                        extractor: extractor.name().to_string(),
                        primary: Box::new(primary),
                        fallback: Box::new(fallback_err),
                    })
            }
            Err(e) => Err(e),
        }
    }

    /// Run the full pipeline with one specific extractor.
    pub async fn scrape_with(
        &self,
        extractor: &dyn Extractor,
        url: &str,
        options: ScrapeOptions,
    ) -> Result<ScrapedRecord, AppError> {
        let started = Instant::now();
        let result = self.run_pipeline(extractor, url, options).await;

        if let Some(telemetry) = &self.telemetry {
            let host = parse_http_url(url).and_then(|u| u.host_str().map(str::to_ascii_lowercase));
            telemetry.record_scrape(
                extractor.name(),
                host.as_deref(),
                started.elapsed(),
                result.is_ok(),
            );
        }
        result
    }

    /// Delete expired cache rows. Not called by the scrape path.
    pub async fn purge_expired_cache(&self) -> Result<u64, AppError> {
        match self.cache() {
            Some(cache) => {
                let purged = cache.purge_expired().await?;
                tracing::info!(purged, "Purged expired cache entries");
                Ok(purged)
            }
            None => Ok(0),
        }
    }

    fn ensure_supported(&self, host: &str) -> Result<(), AppError> {
        let host = host.to_ascii_lowercase();
        match self
            .blocked_domains
            .iter()
            .find(|d| host_matches_domain(&host, d))
        {
            Some(domain) => Err(AppError::UnsupportedPlatform {
                domain: domain.clone(),
            }),
            None => Ok(()),
        }
    }

    async fn run_pipeline(
        &self,
        extractor: &dyn Extractor,
        url: &str,
        options: ScrapeOptions,
    ) -> Result<ScrapedRecord, AppError> {
        // 1. Cache
        if !options.bypass_cache {
            if let Some(record) = self.cached_record(url).await {
                return Ok(record);
            }
        }

        // 2. Rate limit + fetch
        if let Some(waited) = self.limiter.wait_for_rate_limit(url).await {
            self.record(|t| t.record_rate_limit(waited));
        }
        tracing::info!(%url, extractor = extractor.name(), "Fetching");
        let page = self.fetcher.fetch(url).await?;
        if page.final_url != url {
            tracing::info!(%url, final_url = %page.final_url, "Followed redirects");
        }
        tracing::info!(status = page.status, bytes = page.html.len(), "Fetched page");

        // 3-5. Parse once, site selectors, generic backfill
        let mut record = extractor.extract(&page.html, url);

        // 6. Validate
        let missing = record.missing_required_fields();
        if !missing.is_empty() {
            return Err(AppError::ExtractionFailed {
                url: url.to_string(),
                missing,
                valid_html: looks_like_html(&page.html),
                html_preview: truncate_chars(&page.html, HTML_PREVIEW_CHARS).to_string(),
            });
        }

        // 7. Normalize
        record.normalize();

        // 8. Stamp + cache
        record.extractor_name = extractor.name().to_string();
        record.source_url = url.to_string();
        tracing::info!(
            extractor = extractor.name(),
            title = %record.title,
            company = %record.company,
            "Extraction complete"
        );

        if !options.bypass_cache {
            self.store(url, &record, extractor.name(), &page).await;
        }

        Ok(record)
    }

    /// Serve a fresh cache entry, counting the access. Failures count as misses.
    async fn cached_record(&self, url: &str) -> Option<ScrapedRecord> {
        let cache = self.cache()?;

        match cache.get(url).await {
            Ok(Some(entry)) if !entry.is_expired => {
                tracing::debug!(%url, hit_count = entry.hit_count, "Cache hit");
                self.record(|t| t.record_cache_access(CacheAccess::Hit));
                Some(entry.content)
            }
            Ok(Some(entry)) => {
                tracing::debug!(%url, expired_at = %entry.expires_at, "Cache entry expired");
                self.record(|t| t.record_cache_access(CacheAccess::Miss));
                None
            }
            Ok(None) => {
                self.record(|t| t.record_cache_access(CacheAccess::Miss));
                None
            }
            Err(e) => {
                tracing::warn!(%url, error = %e, "Cache read failed, fetching instead");
                self.record(|t| t.record_cache_access(CacheAccess::Error));
                None
            }
        }
    }

    /// Best-effort cache write; failures are logged and swallowed.
    async fn store(&self, url: &str, record: &ScrapedRecord, extractor: &str, page: &FetchedPage) {
        let Some(cache) = self.cache() else {
            return;
        };

        let entry = NewCacheEntry {
            url: url.to_string(),
            content: record.clone(),
            extractor_name: extractor.to_string(),
            ttl: self.cache_ttl,
            http_status: Some(page.status),
            headers: page.headers.clone(),
        };

        match cache.set(&entry).await {
            Ok(id) => tracing::debug!(%url, %id, "Cached extraction"),
            Err(e) => {
                tracing::warn!(%url, error = %e, "Cache write failed");
                self.record(|t| t.record_cache_access(CacheAccess::Error));
            }
        }
    }

    fn record(&self, f: impl FnOnce(&Telemetry)) {
        if let Some(telemetry) = &self.telemetry {
            f(telemetry);
        }
    }
}

use std::str::FromStr;
use std::time::Duration;

use crate::error::AppError;
use crate::rate_limit::RateLimitConfig;

/// Platforms that are rejected before any fetch.
pub const DEFAULT_BLOCKED_DOMAINS: &[&str] = &["glassdoor.com"];

/// Transport retry and timeout settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchConfig {
    /// Total attempts, including the first one.
    pub retries: u32,
    /// Base delay; the wait before attempt `n` is `retry_delay * (n - 1)`.
    pub retry_delay: Duration,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            retries: 3,
            retry_delay: Duration::from_millis(1000),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Everything the scrape engine needs besides its collaborators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScraperConfig {
    pub rate_limit: RateLimitConfig,
    pub fetch: FetchConfig,
    pub cache_ttl: Duration,
    pub blocked_domains: Vec<String>,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            rate_limit: RateLimitConfig::default(),
            fetch: FetchConfig::default(),
            cache_ttl: Duration::from_secs(24 * 3600),
            blocked_domains: DEFAULT_BLOCKED_DOMAINS
                .iter()
                .map(|d| d.to_string())
                .collect(),
        }
    }
}

impl ScraperConfig {
    /// Read configuration from environment variables.
    ///
    /// - `JOBSCRAPE_RATE_LIMIT_RPM` (default 10)
    /// - `JOBSCRAPE_RATE_LIMIT_WINDOW_MS` (default 60000)
    /// - `JOBSCRAPE_RATE_LIMIT_PER_DOMAIN` (default true)
    /// - `JOBSCRAPE_CACHE_TTL_HOURS` (default 24)
    /// - `JOBSCRAPE_FETCH_RETRIES` (default 3)
    /// - `JOBSCRAPE_FETCH_RETRY_DELAY_MS` (default 1000)
    /// - `JOBSCRAPE_FETCH_TIMEOUT_SECS` (default 30)
    /// - `JOBSCRAPE_BLOCKED_DOMAINS` (comma-separated, default `glassdoor.com`; empty disables)
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable variable source.
    pub fn from_lookup<L>(lookup: L) -> Result<Self, AppError>
    where
        L: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let requests_per_minute: usize = parse_var(
            &lookup,
            "JOBSCRAPE_RATE_LIMIT_RPM",
            defaults.rate_limit.requests_per_minute,
        )?;
        if requests_per_minute == 0 {
            return Err(AppError::ConfigError(
                "JOBSCRAPE_RATE_LIMIT_RPM must be at least 1".into(),
            ));
        }
        let window_ms: u64 = parse_var(
            &lookup,
            "JOBSCRAPE_RATE_LIMIT_WINDOW_MS",
            defaults.rate_limit.window.as_millis() as u64,
        )?;
        if window_ms == 0 {
            return Err(AppError::ConfigError(
                "JOBSCRAPE_RATE_LIMIT_WINDOW_MS must be at least 1".into(),
            ));
        }
        let per_domain: bool = parse_var(
            &lookup,
            "JOBSCRAPE_RATE_LIMIT_PER_DOMAIN",
            defaults.rate_limit.per_domain,
        )?;

        let ttl_hours: u64 = parse_var(&lookup, "JOBSCRAPE_CACHE_TTL_HOURS", 24)?;
        let ttl_secs = ttl_hours.checked_mul(3600).ok_or_else(|| {
            AppError::ConfigError(format!(
                "JOBSCRAPE_CACHE_TTL_HOURS '{ttl_hours}' is too large"
            ))
        })?;

        let retries: u32 = parse_var(&lookup, "JOBSCRAPE_FETCH_RETRIES", defaults.fetch.retries)?;
        if retries == 0 {
            return Err(AppError::ConfigError(
                "JOBSCRAPE_FETCH_RETRIES must be at least 1".into(),
            ));
        }
        let retry_delay_ms: u64 = parse_var(
            &lookup,
            "JOBSCRAPE_FETCH_RETRY_DELAY_MS",
            defaults.fetch.retry_delay.as_millis() as u64,
        )?;
        let timeout_secs: u64 = parse_var(
            &lookup,
            "JOBSCRAPE_FETCH_TIMEOUT_SECS",
            defaults.fetch.timeout.as_secs(),
        )?;

        let blocked_domains = match lookup("JOBSCRAPE_BLOCKED_DOMAINS") {
            None => defaults.blocked_domains,
            Some(raw) => raw
                .split(',')
                .map(|d| d.trim().to_ascii_lowercase())
                .filter(|d| !d.is_empty())
                .collect(),
        };

        Ok(Self {
            rate_limit: RateLimitConfig {
                requests_per_minute,
                window: Duration::from_millis(window_ms),
                per_domain,
            },
            fetch: FetchConfig {
                retries,
                retry_delay: Duration::from_millis(retry_delay_ms),
                timeout: Duration::from_secs(timeout_secs),
            },
            cache_ttl: Duration::from_secs(ttl_secs),
            blocked_domains,
        })
    }
}

fn parse_var<L, T>(lookup: &L, key: &str, default: T) -> Result<T, AppError>
where
    L: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AppError::ConfigError(format!("Invalid {key} '{raw}'"))),
    }
}

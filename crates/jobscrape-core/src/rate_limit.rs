//! Sliding-window request limiting per target domain.
//!
//! Each key (the URL's host, or a single shared key in global mode) keeps the
//! timestamps of admitted requests. A request is admitted while fewer than
//! `requests_per_minute` timestamps are younger than `window`.
//!
//! Windows live in process memory only. Several processes scraping the same
//! site each enforce their own limit, so the effective rate across a fleet is
//! a multiple of the configured one.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use jobscrape_core::rate_limit::{RateLimitConfig, RateLimiter};
//!
//! # async fn run() {
//! let limiter = RateLimiter::new(RateLimitConfig::new(10, Duration::from_secs(60)));
//! limiter.wait_for_rate_limit("https://www.linkedin.com/jobs/view/1").await;
//! # }
//! ```

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use crate::util::host_of;

/// Key shared by every URL when per-domain limiting is off (and by URLs without a host).
pub const GLOBAL_KEY: &str = "global";

/// Configuration for the rate limiter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Maximum admitted requests per key inside one window.
    pub requests_per_minute: usize,

    /// Width of the sliding window.
    pub window: Duration,

    /// Track each host separately instead of one shared counter.
    pub per_domain: bool,
}

impl RateLimitConfig {
    /// Per-domain limiting with the given budget and window.
    pub fn new(requests_per_minute: usize, window: Duration) -> Self {
        Self {
            requests_per_minute,
            window,
            per_domain: true,
        }
    }

    /// Share one counter across all domains.
    pub fn global(mut self) -> Self {
        self.per_domain = false;
        self
    }
}

impl Default for RateLimitConfig {
    /// 10 requests per 60 s window, per domain.
    fn default() -> Self {
        Self::new(10, Duration::from_secs(60))
    }
}

/// In-memory sliding-window limiter. Clones share state.
#[derive(Clone)]
pub struct RateLimiter {
    config: RateLimitConfig,
    windows: Arc<Mutex<HashMap<String, VecDeque<Instant>>>>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            windows: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    fn key_for(&self, url: &str) -> String {
        if !self.config.per_domain {
            return GLOBAL_KEY.to_string();
        }
        host_of(url).unwrap_or_else(|| GLOBAL_KEY.to_string())
    }

    fn lock_windows(&self) -> MutexGuard<'_, HashMap<String, VecDeque<Instant>>> {
        self.windows.lock().unwrap_or_else(|poisoned| {
            tracing::warn!("Recovered from poisoned rate limiter mutex");
            poisoned.into_inner()
        })
    }

    fn prune(window: &mut VecDeque<Instant>, width: Duration, now: Instant) {
        while let Some(&oldest) = window.front() {
            if now.saturating_duration_since(oldest) >= width {
                window.pop_front();
            } else {
                break;
            }
        }
    }

    /// Check admission for `url` and record it when admitted.
    ///
    /// Returns true (and records nothing) when the key's window is full.
    /// Keys whose windows have fully expired are dropped on every call, so
    /// the map only holds hosts seen within the last window.
    pub fn is_rate_limited(&self, url: &str) -> bool {
        let key = self.key_for(url);
        let now = Instant::now();
        let width = self.config.window;
        let mut windows = self.lock_windows();
        windows.retain(|_, window| {
            Self::prune(window, width, now);
            !window.is_empty()
        });
        let window = windows.entry(key).or_default();

        if window.len() >= self.config.requests_per_minute {
            return true;
        }
        window.push_back(now);
        false
    }

    /// Time until the oldest timestamp leaves the window, or zero when under the limit.
    pub fn time_until_reset(&self, url: &str) -> Duration {
        let key = self.key_for(url);
        let now = Instant::now();
        let mut windows = self.lock_windows();
        let Some(window) = windows.get_mut(&key) else {
            return Duration::ZERO;
        };
        Self::prune(window, self.config.window, now);
        if window.is_empty() {
            windows.remove(&key);
            return Duration::ZERO;
        }

        if window.len() < self.config.requests_per_minute {
            return Duration::ZERO;
        }
        match window.front() {
            Some(&oldest) => (oldest + self.config.window).saturating_duration_since(now),
            None => Duration::ZERO,
        }
    }

    /// Sleep until the key's window has room, if it is full right now.
    ///
    /// Returns `Some(waited)` when the caller was limited. After waking the
    /// admission is re-evaluated exactly once; concurrent callers that woke
    /// at the same instant may all proceed.
    pub async fn wait_for_rate_limit(&self, url: &str) -> Option<Duration> {
        if !self.is_rate_limited(url) {
            return None;
        }

        let wait = self.time_until_reset(url);
        tracing::debug!(
            key = %self.key_for(url),
            wait_ms = %wait.as_millis(),
            "Rate limited, waiting"
        );
        if !wait.is_zero() {
            tokio::time::sleep(wait).await;
        }

        if self.is_rate_limited(url) {
            tracing::debug!(key = %self.key_for(url), "Still limited after wait, proceeding");
        }
        Some(wait)
    }

    /// Number of keys currently holding a non-expired window.
    pub fn tracked_keys(&self) -> usize {
        self.lock_windows().len()
    }

    /// Forget every window.
    pub fn reset(&self) {
        self.lock_windows().clear();
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(RateLimitConfig::default())
    }
}

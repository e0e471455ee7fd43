pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod rate_limit;
pub mod registry;
pub mod scrape;
pub mod telemetry;
pub mod traits;
pub mod util;

#[cfg(test)]
pub(crate) mod testutil;

pub use cache::MemoryCache;
pub use config::{FetchConfig, ScraperConfig};
pub use error::{AppError, ErrorCode};
pub use models::{
    CacheEntry, FetchedPage, NewCacheEntry, ScrapeOptions, ScrapedRecord, ValidationHeaders,
};
pub use rate_limit::{RateLimitConfig, RateLimiter};
pub use registry::ExtractorRegistry;
pub use scrape::ScrapeService;
pub use telemetry::{CacheAccess, Telemetry, TelemetryReport};
pub use traits::{CacheStore, Extractor, Fetcher, NullCache};

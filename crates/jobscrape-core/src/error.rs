use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Machine-readable error code returned to callers alongside the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    InvalidUrl,
    UnsupportedPlatform,
    FetchFailed,
    ExtractionFailed,
    CacheError,
    DatabaseError,
    ConfigError,
    InternalError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::InvalidUrl => "INVALID_URL",
            ErrorCode::UnsupportedPlatform => "UNSUPPORTED_PLATFORM",
            ErrorCode::FetchFailed => "FETCH_FAILED",
            ErrorCode::ExtractionFailed => "EXTRACTION_FAILED",
            ErrorCode::CacheError => "CACHE_ERROR",
            ErrorCode::DatabaseError => "DATABASE_ERROR",
            ErrorCode::ConfigError => "CONFIG_ERROR",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Application-wide error types for jobscrape.
#[derive(Error, Debug)]
pub enum AppError {
    /// Input is not an absolute http(s) URL, or targets a forbidden address.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The URL belongs to a platform we refuse to scrape.
    #[error("Unsupported platform: {domain}")]
    UnsupportedPlatform { domain: String },

    /// The transport exhausted its retry budget.
    #[error("Failed to fetch {url} after {attempts} attempt(s): {message}")]
    FetchFailed {
        url: String,
        message: String,
        technical_details: String,
        attempts: u32,
    },

    /// Required fields were still empty after site and generic extraction.
    #[error("Could not extract {} from {url}", .missing.join(", "))]
    ExtractionFailed {
        url: String,
        missing: Vec<&'static str>,
        valid_html: bool,
        html_preview: String,
    },

    /// A site extractor failed and the generic retry failed too.
    #[error("{extractor} extractor failed: {primary}; generic fallback failed: {fallback}")]
    FallbackFailed {
        extractor: String,
        primary: Box<AppError>,
        fallback: Box<AppError>,
    },

    /// Cache backend failure. Never surfaced by a scrape.
    #[error("Cache error: {0}")]
    CacheError(String),

    /// Database operation failed.
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// Missing or malformed configuration.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// JSON serialization/deserialization failed.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Generic error.
    #[error("{0}")]
    Generic(String),
}

impl AppError {
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::InvalidUrl(_) => ErrorCode::InvalidUrl,
            AppError::UnsupportedPlatform { .. } => ErrorCode::UnsupportedPlatform,
            AppError::FetchFailed { .. } => ErrorCode::FetchFailed,
            AppError::ExtractionFailed { .. } => ErrorCode::ExtractionFailed,
            AppError::FallbackFailed { fallback, .. } => fallback.code(),
            AppError::CacheError(_) => ErrorCode::CacheError,
            AppError::DatabaseError(_) => ErrorCode::DatabaseError,
            AppError::ConfigError(_) => ErrorCode::ConfigError,
            AppError::SerializationError(_) | AppError::Generic(_) => ErrorCode::InternalError,
        }
    }

    /// Human-readable next step for the person who submitted the URL.
    pub fn suggestion(&self) -> &'static str {
        match self {
            AppError::InvalidUrl(_) => {
                "Check that the link is a complete http(s) address, for example https://www.linkedin.com/jobs/view/123456."
            }
            AppError::UnsupportedPlatform { .. } => {
                "This site blocks automated access. Copy the job description from the page and paste it manually."
            }
            AppError::FetchFailed { .. } => {
                "The job site may be down or refusing requests. Wait a minute and retry, or paste the description manually."
            }
            AppError::ExtractionFailed { .. } => {
                "Make sure the link points to a single job posting rather than a search page, or paste the details manually."
            }
            AppError::FallbackFailed { fallback, .. } => fallback.suggestion(),
            AppError::CacheError(_) | AppError::DatabaseError(_) => {
                "Retry the request. Cached results are optional and a fresh fetch will be attempted."
            }
            AppError::ConfigError(_) => "Check the JOBSCRAPE_* and DATABASE_* environment variables.",
            AppError::SerializationError(_) | AppError::Generic(_) => "Try again later.",
        }
    }

    /// Diagnostic detail meant for logs and the `details` field of error bodies.
    pub fn technical_details(&self) -> Option<String> {
        match self {
            AppError::FetchFailed {
                technical_details, ..
            } => Some(technical_details.clone()),
            AppError::ExtractionFailed {
                valid_html,
                html_preview,
                ..
            } => Some(format!("valid_html={valid_html}; preview: {html_preview}")),
            AppError::FallbackFailed {
                primary, fallback, ..
            } => {
                let parts: Vec<String> = [primary.technical_details(), fallback.technical_details()]
                    .into_iter()
                    .flatten()
                    .collect();
                (!parts.is_empty()).then(|| parts.join(" | "))
            }
            _ => None,
        }
    }

    /// Returns true if this error is transient and worth retrying later.
    pub fn is_retryable(&self) -> bool {
        match self {
            AppError::FetchFailed { .. } | AppError::CacheError(_) | AppError::DatabaseError(_) => {
                true
            }
            AppError::FallbackFailed { fallback, .. } => fallback.is_retryable(),
            _ => false,
        }
    }
}

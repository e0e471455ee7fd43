use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "jobscrape API",
        version = "0.1.0",
        description = "Turns job-posting URLs into normalized records with caching and per-domain rate limiting."
    ),
    paths(
        crate::routes::scrape,
        crate::routes::telemetry,
        crate::routes::purge_cache,
        crate::routes::delete_cache_entry,
        crate::routes::health,
    ),
    components(schemas(
        crate::dto::ScrapeRequest,
        crate::dto::ScrapeResponse,
        crate::dto::TelemetryResponse,
        crate::dto::ExtractorStats,
        crate::dto::CacheStats,
        crate::dto::RateLimitStats,
        crate::dto::DomainStats,
        crate::dto::PurgeResponse,
        crate::dto::DeleteResponse,
        crate::dto::HealthResponse,
        crate::dto::ErrorResponse,
    )),
    tags(
        (name = "scrape", description = "Job posting extraction"),
        (name = "cache", description = "Cache maintenance"),
        (name = "system", description = "Health and telemetry"),
    )
)]
pub struct ApiDoc;

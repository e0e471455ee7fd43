use std::sync::Arc;

use axum::Router;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use jobscrape_core::error::AppError;
use jobscrape_core::models::ScrapeOptions;
use jobscrape_core::telemetry::Telemetry;
use jobscrape_core::traits::CacheStore;
use jobscrape_core::util::parse_http_url;

use crate::dto::{
    CacheUrlQuery, DeleteResponse, HealthResponse, PurgeResponse, ScrapeRequest, ScrapeResponse,
    TelemetryResponse,
};
use crate::error::ApiError;
use crate::openapi::ApiDoc;
use crate::state::AppState;

/// Build the full router with all routes.
pub fn router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/v1/scrape", post(scrape))
        .route("/v1/telemetry", get(telemetry))
        .route("/v1/cache/purge", post(purge_cache))
        .route("/v1/cache", delete(delete_cache_entry));

    let public = Router::new()
        .route("/health", get(health))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    public.merge(api).with_state(state)
}

// ---------------------------------------------------------------------------
// Scrape
// ---------------------------------------------------------------------------

#[utoipa::path(
    post,
    path = "/v1/scrape",
    request_body = ScrapeRequest,
    responses(
        (status = 200, description = "Normalized job posting", body = ScrapeResponse),
        (status = 400, description = "Malformed body, or malformed or forbidden URL", body = crate::dto::ErrorResponse),
        (status = 422, description = "Platform not supported", body = crate::dto::ErrorResponse),
        (status = 500, description = "Fetch or extraction failed", body = crate::dto::ErrorResponse),
    ),
    tag = "scrape"
)]
pub async fn scrape(
    State(state): State<Arc<AppState>>,
    body: Result<axum::Json<ScrapeRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let axum::Json(body) = body?;
    let options = ScrapeOptions {
        bypass_cache: body.bypass_cache,
    };
    let record = state.service.scrape(&body.url, options).await?;
    Ok(axum::Json(ScrapeResponse::from(record)))
}

// ---------------------------------------------------------------------------
// Telemetry
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/v1/telemetry",
    responses(
        (status = 200, description = "Counters since startup", body = TelemetryResponse),
    ),
    tag = "system"
)]
pub async fn telemetry(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let report = match state.service.telemetry() {
        Some(telemetry) => telemetry.report(),
        None => Telemetry::new().report(),
    };
    axum::Json(TelemetryResponse::from(report))
}

// ---------------------------------------------------------------------------
// Cache
// ---------------------------------------------------------------------------

#[utoipa::path(
    post,
    path = "/v1/cache/purge",
    responses(
        (status = 200, description = "Expired rows deleted", body = PurgeResponse),
        (status = 500, description = "Cache backend failure", body = crate::dto::ErrorResponse),
    ),
    tag = "cache"
)]
pub async fn purge_cache(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let purged = state.service.purge_expired_cache().await?;
    Ok(axum::Json(PurgeResponse { purged }))
}

#[utoipa::path(
    delete,
    path = "/v1/cache",
    params(CacheUrlQuery),
    responses(
        (status = 200, description = "Whether a row was removed", body = DeleteResponse),
        (status = 400, description = "Malformed URL", body = crate::dto::ErrorResponse),
        (status = 500, description = "Cache backend failure", body = crate::dto::ErrorResponse),
    ),
    tag = "cache"
)]
pub async fn delete_cache_entry(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CacheUrlQuery>,
) -> Result<impl IntoResponse, ApiError> {
    // Rows are keyed by the normalized URL the scrape path stores.
    let url = parse_http_url(&query.url).ok_or_else(|| {
        AppError::InvalidUrl(format!("'{}' is not an absolute http(s) URL", query.url.trim()))
    })?;
    let deleted = match state.service.cache() {
        Some(cache) => cache.delete(url.as_str()).await?,
        None => false,
    };
    Ok(axum::Json(DeleteResponse { deleted }))
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is up; cache may be degraded", body = HealthResponse),
    ),
    tag = "system"
)]
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let cache = match state.service.cache() {
        Some(backend) => match backend.health_check().await {
            Ok(()) => backend.kind(),
            Err(e) => {
                tracing::warn!(error = %e, "Cache health check failed");
                "error"
            }
        },
        None => "disabled",
    };

    let response = HealthResponse {
        status: if cache == "error" { "degraded" } else { "healthy" },
        cache,
    };

    (StatusCode::OK, axum::Json(response))
}

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use jobscrape_client::{ReqwestFetcher, default_registry};
use jobscrape_core::{FetchConfig, MemoryCache, RateLimiter, ScrapeService, Telemetry};
use jobscrape_server::routes;
use jobscrape_server::state::{AppState, CacheBackend};

/// Router backed by the in-memory cache, with fast retries and SSRF checks
/// disabled so requests can reach a local mock server.
pub fn setup_test_app() -> Router {
    let fetcher = ReqwestFetcher::with_config(FetchConfig {
        retries: 2,
        retry_delay: Duration::from_millis(10),
        timeout: Duration::from_secs(5),
    })
    .expect("Failed to build fetcher")
    .allow_private_urls();

    let service = ScrapeService::new(fetcher, Arc::new(default_registry()), RateLimiter::default())
        .with_cache(CacheBackend::Memory(MemoryCache::new()))
        .with_telemetry(Telemetry::new());

    routes::router(Arc::new(AppState { service }))
}

/// Send one request and decode the JSON body.
pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
    (status, json)
}

pub fn scrape_request(body: serde_json::Value) -> Request<Body> {
    Request::post("/v1/scrape")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub const JOB_PAGE: &str = r#"<html><head>
<script type="application/ld+json">
{"@context":"https://schema.org","@type":"JobPosting",
 "title":"Backend Engineer",
 "hiringOrganization":{"@type":"Organization","name":"Acme Corp"},
 "description":"<p>Design   APIs.</p>",
 "employmentType":"FULL_TIME",
 "jobLocation":{"@type":"Place","address":{"addressLocality":"Lisbon","addressCountry":"PT"}}}
</script></head><body><h1>Backend Engineer</h1></body></html>"#;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::integration::common::{JOB_PAGE, scrape_request, send, setup_test_app};

async fn serve(server: &MockServer, route: &str, template: ResponseTemplate, expected: u64) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(template)
        .expect(expected)
        .mount(server)
        .await;
}

#[tokio::test]
async fn health_reports_memory_cache() {
    let app = setup_test_app();

    let (status, json) = send(&app, Request::get("/health").body(Body::empty()).unwrap()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["cache"], "memory");
}

#[tokio::test]
async fn scrape_returns_record_and_caches_it() {
    let server = MockServer::start().await;
    serve(
        &server,
        "/jobs/1",
        ResponseTemplate::new(200).set_body_string(JOB_PAGE),
        1,
    )
    .await;
    let app = setup_test_app();
    let url = format!("{}/jobs/1", server.uri());

    let (status, first) = send(&app, scrape_request(json!({ "url": url }))).await;
    assert_eq!(status, StatusCode::OK, "{first}");
    assert_eq!(first["title"], "Backend Engineer");
    assert_eq!(first["company"], "Acme Corp");
    assert_eq!(first["description"], "Design APIs.");
    assert_eq!(first["jobType"], "Full-time");
    assert_eq!(first["location"], "Lisbon, PT");
    assert_eq!(first["extractorName"], "generic");
    assert_eq!(first["sourceUrl"], url);

    let (status, second) = send(&app, scrape_request(json!({ "url": url }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first, second);
}

#[tokio::test]
async fn bypass_cache_fetches_every_time() {
    let server = MockServer::start().await;
    serve(
        &server,
        "/jobs/2",
        ResponseTemplate::new(200).set_body_string(JOB_PAGE),
        2,
    )
    .await;
    let app = setup_test_app();
    let url = format!("{}/jobs/2", server.uri());

    for _ in 0..2 {
        let (status, _) = send(
            &app,
            scrape_request(json!({ "url": url, "bypassCache": true })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }
}

#[tokio::test]
async fn invalid_url_returns_400() {
    let app = setup_test_app();

    let (status, json) = send(&app, scrape_request(json!({ "url": "not-a-url" }))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["type"], "INVALID_URL");
    assert!(json["error"].as_str().unwrap().contains("not-a-url"));
    assert!(json["suggestion"].is_string());
}

#[tokio::test]
async fn body_without_url_returns_400() {
    let app = setup_test_app();

    let (status, json) = send(&app, scrape_request(json!({ "bypassCache": true }))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["type"], "INVALID_URL");
    assert!(json["error"].as_str().unwrap().contains("url"));
    assert!(json["suggestion"].is_string());
}

#[tokio::test]
async fn non_json_body_returns_400() {
    let app = setup_test_app();

    let (status, json) = send(
        &app,
        Request::post("/v1/scrape")
            .header("content-type", "text/plain")
            .body(Body::from("https://example.com/jobs/1"))
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["type"], "INVALID_URL");
}

#[tokio::test]
async fn blocked_platform_returns_422() {
    let app = setup_test_app();

    let (status, json) = send(
        &app,
        scrape_request(json!({ "url": "https://www.glassdoor.com/job-listing/rust-JV_1.htm" })),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["type"], "UNSUPPORTED_PLATFORM");
}

#[tokio::test]
async fn empty_page_is_extraction_failure() {
    let server = MockServer::start().await;
    serve(
        &server,
        "/jobs/empty",
        ResponseTemplate::new(200).set_body_string("<html><body></body></html>"),
        1,
    )
    .await;
    let app = setup_test_app();

    let (status, json) = send(
        &app,
        scrape_request(json!({ "url": format!("{}/jobs/empty", server.uri()) })),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["type"], "EXTRACTION_FAILED");
    assert!(json["details"].as_str().unwrap().contains("valid_html=true"));
}

#[tokio::test]
async fn upstream_errors_return_fetch_failed() {
    let server = MockServer::start().await;
    serve(&server, "/jobs/down", ResponseTemplate::new(503), 2).await;
    let app = setup_test_app();

    let (status, json) = send(
        &app,
        scrape_request(json!({ "url": format!("{}/jobs/down", server.uri()) })),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["type"], "FETCH_FAILED");
    assert!(json["error"].as_str().unwrap().contains("HTTP 503"));
}

#[tokio::test]
async fn telemetry_counts_scrapes_and_cache() {
    let server = MockServer::start().await;
    serve(
        &server,
        "/jobs/3",
        ResponseTemplate::new(200).set_body_string(JOB_PAGE),
        1,
    )
    .await;
    let app = setup_test_app();
    let url = format!("{}/jobs/3", server.uri());

    send(&app, scrape_request(json!({ "url": url }))).await;
    send(&app, scrape_request(json!({ "url": url }))).await;

    let (status, json) = send(
        &app,
        Request::get("/v1/telemetry").body(Body::empty()).unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["cache"]["hits"], 1);
    assert_eq!(json["cache"]["misses"], 1);
    assert_eq!(json["extractors"][0]["name"], "generic");
    assert_eq!(json["extractors"][0]["count"], 2);
    assert_eq!(json["topDomains"][0]["domain"], "127.0.0.1");
}

#[tokio::test]
async fn purge_and_delete_cache() {
    let server = MockServer::start().await;
    serve(
        &server,
        "/jobs/4",
        ResponseTemplate::new(200).set_body_string(JOB_PAGE),
        1,
    )
    .await;
    let app = setup_test_app();
    let url = format!("{}/jobs/4", server.uri());
    send(&app, scrape_request(json!({ "url": url }))).await;

    let (status, json) = send(
        &app,
        Request::post("/v1/cache/purge").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["purged"], 0);

    let encoded = url.replace(':', "%3A").replace('/', "%2F");
    let (status, json) = send(
        &app,
        Request::delete(format!("/v1/cache?url={encoded}"))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["deleted"], true);
}

#[tokio::test]
async fn swagger_spec_is_served() {
    let app = setup_test_app();

    let (status, json) = send(
        &app,
        Request::get("/api-docs/openapi.json")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(json["paths"]["/v1/scrape"].is_object());
}

#[tokio::test]
async fn delete_matches_the_normalized_url() {
    let server = MockServer::start().await;
    serve(
        &server,
        "/",
        ResponseTemplate::new(200).set_body_string(JOB_PAGE),
        1,
    )
    .await;
    let app = setup_test_app();
    // No trailing slash: the cache stores the normalized form with one.
    let url = server.uri();
    let (status, _) = send(&app, scrape_request(json!({ "url": url }))).await;
    assert_eq!(status, StatusCode::OK);

    let encoded = url.replace(':', "%3A").replace('/', "%2F");
    let (status, json) = send(
        &app,
        Request::delete(format!("/v1/cache?url={encoded}"))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["deleted"], true);

    let (status, json) = send(
        &app,
        Request::delete("/v1/cache?url=not-a-url")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["type"], "INVALID_URL");
}

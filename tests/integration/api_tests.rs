//! HTTP API routes on top of the job registry

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use keyword_crawler::api::{router, ErrorBody};
use keyword_crawler::config::AdmissionConfig;
use keyword_crawler::crawler::{CrawlEngine, EngineConfig, FetchError, HtmlLinkExtractor, PageFetcher};
use keyword_crawler::JobRegistry;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use url::Url;

/// Fetcher that never returns, so jobs stay active
struct StallingFetcher;

#[async_trait]
impl PageFetcher for StallingFetcher {
    async fn fetch(&self, _url: &Url) -> Result<String, FetchError> {
        std::future::pending().await
    }
}

fn registry(max_concurrent_jobs: usize, backlog: usize) -> Arc<JobRegistry> {
    let engine = CrawlEngine::new(
        Arc::new(StallingFetcher),
        Arc::new(HtmlLinkExtractor),
        EngineConfig {
            shutdown_grace: Duration::from_millis(100),
            ..EngineConfig::default()
        },
    );
    Arc::new(JobRegistry::new(
        engine,
        "https://example.com/",
        &AdmissionConfig {
            max_concurrent_jobs,
            backlog,
        },
    ))
}

fn post_crawl(body: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/crawl")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

#[tokio::test]
async fn test_create_then_get_crawl() {
    let registry = registry(4, 4);
    let app = router(Arc::clone(&registry));

    let (status, body) = send(&app, post_crawl(r#"{"keyword":"security"}"#)).await;
    assert_eq!(status, StatusCode::OK);
    let id = body["id"].as_str().unwrap().to_string();
    assert_eq!(id.len(), 8);

    let (status, body) = send(&app, get(&format!("/crawl/{}", id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "id": id, "status": "active", "urls": [] }));

    registry.shutdown().await;

    let (_, body) = send(&app, get(&format!("/crawl/{}", id))).await;
    assert_eq!(body["status"], "done");
}

#[tokio::test]
async fn test_invalid_keyword_is_bad_request() {
    let app = router(registry(4, 4));

    for payload in [r#"{"keyword":"abc"}"#, r#"{"keyword":"   "}"#, r#"{}"#] {
        let (status, body) = send(&app, post_crawl(payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "payload {}", payload);
        let error: ErrorBody = serde_json::from_value(body).unwrap();
        assert_eq!(error.status, 400);
        assert!(error.message.to_lowercase().contains("keyword"));
    }
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let app = router(registry(4, 4));

    let (status, body) = send(&app, post_crawl("not json")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], 400);
}

#[tokio::test]
async fn test_unknown_crawl_is_not_found() {
    let app = router(registry(4, 4));

    let (status, body) = send(&app, get("/crawl/nonexistent")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        body,
        json!({ "status": 404, "message": "No crawl found with id: nonexistent" })
    );
}

#[tokio::test]
async fn test_blank_id_is_bad_request() {
    let app = router(registry(4, 4));

    let (status, _) = send(&app, get("/crawl/%20%20")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_overload_is_rejected() {
    let registry = registry(1, 1);
    let app = router(Arc::clone(&registry));

    let (first, _) = send(&app, post_crawl(r#"{"keyword":"first"}"#)).await;
    let (second, _) = send(&app, post_crawl(r#"{"keyword":"second"}"#)).await;
    let (third, body) = send(&app, post_crawl(r#"{"keyword":"third"}"#)).await;

    assert_eq!(first, StatusCode::OK);
    assert_eq!(second, StatusCode::OK);
    assert_eq!(third, StatusCode::TOO_MANY_REQUESTS);
    assert!(body["message"].as_str().unwrap().contains("overload"));
    assert_eq!(registry.len(), 2);

    registry.shutdown().await;
}

#[tokio::test]
async fn test_health_reports_jobs() {
    let registry = registry(4, 4);
    let app = router(Arc::clone(&registry));

    send(&app, post_crawl(r#"{"keyword":"health"}"#)).await;
    let (status, body) = send(&app, get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok", "jobs": 1 }));

    registry.shutdown().await;
}

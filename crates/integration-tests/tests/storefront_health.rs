//! Health checks and request-id propagation.

#![allow(clippy::unwrap_used)]

use axum::http::{Method, StatusCode};
use little_monsters_integration_tests::TestApp;

#[tokio::test]
async fn test_health_is_ok() {
    let mut app = TestApp::new().await;

    let resp = app.get("/health").await;

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body, "ok");
}

#[tokio::test]
async fn test_request_id_is_generated() {
    let mut app = TestApp::new().await;

    let resp = app.get("/health").await;

    let id = resp
        .headers
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    assert_eq!(id.len(), 36, "expected a UUID, got {id:?}");
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let mut app = TestApp::new().await;

    let resp = app
        .request_with_headers(
            Method::GET,
            "/health",
            None,
            &[("x-request-id", "edge-req-42")],
        )
        .await;

    assert_eq!(
        resp.headers.get("x-request-id").unwrap().to_str().unwrap(),
        "edge-req-42"
    );
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let mut app = TestApp::new().await;

    let resp = app.get("/api/does-not-exist").await;

    assert_eq!(resp.status, StatusCode::NOT_FOUND);
}

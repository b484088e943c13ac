//! Cart API: session persistence, merge-by-id and quantity rules.

#![allow(clippy::unwrap_used)]

use axum::http::{Method, StatusCode};
use serde_json::json;

use little_monsters_integration_tests::TestApp;

async fn app_with_kits() -> TestApp {
    let app = TestApp::new().await;
    app.backend.put_product("kit-mountain", "Mountain Kit", "499");
    app.backend.put_product("kit-beach", "Beach Kit", "250");
    app
}

#[tokio::test]
async fn test_empty_cart() {
    let mut app = TestApp::new().await;

    let resp = app.get("/api/cart").await;

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["items"], json!([]));
    assert_eq!(resp.body["totalItems"], 0);
    assert_eq!(resp.body["totalPrice"], "0");
}

#[tokio::test]
async fn test_add_same_product_merges_lines() {
    let mut app = app_with_kits().await;

    let first = app
        .post("/api/cart/items", json!({ "productId": "kit-mountain" }))
        .await;
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(first.body["message"], "Item added to cart.");
    assert_eq!(first.body["quantity"], 1);
    let trigger = first.headers.get("HX-Trigger").unwrap().to_str().unwrap();
    assert!(trigger.contains("Item added to cart."));

    let second = app
        .post("/api/cart/items", json!({ "productId": "kit-mountain" }))
        .await;
    assert_eq!(second.body["quantity"], 2);

    app.post("/api/cart/items", json!({ "productId": "kit-beach" }))
        .await;

    let cart = app.get("/api/cart").await;
    assert_eq!(cart.body["items"].as_array().unwrap().len(), 2);
    assert_eq!(cart.body["items"][0]["product"]["id"], "kit-mountain");
    assert_eq!(cart.body["items"][0]["quantity"], 2);
    assert_eq!(cart.body["totalItems"], 3);
    assert_eq!(cart.body["totalPrice"], "1248");
    assert_eq!(cart.body["formattedTotal"], "₹1,248");
}

#[tokio::test]
async fn test_cart_is_per_session() {
    let mut app = app_with_kits().await;
    app.post("/api/cart/items", json!({ "productId": "kit-beach" }))
        .await;

    app.switch_shopper("198.51.100.20");
    let cart = app.get("/api/cart").await;

    assert_eq!(cart.body["totalItems"], 0);
}

#[tokio::test]
async fn test_quantity_updates() {
    let mut app = app_with_kits().await;
    app.post("/api/cart/items", json!({ "productId": "kit-beach" }))
        .await;

    let resp = app
        .request(
            Method::PUT,
            "/api/cart/items/kit-beach",
            Some(json!({ "quantity": 4 })),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.headers.get("HX-Trigger").unwrap(), "cart-updated");
    assert_eq!(resp.body["totalItems"], 4);

    let resp = app
        .post("/api/cart/items/kit-beach/increment", json!({}))
        .await;
    assert_eq!(resp.body["items"][0]["quantity"], 5);

    let resp = app
        .post("/api/cart/items/kit-beach/decrement", json!({}))
        .await;
    assert_eq!(resp.body["items"][0]["quantity"], 4);
    assert_eq!(resp.body["totalPrice"], "1000");
}

#[tokio::test]
async fn test_decrement_at_one_removes_line() {
    let mut app = app_with_kits().await;
    app.post("/api/cart/items", json!({ "productId": "kit-beach" }))
        .await;

    let resp = app
        .post("/api/cart/items/kit-beach/decrement", json!({}))
        .await;

    assert_eq!(resp.body["items"], json!([]));
}

#[tokio::test]
async fn test_set_quantity_zero_removes_line() {
    let mut app = app_with_kits().await;
    app.post("/api/cart/items", json!({ "productId": "kit-beach" }))
        .await;

    let resp = app
        .request(
            Method::PUT,
            "/api/cart/items/kit-beach",
            Some(json!({ "quantity": 0 })),
        )
        .await;

    assert_eq!(resp.body["totalItems"], 0);
}

#[tokio::test]
async fn test_remove_then_add_restarts_at_one() {
    let mut app = app_with_kits().await;
    app.post("/api/cart/items", json!({ "productId": "kit-beach" }))
        .await;
    app.post("/api/cart/items", json!({ "productId": "kit-beach" }))
        .await;

    app.request(Method::DELETE, "/api/cart/items/kit-beach", None)
        .await;
    let resp = app
        .post("/api/cart/items", json!({ "productId": "kit-beach" }))
        .await;

    assert_eq!(resp.body["quantity"], 1);
}

#[tokio::test]
async fn test_mutating_absent_line_is_noop() {
    let mut app = app_with_kits().await;
    app.post("/api/cart/items", json!({ "productId": "kit-beach" }))
        .await;

    let resp = app
        .post("/api/cart/items/kit-unknown/increment", json!({}))
        .await;

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["totalItems"], 1);
}

#[tokio::test]
async fn test_clear_cart() {
    let mut app = app_with_kits().await;
    app.post("/api/cart/items", json!({ "productId": "kit-beach" }))
        .await;
    app.post("/api/cart/items", json!({ "productId": "kit-mountain" }))
        .await;

    let resp = app.request(Method::DELETE, "/api/cart", None).await;

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["items"], json!([]));
    assert_eq!(app.get("/api/cart").await.body["totalItems"], 0);
}

#[tokio::test]
async fn test_add_unknown_product_is_404() {
    let mut app = app_with_kits().await;

    let resp = app
        .post("/api/cart/items", json!({ "productId": "kit-nowhere" }))
        .await;

    assert_eq!(resp.status, StatusCode::NOT_FOUND);
    assert_eq!(resp.body["error"], "Product not found: kit-nowhere");
}

#[tokio::test]
async fn test_add_with_backend_down_is_502() {
    let mut app = TestApp::with_config(|config| {
        config.backend.api_url = "http://127.0.0.1:9".to_string();
    })
    .await;

    let resp = app
        .post("/api/cart/items", json!({ "productId": "kit-mountain" }))
        .await;

    assert_eq!(resp.status, StatusCode::BAD_GATEWAY);
    assert_eq!(resp.body["error"], "External service error");
}

//! Checkout: validation, price revalidation, COD and online payment flows.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use serde_json::{Value, json};

use little_monsters_integration_tests::{
    MOCK_ORDER_ID, MOCK_RAZORPAY_ORDER_ID, TestApp, VALID_SIGNATURE,
};

fn customer(payment_method: &str) -> Value {
    json!({
        "name": "Asha Rao",
        "email": "Asha@Example.com",
        "phone": "9999999999",
        "address": "12 Lake Road, Pune",
        "paymentMethod": payment_method
    })
}

async fn app_with_cart() -> TestApp {
    let mut app = TestApp::new().await;
    app.backend.put_product("kit-mountain", "Mountain Kit", "499");
    app.backend.put_product("kit-beach", "Beach Kit", "250");
    app.post("/api/cart/items", json!({ "productId": "kit-mountain" }))
        .await;
    app.post("/api/cart/items", json!({ "productId": "kit-mountain" }))
        .await;
    app.post("/api/cart/items", json!({ "productId": "kit-beach" }))
        .await;
    app
}

#[tokio::test]
async fn test_empty_cart_is_rejected() {
    let mut app = TestApp::new().await;

    let resp = app.post("/api/checkout", customer("cod")).await;

    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.body["error"], "Your cart is empty");
    assert!(app.backend.checkouts().is_empty());
}

#[tokio::test]
async fn test_missing_fields_are_rejected() {
    let mut app = app_with_cart().await;
    let mut form = customer("cod");
    form["address"] = json!("  ");

    let resp = app.post("/api/checkout", form).await;

    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.body["error"], "Address is required");
}

#[tokio::test]
async fn test_cod_checkout_places_order_and_clears_cart() {
    let mut app = app_with_cart().await;

    let resp = app.post("/api/checkout", customer("COD")).await;

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["orderId"], MOCK_ORDER_ID);
    assert_eq!(
        resp.body["transactionId"],
        format!("COD-{MOCK_ORDER_ID}")
    );
    assert_eq!(resp.body["totalPrice"], "1248");

    let sent = app.backend.checkouts();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0]["storeId"], "store_test");
    assert_eq!(sent[0]["paymentMethod"], "cod");
    assert_eq!(sent[0]["email"], "asha@example.com");
    assert_eq!(sent[0]["items"][0]["productId"], "kit-mountain");
    assert_eq!(sent[0]["items"][0]["quantity"], 2);

    assert_eq!(app.get("/api/cart").await.body["totalItems"], 0);
}

#[tokio::test]
async fn test_changed_price_is_refreshed_before_ordering() {
    let mut app = app_with_cart().await;
    app.backend.put_product("kit-beach", "Beach Kit", "300");

    let resp = app.post("/api/checkout", customer("cod")).await;

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["totalPrice"], "1298");
    let sent = app.backend.checkouts();
    assert_eq!(sent[0]["items"][1]["price"], "300");
}

#[tokio::test]
async fn test_withdrawn_product_conflicts_and_is_removed() {
    let mut app = app_with_cart().await;
    app.backend.remove_product("kit-beach");

    let resp = app.post("/api/checkout", customer("cod")).await;

    assert_eq!(resp.status, StatusCode::CONFLICT);
    assert!(
        resp.body["error"]
            .as_str()
            .unwrap()
            .contains("Beach Kit")
    );
    assert!(app.backend.checkouts().is_empty());

    let cart = app.get("/api/cart").await;
    assert_eq!(cart.body["items"].as_array().unwrap().len(), 1);
    assert_eq!(cart.body["totalItems"], 2);

    // Retrying with the cleaned cart goes through
    let retry = app.post("/api/checkout", customer("cod")).await;
    assert_eq!(retry.status, StatusCode::OK);
}

#[tokio::test]
async fn test_online_checkout_then_verify() {
    let mut app = app_with_cart().await;

    let resp = app.post("/api/checkout", customer("online")).await;

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["orderId"], MOCK_ORDER_ID);
    assert_eq!(resp.body["razorpayOrderId"], MOCK_RAZORPAY_ORDER_ID);
    assert_eq!(resp.body["amountInPaise"], 99_800);
    assert_eq!(resp.body["currency"], "INR");
    assert_eq!(resp.body["keyId"], "rzp_test_key");
    assert!(app.backend.checkouts()[0].get("paymentMethod").is_none());

    // Cart survives until payment is verified
    assert_eq!(app.get("/api/cart").await.body["totalItems"], 3);

    let verified = app
        .post(
            "/api/checkout/verify",
            json!({
                "razorpayPaymentId": "pay_123",
                "razorpayOrderId": MOCK_RAZORPAY_ORDER_ID,
                "razorpaySignature": VALID_SIGNATURE,
                "orderId": MOCK_ORDER_ID
            }),
        )
        .await;

    assert_eq!(verified.status, StatusCode::OK);
    assert_eq!(verified.body["success"], true);
    assert_eq!(verified.body["transactionId"], "pay_123");
    assert_eq!(app.get("/api/cart").await.body["totalItems"], 0);
}

#[tokio::test]
async fn test_bad_signature_keeps_cart() {
    let mut app = app_with_cart().await;
    app.post("/api/checkout", customer("online")).await;

    let resp = app
        .post(
            "/api/checkout/verify",
            json!({
                "razorpayPaymentId": "pay_123",
                "razorpayOrderId": MOCK_RAZORPAY_ORDER_ID,
                "razorpaySignature": "forged",
                "orderId": MOCK_ORDER_ID
            }),
        )
        .await;

    assert_eq!(resp.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(resp.body["error"], "Invalid payment signature");
    assert_eq!(app.get("/api/cart").await.body["totalItems"], 3);
}

#[tokio::test]
async fn test_online_checkout_without_gateway_key() {
    let mut app = TestApp::with_config(|config| config.backend.razorpay_key_id = None).await;
    app.backend.put_product("kit-beach", "Beach Kit", "250");
    app.post("/api/cart/items", json!({ "productId": "kit-beach" }))
        .await;

    let resp = app.post("/api/checkout", customer("online")).await;

    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.body["error"], "Online payment is not available");
}

//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                             - Liveness
//! GET    /health/ready                       - Readiness (database ping)
//!
//! # Cart (session-backed)
//! GET    /api/cart                           - Current cart
//! DELETE /api/cart                           - Clear cart
//! POST   /api/cart/items                     - Add one unit ({productId})
//! PUT    /api/cart/items/{productId}         - Set quantity ({quantity})
//! DELETE /api/cart/items/{productId}         - Remove line
//! POST   /api/cart/items/{productId}/increment
//! POST   /api/cart/items/{productId}/decrement
//!
//! # Checkout
//! POST   /api/checkout                       - Place order (COD or online)
//! POST   /api/checkout/verify                - Verify online payment
//!
//! # OTP and orders (strict rate limit on OTP routes, plus per email on verify)
//! POST   /api/send-otp                       - Email a one-time code
//! POST   /api/verify-otp                     - Verify code, mark email verified
//! GET    /api/orders-by-email?email=         - Orders for the verified email
//! POST   /api/cancel-order                   - Cancel a verified customer's order
//! POST   /api/refund-request                 - File a refund for a verified customer's order
//! GET    /api/refund-request?orderId=        - Refund status
//!
//! # Catalog proxy
//! GET    /api/products                       - Product listing (filters as query)
//! GET    /api/products/{id}                  - Product detail
//! GET    /api/categories                     - Category listing
//! GET    /api/categories/{id}                - Category detail
//! GET    /api/filters                        - Filter options
//! ```

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod health;
pub mod orders;
pub mod otp;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::middleware::{api_rate_limiter, otp_rate_limiter};
use crate::state::AppState;

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show).delete(cart::clear))
        .route("/items", post(cart::add))
        .route(
            "/items/{product_id}",
            put(cart::set_quantity).delete(cart::remove),
        )
        .route("/items/{product_id}/increment", post(cart::increment))
        .route("/items/{product_id}/decrement", post(cart::decrement))
}

/// Create the OTP routes router.
pub fn otp_routes(trust_proxy_headers: bool) -> Router<AppState> {
    Router::new()
        .route("/send-otp", post(otp::send_otp))
        .route("/verify-otp", post(otp::verify_otp))
        .layer(otp_rate_limiter(trust_proxy_headers))
}

/// Create the rest of the API under the relaxed rate limit.
pub fn api_routes(trust_proxy_headers: bool) -> Router<AppState> {
    Router::new()
        .nest("/cart", cart_routes())
        .route("/checkout", post(checkout::checkout))
        .route("/checkout/verify", post(checkout::verify_payment))
        .route("/orders-by-email", get(orders::orders_by_email))
        .route("/cancel-order", post(orders::cancel_order))
        .route(
            "/refund-request",
            get(orders::refund_status).post(orders::request_refund),
        )
        .route("/products", get(catalog::list_products))
        .route("/products/{id}", get(catalog::show_product))
        .route("/categories", get(catalog::list_categories))
        .route("/categories/{id}", get(catalog::show_category))
        .route("/filters", get(catalog::filters))
        .layer(api_rate_limiter(trust_proxy_headers))
}

/// Create all routes for the storefront.
///
/// `trust_proxy_headers` selects how rate limits identify clients; see
/// [`ClientIpKeyExtractor`](crate::middleware::rate_limit::ClientIpKeyExtractor).
pub fn routes(trust_proxy_headers: bool) -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest(
            "/api",
            api_routes(trust_proxy_headers).merge(otp_routes(trust_proxy_headers)),
        )
}

//! Admin API client.
//!
//! The admin service owns products, orders, payments and refunds; the
//! storefront only reads the catalog and forwards customer actions.
//!
//! # Architecture
//!
//! - Plain JSON over `reqwest` 0.13
//! - Catalog reads are cached in-process via `moka` (5 minute TTL)
//! - Checkout prices are revalidated with [`BackendClient::get_product_fresh`],
//!   which skips the cache
//! - No retries; a failed call surfaces as [`BackendError`]
//!
//! # Example
//!
//! ```rust,ignore
//! use little_monsters_storefront::backend::{BackendClient, ProductQuery};
//!
//! let client = BackendClient::new(&config.backend);
//! let featured = client.list_products(&ProductQuery::featured()).await?;
//! ```

mod cache;
pub mod types;

pub use cache::AttributeKind;
pub use types::*;

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use reqwest::StatusCode;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, instrument};

use little_monsters_core::{Attribute, Category, CategoryId, OrderId, Product, ProductId};

use crate::config::BackendConfig;
use cache::{CacheKey, CacheValue};

/// Errors that can occur when talking to the admin API.
#[derive(Debug, Error)]
pub enum BackendError {
    /// HTTP request failed before a response arrived.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status with the upstream body text.
    #[error("API error ({status}): {message}")]
    Api { status: StatusCode, message: String },

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The API answered `success: false`.
    #[error("Rejected: {0}")]
    Rejected(String),
}

// =============================================================================
// BackendClient
// =============================================================================

/// Client for the admin API.
///
/// Cheap to clone; clones share the HTTP connection pool and the cache.
#[derive(Clone)]
pub struct BackendClient {
    inner: Arc<BackendClientInner>,
}

struct BackendClientInner {
    client: reqwest::Client,
    base_url: String,
    cache: Cache<CacheKey, CacheValue>,
}

/// Human-readable error text from an API error body.
///
/// JSON bodies yield their `error` or `message` field; HTML pages yield nothing.
fn upstream_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() || trimmed.starts_with('<') {
        return None;
    }
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(trimmed) {
        return ["error", "message"]
            .into_iter()
            .find_map(|key| value.get(key).and_then(serde_json::Value::as_str))
            .map(String::from);
    }
    Some(trimmed.chars().take(200).collect())
}

impl BackendClient {
    /// Create a new admin API client.
    #[must_use]
    pub fn new(config: &BackendConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .unwrap_or_default();

        Self {
            inner: Arc::new(BackendClientInner {
                client,
                base_url: config.api_url.trim_end_matches('/').to_string(),
                cache,
            }),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.inner.base_url)
    }

    /// Turn a response into `T`, mapping error statuses first.
    ///
    /// `what` is the not-found message used when the API gives none.
    async fn read_json<T: DeserializeOwned>(
        response: reqwest::Response,
        what: &str,
    ) -> Result<T, BackendError> {
        let status = response.status();
        let body = response.text().await?;

        if status == StatusCode::NOT_FOUND {
            return Err(BackendError::NotFound(
                upstream_message(&body).unwrap_or_else(|| what.to_string()),
            ));
        }

        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %body.chars().take(500).collect::<String>(),
                "Admin API returned non-success status"
            );
            return Err(BackendError::Api {
                status,
                message: upstream_message(&body).unwrap_or_default(),
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse admin API response"
            );
            BackendError::Parse(e)
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        what: &str,
    ) -> Result<T, BackendError> {
        let mut url = self.url(path);
        for (i, (key, value)) in query.iter().enumerate() {
            url.push(if i == 0 { '?' } else { '&' });
            url.push_str(key);
            url.push('=');
            url.push_str(&urlencoding::encode(value));
        }

        let response = self.inner.client.get(url).send().await?;
        Self::read_json(response, what).await
    }

    async fn send_json<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        method: reqwest::Method,
        path: &str,
        body: &B,
        what: &str,
    ) -> Result<T, BackendError> {
        let response = self
            .inner
            .client
            .request(method, self.url(path))
            .json(body)
            .send()
            .await?;
        Self::read_json(response, what).await
    }

    // =========================================================================
    // Product Methods
    // =========================================================================

    /// List products matching `query`.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn list_products(&self, query: &ProductQuery) -> Result<Vec<Product>, BackendError> {
        let cache_key = CacheKey::Products(query.clone());
        if let Some(CacheValue::Products(products)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for products");
            return Ok(products);
        }

        let products: Vec<Product> = self
            .get_json("products", &query.to_pairs(), "Products not found")
            .await?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Products(products.clone()))
            .await;
        Ok(products)
    }

    /// Get a product by id, served from cache when possible.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::NotFound`] if the product doesn't exist, or an
    /// error if the API request fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_product(&self, id: &ProductId) -> Result<Product, BackendError> {
        let cache_key = CacheKey::Product(id.clone());
        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        self.get_product_fresh(id).await
    }

    /// Get a product by id straight from the API, refreshing the cache.
    ///
    /// # Errors
    ///
    /// Same as [`get_product`](Self::get_product).
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_product_fresh(&self, id: &ProductId) -> Result<Product, BackendError> {
        let what = format!("Product not found: {id}");
        let path = format!("products/{}", urlencoding::encode(id.as_str()));
        // The API answers an unknown id with 200 and a null body.
        let product: Option<Product> = self.get_json(&path, &[], &what).await?;
        let product = product.ok_or(BackendError::NotFound(what))?;

        self.inner
            .cache
            .insert(
                CacheKey::Product(id.clone()),
                CacheValue::Product(Box::new(product.clone())),
            )
            .await;
        Ok(product)
    }

    // =========================================================================
    // Category & Filter Methods
    // =========================================================================

    /// List all categories.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn list_categories(&self) -> Result<Vec<Category>, BackendError> {
        if let Some(CacheValue::Categories(categories)) =
            self.inner.cache.get(&CacheKey::Categories).await
        {
            debug!("Cache hit for categories");
            return Ok(categories);
        }

        let categories: Vec<Category> = self.get_json("categories", &[], "Categories not found").await?;
        self.inner
            .cache
            .insert(
                CacheKey::Categories,
                CacheValue::Categories(categories.clone()),
            )
            .await;
        Ok(categories)
    }

    /// Get a category (with its billboard) by id.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::NotFound`] if the category doesn't exist, or an
    /// error if the API request fails.
    #[instrument(skip(self), fields(category_id = %id))]
    pub async fn get_category(&self, id: &CategoryId) -> Result<Category, BackendError> {
        let cache_key = CacheKey::Category(id.clone());
        if let Some(CacheValue::Category(category)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for category");
            return Ok(*category);
        }

        let what = format!("Category not found: {id}");
        let path = format!("categories/{}", urlencoding::encode(id.as_str()));
        let category: Option<Category> = self.get_json(&path, &[], &what).await?;
        let category = category.ok_or(BackendError::NotFound(what))?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Category(Box::new(category.clone())))
            .await;
        Ok(category)
    }

    async fn list_attributes(&self, kind: AttributeKind) -> Result<Vec<Attribute>, BackendError> {
        let cache_key = CacheKey::Attributes(kind);
        if let Some(CacheValue::Attributes(values)) = self.inner.cache.get(&cache_key).await {
            debug!(kind = kind.path(), "Cache hit for attributes");
            return Ok(values);
        }

        let values: Vec<Attribute> = self.get_json(kind.path(), &[], kind.path()).await?;
        self.inner
            .cache
            .insert(cache_key, CacheValue::Attributes(values.clone()))
            .await;
        Ok(values)
    }

    /// List kit sizes.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    pub async fn list_sizes(&self) -> Result<Vec<Attribute>, BackendError> {
        self.list_attributes(AttributeKind::Size).await
    }

    /// List age ranges.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    pub async fn list_ages(&self) -> Result<Vec<Attribute>, BackendError> {
        self.list_attributes(AttributeKind::Age).await
    }

    /// List trip durations.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    pub async fn list_durations(&self) -> Result<Vec<Attribute>, BackendError> {
        self.list_attributes(AttributeKind::Duration).await
    }

    /// List destinations.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    pub async fn list_destinations(&self) -> Result<Vec<Attribute>, BackendError> {
        self.list_attributes(AttributeKind::Destination).await
    }

    /// All four filter lists, fetched concurrently.
    ///
    /// # Errors
    ///
    /// Returns the first error from any of the four requests.
    #[instrument(skip(self))]
    pub async fn filter_options(&self) -> Result<FilterOptions, BackendError> {
        let (sizes, ages, durations, destinations) = tokio::try_join!(
            self.list_sizes(),
            self.list_ages(),
            self.list_durations(),
            self.list_destinations(),
        )?;

        Ok(FilterOptions {
            sizes,
            ages,
            durations,
            destinations,
        })
    }

    // =========================================================================
    // Checkout & Order Methods
    // =========================================================================

    /// Place an order.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Rejected`] if the API declines the checkout, or
    /// an error if the request fails.
    #[instrument(skip(self, request), fields(items = request.items.len()))]
    pub async fn create_checkout(
        &self,
        request: &CheckoutRequest,
    ) -> Result<CheckoutOrder, BackendError> {
        let response: CheckoutResponse = self
            .send_json(reqwest::Method::POST, "checkout", request, "Store not found")
            .await?;

        match response {
            CheckoutResponse {
                success: true,
                order: Some(order),
                ..
            } => Ok(order),
            CheckoutResponse { error, .. } => Err(BackendError::Rejected(
                error.unwrap_or_else(|| "Failed to create order".to_string()),
            )),
        }
    }

    /// Confirm an online payment with the gateway signature.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Rejected`] if verification fails, or an error if
    /// the request fails.
    #[instrument(skip(self, verification), fields(order_id = %verification.order_id))]
    pub async fn verify_payment(
        &self,
        verification: &PaymentVerification,
    ) -> Result<(), BackendError> {
        let ack: Acknowledgement = self
            .send_json(
                reqwest::Method::POST,
                "verify-payment",
                verification,
                &format!("Order not found: {}", verification.order_id),
            )
            .await?;

        if ack.success {
            Ok(())
        } else {
            Err(BackendError::Rejected(
                ack.error
                    .unwrap_or_else(|| "Payment verification failed".to_string()),
            ))
        }
    }

    /// Mark an order cancelled. Returns the updated order as the API sent it.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the API refuses.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn cancel_order(&self, order_id: &OrderId) -> Result<serde_json::Value, BackendError> {
        let path = format!("orders/{}", urlencoding::encode(order_id.as_str()));
        self.send_json(
            reqwest::Method::PATCH,
            &path,
            &OrderStatusUpdate {
                status: "CANCELLED",
            },
            &format!("Order not found: {order_id}"),
        )
        .await
    }

    // =========================================================================
    // Refund Methods
    // =========================================================================

    /// File a refund request. Returns the API payload unchanged.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the API refuses.
    #[instrument(skip(self, reason), fields(order_id = %order_id))]
    pub async fn create_refund(
        &self,
        order_id: &OrderId,
        reason: &str,
    ) -> Result<serde_json::Value, BackendError> {
        self.send_json(
            reqwest::Method::POST,
            "refunds",
            &RefundRequest { order_id, reason },
            &format!("Order not found: {order_id}"),
        )
        .await
    }

    /// Look up refund requests for an order. Returns the API payload unchanged.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn refund_status(&self, order_id: &OrderId) -> Result<serde_json::Value, BackendError> {
        self.get_json(
            "refunds",
            &[("orderId", order_id.as_str().to_string())],
            &format!("No refund requests for order: {order_id}"),
        )
        .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use little_monsters_core::StoreId;

    use super::*;

    fn client(api_url: &str) -> BackendClient {
        BackendClient::new(&BackendConfig {
            api_url: api_url.to_string(),
            store_id: StoreId::new("store-1"),
            razorpay_key_id: None,
        })
    }

    #[test]
    fn test_url_joins_without_double_slash() {
        let client = client("https://admin.example.com/api/store-1/");
        assert_eq!(
            client.url("products/p1"),
            "https://admin.example.com/api/store-1/products/p1"
        );
    }

    #[test]
    fn test_attribute_paths() {
        assert_eq!(AttributeKind::Size.path(), "sizes");
        assert_eq!(AttributeKind::Age.path(), "ages");
        assert_eq!(AttributeKind::Duration.path(), "durations");
        assert_eq!(AttributeKind::Destination.path(), "destinations");
    }

    #[test]
    fn test_error_display() {
        let err = BackendError::Api {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            message: "Order already shipped".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "API error (422 Unprocessable Entity): Order already shipped"
        );
        assert_eq!(
            BackendError::Rejected("out of stock".to_string()).to_string(),
            "Rejected: out of stock"
        );
    }

    #[test]
    fn test_upstream_message_sources() {
        assert_eq!(
            upstream_message("Order not found").as_deref(),
            Some("Order not found")
        );
        assert_eq!(
            upstream_message(r#"{"error": "Order already shipped"}"#).as_deref(),
            Some("Order already shipped")
        );
        assert_eq!(
            upstream_message(r#"{"message": "Invalid store"}"#).as_deref(),
            Some("Invalid store")
        );
        assert_eq!(upstream_message(r#"{"code": 7}"#), None);
        assert_eq!(upstream_message("<html><body>502</body></html>"), None);
        assert_eq!(upstream_message("   "), None);
        assert_eq!(upstream_message(&"x".repeat(500)).map(|m| m.len()), Some(200));
    }
}

//! Order lookup by customer email.
//!
//! Queries are checked at runtime rather than with `sqlx::query!`: the order
//! tables belong to the admin service's schema, which isn't available to the
//! storefront build.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;

use little_monsters_core::{
    Email, Order, OrderId, OrderItem, OrderItemId, OrderStatus, PaymentMethod, Product, ProductId,
    StoreId,
};

use super::RepositoryError;

/// Read access to placed orders.
///
/// Handlers hold this as a trait object so tests can serve fixed orders
/// without a database.
#[async_trait]
pub trait OrderLookup: Send + Sync {
    /// All orders placed with `email` (normalized before matching), newest
    /// first, each with its items and their products.
    async fn list_by_email(&self, email: &str) -> Result<Vec<Order>, RepositoryError>;

    /// One order with its items, only if it was placed with `email`.
    async fn find_for_email(
        &self,
        order_id: &OrderId,
        email: &str,
    ) -> Result<Option<Order>, RepositoryError>;
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    store_id: StoreId,
    status: String,
    payment_method: String,
    is_paid: bool,
    name: String,
    email: String,
    phone: String,
    address: String,
    created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct OrderItemRow {
    id: OrderItemId,
    order_id: OrderId,
    quantity: i32,
    product_id: ProductId,
    product_name: String,
    product_price: Decimal,
    product_is_featured: bool,
}

/// An order as the "my orders" page shows it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderView {
    #[serde(flatten)]
    pub order: Order,
    pub total: Decimal,
    pub can_cancel: bool,
    /// `None` for cancelled orders.
    pub tracking_step: Option<u8>,
}

impl From<Order> for OrderView {
    fn from(order: Order) -> Self {
        Self {
            total: order.total(),
            can_cancel: order.status.can_cancel(),
            tracking_step: order.status.tracking_step(),
            order,
        }
    }
}

/// Orders for one customer plus the counts shown on the "my orders" page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
    pub orders_count: usize,
    /// Number of order lines across all orders (not units).
    pub products_count: usize,
    pub email: String,
    pub orders: Vec<OrderView>,
}

impl OrderSummary {
    #[must_use]
    pub fn new(email: String, orders: Vec<Order>) -> Self {
        Self {
            orders_count: orders.len(),
            products_count: orders.iter().map(|o| o.order_items.len()).sum(),
            email,
            orders: orders.into_iter().map(OrderView::from).collect(),
        }
    }
}

/// `PostgreSQL` implementation of [`OrderLookup`].
#[derive(Clone)]
pub struct OrderRepository {
    pool: PgPool,
}

impl OrderRepository {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Load the items of `order_rows` and assemble the orders, keeping row order.
    async fn with_items(&self, order_rows: Vec<OrderRow>) -> Result<Vec<Order>, RepositoryError> {
        if order_rows.is_empty() {
            return Ok(Vec::new());
        }

        let order_ids: Vec<OrderId> = order_rows.iter().map(|r| r.id.clone()).collect();
        let item_rows: Vec<OrderItemRow> = sqlx::query_as(
            r#"
            SELECT oi.id, oi."orderId" AS order_id, oi.quantity,
                   p.id AS product_id, p.name AS product_name,
                   p.price AS product_price, p."isFeatured" AS product_is_featured
            FROM "OrderItem" oi
            JOIN "Product" p ON p.id = oi."productId"
            WHERE oi."orderId" = ANY($1)
            ORDER BY oi.id
            "#,
        )
        .bind(&order_ids)
        .fetch_all(&self.pool)
        .await?;

        assemble(order_rows, item_rows)
    }
}

#[async_trait]
impl OrderLookup for OrderRepository {
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    /// Returns `RepositoryError::DataCorruption` if a status column holds an
    /// unknown value.
    async fn list_by_email(&self, email: &str) -> Result<Vec<Order>, RepositoryError> {
        let email = Email::normalize(email);

        let order_rows: Vec<OrderRow> = sqlx::query_as(
            r#"
            SELECT id, "storeId" AS store_id, status::text AS status,
                   "paymentMethod"::text AS payment_method, "isPaid" AS is_paid,
                   name, email, phone, address, "createdAt" AS created_at
            FROM "Order"
            WHERE email = $1
            ORDER BY "createdAt" DESC
            "#,
        )
        .bind(&email)
        .fetch_all(&self.pool)
        .await?;

        self.with_items(order_rows).await
    }

    async fn find_for_email(
        &self,
        order_id: &OrderId,
        email: &str,
    ) -> Result<Option<Order>, RepositoryError> {
        let email = Email::normalize(email);

        let order_row: Option<OrderRow> = sqlx::query_as(
            r#"
            SELECT id, "storeId" AS store_id, status::text AS status,
                   "paymentMethod"::text AS payment_method, "isPaid" AS is_paid,
                   name, email, phone, address, "createdAt" AS created_at
            FROM "Order"
            WHERE id = $1 AND email = $2
            "#,
        )
        .bind(order_id)
        .bind(&email)
        .fetch_optional(&self.pool)
        .await?;

        let orders = self.with_items(order_row.into_iter().collect()).await?;
        Ok(orders.into_iter().next())
    }
}

/// Group item rows under their orders. Orders keep their row order.
fn assemble(
    order_rows: Vec<OrderRow>,
    item_rows: Vec<OrderItemRow>,
) -> Result<Vec<Order>, RepositoryError> {
    let mut items_by_order: HashMap<OrderId, Vec<OrderItem>> = HashMap::new();
    for row in item_rows {
        let (order_id, item) = row.into_item();
        items_by_order.entry(order_id).or_default().push(item);
    }

    order_rows
        .into_iter()
        .map(|row| {
            let items = items_by_order.remove(&row.id).unwrap_or_default();
            row.into_order(items)
        })
        .collect()
}

impl OrderRow {
    fn into_order(self, order_items: Vec<OrderItem>) -> Result<Order, RepositoryError> {
        let status: OrderStatus = self
            .status
            .parse()
            .map_err(|e| RepositoryError::DataCorruption(format!("order {}: {e}", self.id)))?;
        let payment_method: PaymentMethod = self
            .payment_method
            .parse()
            .map_err(|e| RepositoryError::DataCorruption(format!("order {}: {e}", self.id)))?;

        Ok(Order {
            id: self.id,
            store_id: self.store_id,
            status,
            payment_method,
            is_paid: self.is_paid,
            name: self.name,
            email: self.email,
            phone: self.phone,
            address: self.address,
            created_at: self.created_at,
            order_items,
        })
    }
}

impl OrderItemRow {
    fn into_item(self) -> (OrderId, OrderItem) {
        let item = OrderItem {
            id: self.id,
            quantity: u32::try_from(self.quantity).unwrap_or(0),
            product: Product {
                id: self.product_id,
                name: self.product_name,
                price: self.product_price,
                is_featured: self.product_is_featured,
                category: None,
                size: None,
                age: None,
                duration: None,
                destination: None,
                images: Vec::new(),
            },
        };
        (self.order_id, item)
    }
}

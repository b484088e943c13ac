//! Order lookup, cancellation and refund route handlers.

use axum::{
    Json,
    extract::{Query, State},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tower_sessions::Session;
use tracing::instrument;

use little_monsters_core::{Email, Order, OrderId, OrderStatus, RefundId};

use crate::db::OrderSummary;
use crate::error::{AppError, Result};
use crate::models::session_keys;
use crate::services::checkout::required;
use crate::services::email::{EmailLine, OrderCancellation, RefundAcknowledgement, log_delivery};
use crate::state::AppState;

const FALLBACK_CUSTOMER_NAME: &str = "Customer";
const FALLBACK_PRODUCT_NAME: &str = "Product";

// =============================================================================
// Ownership
// =============================================================================

/// The normalized `email`, provided this session verified it with an OTP.
async fn verified_email(session: &Session, email: &str) -> Result<String> {
    let email = Email::normalize(email);
    let verified: Option<String> = session.get(session_keys::VERIFIED_EMAIL).await?;
    if verified.as_deref() == Some(email.as_str()) {
        Ok(email)
    } else {
        Err(AppError::Unauthorized(
            "Verify your email with an OTP first".to_string(),
        ))
    }
}

/// Load an order placed with the session's verified email.
///
/// Orders placed with any other address are reported as missing.
async fn owned_order(
    state: &AppState,
    session: &Session,
    order_id: &OrderId,
    email: &str,
) -> Result<Order> {
    let email = verified_email(session, email).await?;
    state
        .orders()
        .find_for_email(order_id, &email)
        .await?
        .ok_or_else(|| AppError::NotFound("Order not found".to_string()))
}

/// Email lines from the client when it sent any, otherwise from the stored order.
fn email_lines(items: &[LineInput], order: &Order) -> Vec<EmailLine> {
    if items.is_empty() {
        order.order_items.iter().map(EmailLine::from).collect()
    } else {
        items.iter().map(EmailLine::from).collect()
    }
}

// =============================================================================
// Orders by email
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct OrdersQuery {
    #[serde(default)]
    pub email: String,
}

/// Orders for the email verified in this session, newest first.
#[instrument(skip(state, session))]
pub async fn orders_by_email(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<OrdersQuery>,
) -> Result<Json<OrderSummary>> {
    let email = required(&query.email, "Email is required")?;
    let email = verified_email(&session, &email).await?;

    let orders = state.orders().list_by_email(&email).await?;
    tracing::info!(orders = orders.len(), "Orders fetched");

    Ok(Json(OrderSummary::new(email, orders)))
}

// =============================================================================
// Cancellation
// =============================================================================

/// An item as the orders page sends it: either flat or with a nested product.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LineInput {
    pub name: Option<String>,
    pub price: Option<Decimal>,
    pub quantity: Option<u32>,
    pub product: Option<ProductInput>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ProductInput {
    pub name: Option<String>,
    pub price: Option<Decimal>,
}

impl From<&LineInput> for EmailLine {
    fn from(line: &LineInput) -> Self {
        let product = line.product.as_ref();
        let name = line
            .name
            .clone()
            .or_else(|| product.and_then(|p| p.name.clone()))
            .unwrap_or_else(|| FALLBACK_PRODUCT_NAME.to_string());
        let price = line
            .price
            .or_else(|| product.and_then(|p| p.price))
            .unwrap_or_default();
        Self::new(name, price, line.quantity.unwrap_or(1))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelOrderForm {
    #[serde(default)]
    pub order_id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub items: Vec<LineInput>,
    #[serde(default)]
    pub total_amount: Option<Decimal>,
}

#[derive(Debug, Serialize)]
pub struct OrderCancelled {
    pub success: bool,
    pub message: &'static str,
    pub order: Value,
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

/// Why an order in `status` can't be cancelled, if it can't.
const fn cancel_refusal(status: OrderStatus) -> Option<&'static str> {
    if status.can_cancel() {
        return None;
    }
    match status {
        OrderStatus::Delivered => {
            Some("Cannot cancel a delivered order. Please request a refund instead.")
        }
        _ => Some("This order has already been cancelled."),
    }
}

/// Cancel one of the verified customer's orders and email them.
#[instrument(skip(state, session, form), fields(order_id = %form.order_id))]
pub async fn cancel_order(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<CancelOrderForm>,
) -> Result<Json<OrderCancelled>> {
    let order_id = OrderId::new(required(&form.order_id, "Order ID is required")?);
    let email = required(&form.email, "Email is required for verification")?;

    let stored = owned_order(&state, &session, &order_id, &email).await?;
    if let Some(refusal) = cancel_refusal(stored.status) {
        tracing::info!(status = %stored.status, "Cancellation refused");
        return Err(AppError::Conflict(refusal.to_string()));
    }

    let order = state.backend().cancel_order(&order_id).await?;
    tracing::info!("Order cancelled");

    if let Some(mailer) = state.email() {
        let name = non_blank(form.customer_name.as_deref())
            .or_else(|| non_blank(Some(stored.name.as_str())))
            .unwrap_or_else(|| FALLBACK_CUSTOMER_NAME.to_string());
        let notice = OrderCancellation {
            order_id,
            name,
            email,
            reason: non_blank(form.reason.as_deref()),
            items: email_lines(&form.items, &stored),
            total: form
                .total_amount
                .filter(|total| !total.is_zero())
                .or_else(|| Some(stored.total()).filter(|total| !total.is_zero())),
        };
        log_delivery("order_cancelled", mailer.send_order_cancelled(&notice).await);
    }

    Ok(Json(OrderCancelled {
        success: true,
        message: "Order cancelled successfully",
        order,
    }))
}

// =============================================================================
// Refunds
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundForm {
    #[serde(default)]
    pub order_id: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub items: Vec<LineInput>,
    #[serde(default)]
    pub total_amount: Option<Decimal>,
}

/// File a refund request and acknowledge it by email.
///
/// Only orders placed with the session's verified email qualify. Responds
/// with the admin API's payload unchanged.
#[instrument(skip(state, session, form), fields(order_id = %form.order_id))]
pub async fn request_refund(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<RefundForm>,
) -> Result<Json<Value>> {
    let order_id = OrderId::new(required(&form.order_id, "Order ID is required")?);
    let reason = required(&form.reason, "Reason is required")?;
    let email = required(&form.email, "Email is required for verification")?;

    let stored = owned_order(&state, &session, &order_id, &email).await?;

    let refund = state.backend().create_refund(&order_id, &reason).await?;
    tracing::info!("Refund requested");

    if let Some(mailer) = state.email() {
        let refund_id = refund
            .get("id")
            .and_then(Value::as_str)
            .map_or_else(|| RefundId::new(order_id.as_str()), RefundId::new);
        let acknowledgement = RefundAcknowledgement {
            order_id,
            refund_id,
            name: non_blank(form.customer_name.as_deref())
                .or_else(|| non_blank(Some(stored.name.as_str())))
                .unwrap_or_else(|| FALLBACK_CUSTOMER_NAME.to_string()),
            email,
            reason,
            items: email_lines(&form.items, &stored),
            total: form
                .total_amount
                .filter(|total| !total.is_zero())
                .or_else(|| Some(stored.total()).filter(|total| !total.is_zero())),
        };
        log_delivery("refund_requested", mailer.send_refund_requested(&acknowledgement).await);
    }

    Ok(Json(refund))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundStatusQuery {
    #[serde(default)]
    pub order_id: String,
}

/// Refund requests filed for an order.
#[instrument(skip(state))]
pub async fn refund_status(
    State(state): State<AppState>,
    Query(query): Query<RefundStatusQuery>,
) -> Result<Json<Value>> {
    let order_id = OrderId::new(required(&query.order_id, "Order ID is required")?);
    Ok(Json(state.backend().refund_status(&order_id).await?))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_line_input_prefers_flat_fields() {
        let line: LineInput = serde_json::from_value(json!({
            "name": "Beach Kit",
            "price": "250",
            "quantity": 2,
            "product": {"name": "Ignored", "price": "1"}
        }))
        .unwrap();

        let email_line = EmailLine::from(&line);
        assert_eq!(email_line.name, "Beach Kit");
        assert_eq!(email_line.subtotal, "₹500");
    }

    #[test]
    fn test_line_input_falls_back_to_product_then_defaults() {
        let nested: LineInput =
            serde_json::from_value(json!({"product": {"name": "Forest Kit", "price": 120}}))
                .unwrap();
        let email_line = EmailLine::from(&nested);
        assert_eq!(email_line.name, "Forest Kit");
        assert_eq!(email_line.quantity, 1);
        assert_eq!(email_line.price, "₹120");

        let empty = EmailLine::from(&LineInput::default());
        assert_eq!(empty.name, FALLBACK_PRODUCT_NAME);
        assert_eq!(empty.price, "₹0");
    }

    #[test]
    fn test_cancel_form_defaults() {
        let form: CancelOrderForm = serde_json::from_value(json!({"orderId": "ord_1"})).unwrap();
        assert_eq!(form.order_id, "ord_1");
        assert!(form.email.is_empty());
        assert!(form.items.is_empty());
        assert!(form.total_amount.is_none());
    }

    #[test]
    fn test_cancel_refusal_by_status() {
        assert_eq!(cancel_refusal(OrderStatus::Pending), None);
        assert_eq!(cancel_refusal(OrderStatus::Shipped), None);
        assert_eq!(
            cancel_refusal(OrderStatus::Delivered),
            Some("Cannot cancel a delivered order. Please request a refund instead.")
        );
        assert_eq!(
            cancel_refusal(OrderStatus::Cancelled),
            Some("This order has already been cancelled.")
        );
    }

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank(Some("  Asha ")), Some("Asha".to_string()));
        assert_eq!(non_blank(Some("   ")), None);
        assert_eq!(non_blank(None), None);
    }
}

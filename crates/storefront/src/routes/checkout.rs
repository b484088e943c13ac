//! Checkout route handlers.
//!
//! Cash-on-delivery orders are complete once the admin API accepts them.
//! Online orders return the gateway order for the payment widget and are
//! completed by `/api/checkout/verify`.

use axum::{Json, extract::State};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;
use tower_sessions::Session;
use tracing::instrument;

use little_monsters_core::{CartLine, CurrencyCode, OrderId, PaymentMethod};

use crate::backend::{BackendError, CheckoutRequest, CustomerDetails, PaymentVerification};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::models::{PendingOrder, session_keys};
use crate::services::cart::CartStore;
use crate::services::checkout::{CheckoutForm, apply_revalidation, fetch_live_products};
use crate::services::email::{EmailLine, OrderConfirmation, log_delivery};
use crate::state::AppState;

/// Currency of every order.
pub const CURRENCY: &str = CurrencyCode::INR.code();

/// A placed cash-on-delivery order.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CodPlaced {
    pub order_id: OrderId,
    pub transaction_id: String,
    pub total_price: Decimal,
}

/// An online order awaiting payment in the widget.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequired {
    pub order_id: OrderId,
    pub razorpay_order_id: String,
    pub amount_in_paise: u64,
    pub currency: &'static str,
    pub key_id: String,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum CheckoutPlaced {
    Cod(CodPlaced),
    Online(PaymentRequired),
}

/// A verified online payment.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentVerified {
    pub success: bool,
    pub order_id: OrderId,
    pub transaction_id: String,
}

/// Rupees to paise, rounded to the nearest paisa.
fn to_paise(amount: Decimal) -> Option<u64> {
    (amount * Decimal::ONE_HUNDRED).round().to_u64()
}

fn confirmation(
    order_id: OrderId,
    customer: CustomerDetails,
    lines: &[CartLine],
    total: Decimal,
    payment_method: PaymentMethod,
) -> OrderConfirmation {
    OrderConfirmation {
        order_id,
        name: customer.name,
        email: customer.email,
        phone: Some(customer.phone),
        address: Some(customer.address),
        items: lines.iter().map(EmailLine::from).collect(),
        total,
        payment_method,
    }
}

async fn send_confirmation(state: &AppState, order: OrderConfirmation) {
    if let Some(email) = state.email() {
        log_delivery("order_confirmation", email.send_order_confirmation(&order).await);
    }
}

/// Place an order for the session's cart.
#[instrument(skip(state, session, form))]
pub async fn checkout(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<CheckoutForm>,
) -> Result<Json<CheckoutPlaced>> {
    let (customer, payment_method) = form.validate()?;

    let key_id = match payment_method {
        PaymentMethod::Online => Some(
            state
                .config()
                .backend
                .razorpay_key_id
                .clone()
                .ok_or_else(|| {
                    AppError::BadRequest("Online payment is not available".to_string())
                })?,
        ),
        PaymentMethod::Cod => None,
    };

    let mut store = CartStore::load(session.clone()).await?;
    if store.cart().is_empty() {
        return Err(AppError::BadRequest("Your cart is empty".to_string()));
    }

    let live = fetch_live_products(state.backend(), store.cart()).await?;
    let outcome = store.update(|cart| apply_revalidation(cart, live)).await?;
    if outcome.has_removals() {
        tracing::info!(removed = outcome.removed.len(), "Withdrawn products removed at checkout");
        return Err(AppError::Conflict(outcome.conflict_message()));
    }
    if !outcome.refreshed.is_empty() {
        tracing::info!(refreshed = outcome.refreshed.len(), "Cart products refreshed at checkout");
    }

    let lines = store.cart().lines().to_vec();
    let total = store.cart().total_price();
    let request = CheckoutRequest::new(
        state.config().backend.store_id.clone(),
        &lines,
        customer.clone(),
        payment_method,
    );
    let order = state.backend().create_checkout(&request).await?;
    add_breadcrumb("checkout", "Order created", Some(&[("order_id", order.id.as_str())]));

    match (payment_method, key_id) {
        (PaymentMethod::Online, Some(key_id)) => {
            let razorpay_order_id = order.razorpay_order_id.clone().ok_or_else(|| {
                BackendError::Rejected("Payment order was not created".to_string())
            })?;
            let amount_in_paise = match order.amount_in_paise {
                Some(amount) => amount,
                None => to_paise(total)
                    .ok_or_else(|| AppError::Internal(format!("Order total out of range: {total}")))?,
            };

            session
                .insert(
                    session_keys::PENDING_ORDER,
                    PendingOrder {
                        order_id: order.id.clone(),
                        customer,
                        lines,
                        total,
                    },
                )
                .await?;

            Ok(Json(CheckoutPlaced::Online(PaymentRequired {
                order_id: order.id,
                razorpay_order_id,
                amount_in_paise,
                currency: CURRENCY,
                key_id,
            })))
        }
        _ => {
            store.clear().await?;
            send_confirmation(
                &state,
                confirmation(order.id.clone(), customer, &lines, total, PaymentMethod::Cod),
            )
            .await;

            Ok(Json(CheckoutPlaced::Cod(CodPlaced {
                transaction_id: format!("COD-{}", order.id),
                order_id: order.id,
                total_price: total,
            })))
        }
    }
}

/// Confirm an online payment and complete the order.
#[instrument(skip(state, session, verification), fields(order_id = %verification.order_id))]
pub async fn verify_payment(
    State(state): State<AppState>,
    session: Session,
    Json(verification): Json<PaymentVerification>,
) -> Result<Json<PaymentVerified>> {
    state.backend().verify_payment(&verification).await?;

    CartStore::load(session.clone()).await?.clear().await?;

    let pending: Option<PendingOrder> = session.remove(session_keys::PENDING_ORDER).await?;
    match pending {
        Some(pending) if pending.order_id == verification.order_id => {
            send_confirmation(
                &state,
                confirmation(
                    pending.order_id,
                    pending.customer,
                    &pending.lines,
                    pending.total,
                    PaymentMethod::Online,
                ),
            )
            .await;
        }
        _ => tracing::warn!("No pending order in session; confirmation email skipped"),
    }

    Ok(Json(PaymentVerified {
        success: true,
        order_id: verification.order_id,
        transaction_id: verification.razorpay_payment_id,
    }))
}

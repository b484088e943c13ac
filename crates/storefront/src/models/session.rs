//! Session-related types.
//!
//! The session carries the shopper's cart, the email they proved with an
//! OTP, and the details of an online checkout awaiting payment.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use little_monsters_core::{CartLine, OrderId};

use crate::backend::CustomerDetails;

/// An online order created at checkout, kept until the payment is verified
/// so the confirmation email can be sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingOrder {
    pub order_id: OrderId,
    pub customer: CustomerDetails,
    pub lines: Vec<CartLine>,
    pub total: Decimal,
}

/// Session keys.
pub mod keys {
    /// Key for the persisted cart blob.
    pub const CART: &str = little_monsters_core::CART_STORAGE_KEY;

    /// Key for the normalized email proven by the last successful OTP check.
    pub const VERIFIED_EMAIL: &str = "verified_email";

    /// Key for the online order awaiting payment verification.
    pub const PENDING_ORDER: &str = "pending_order";
}

//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `cart` - Session-backed cart store
//! - `checkout` - Price revalidation and checkout form validation
//! - `email` - Transactional emails (OTP, order confirmed/cancelled, refund)

pub mod cart;
pub mod checkout;
pub mod email;

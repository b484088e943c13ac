//! Little Monsters Core - Shared types and client-state logic.
//!
//! This crate provides the types and state machines used by the storefront:
//! - Catalog and order types mirroring the admin API's JSON
//! - The shopping cart reducer and its persisted format
//! - The one-time-password lifecycle used for order lookup
//!
//! # Architecture
//!
//! The core crate contains only types, pure logic and in-memory stores - no
//! network access, no database queries, no HTTP clients. This keeps it
//! lightweight and lets the storefront decide where state is persisted.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, prices, emails, statuses and catalog records
//! - [`cart`] - Cart lines, mutations, totals and rehydration
//! - [`otp`] - OTP issuance and verification over an injectable store

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod otp;
pub mod types;

pub use cart::{CART_STORAGE_KEY, Cart, CartLine};
pub use otp::{MemoryOtpStore, OtpError, OtpLifecycle, OtpRecord, OtpStore};
pub use types::*;

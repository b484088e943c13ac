//! Session-held models for the storefront.

pub mod session;

pub use session::{PendingOrder, keys as session_keys};

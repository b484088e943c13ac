//! Database access for the storefront.
//!
//! # Database
//!
//! The storefront shares the admin service's `PostgreSQL` database. It only
//! reads from the admin-owned tables and writes nothing but its own sessions:
//!
//! ## Tables read
//!
//! - `"Order"` - Orders placed through checkout
//! - `"OrderItem"` - Lines of each order
//! - `"Product"` - Product rows referenced by order items
//!
//! ## Tables owned
//!
//! - `tower_sessions.session` - Session storage, created on startup by the
//!   session store's own migration

pub mod orders;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use orders::{OrderLookup, OrderRepository, OrderSummary, OrderView};

/// Errors from repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

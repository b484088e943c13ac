//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use little_monsters_core::{OtpLifecycle, OtpStore};

use crate::backend::BackendClient;
use crate::config::StorefrontConfig;
use crate::db::{OrderLookup, OrderRepository};
use crate::middleware::EmailAttemptLimiter;
use crate::services::email::{EmailError, EmailService};

/// OTP lifecycle over whichever store the binary was started with.
pub type SharedOtp = OtpLifecycle<Box<dyn OtpStore>>;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: PgPool,
    backend: BackendClient,
    otp: SharedOtp,
    verify_attempts: EmailAttemptLimiter,
    orders: Arc<dyn OrderLookup>,
    email: Option<EmailService>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Storefront configuration
    /// * `pool` - `PostgreSQL` connection pool
    /// * `otp_store` - Where issued OTP codes live. Send-OTP and verify-OTP
    ///   must see the same store, so multi-instance deployments need a shared
    ///   implementation.
    ///
    /// # Errors
    ///
    /// Returns an error if the SMTP transport can't be built from the email
    /// configuration.
    pub fn new(
        config: StorefrontConfig,
        pool: PgPool,
        otp_store: impl OtpStore + 'static,
    ) -> Result<Self, EmailError> {
        let orders = OrderRepository::new(pool.clone());
        Self::with_orders(config, pool, otp_store, orders)
    }

    /// Create application state that reads orders from `orders` instead of
    /// the database.
    ///
    /// # Errors
    ///
    /// Returns an error if the SMTP transport can't be built from the email
    /// configuration.
    pub fn with_orders(
        config: StorefrontConfig,
        pool: PgPool,
        otp_store: impl OtpStore + 'static,
        orders: impl OrderLookup + 'static,
    ) -> Result<Self, EmailError> {
        let backend = BackendClient::new(&config.backend);
        let email = config.email.as_ref().map(EmailService::new).transpose()?;
        if email.is_none() {
            tracing::warn!("Email is disabled or not configured; outbound emails will be skipped");
        }
        let otp_store: Box<dyn OtpStore> = Box::new(otp_store);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                backend,
                otp: OtpLifecycle::new(otp_store),
                verify_attempts: EmailAttemptLimiter::new(),
                orders: Arc::new(orders),
                email,
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the admin API client.
    #[must_use]
    pub fn backend(&self) -> &BackendClient {
        &self.inner.backend
    }

    /// Get a reference to the OTP lifecycle.
    #[must_use]
    pub fn otp(&self) -> &SharedOtp {
        &self.inner.otp
    }

    /// Get the per-email OTP verification limiter.
    #[must_use]
    pub fn verify_attempts(&self) -> &EmailAttemptLimiter {
        &self.inner.verify_attempts
    }

    /// Get the order lookup.
    #[must_use]
    pub fn orders(&self) -> &dyn OrderLookup {
        self.inner.orders.as_ref()
    }

    /// Get the email service, if email is configured.
    #[must_use]
    pub fn email(&self) -> Option<&EmailService> {
        self.inner.email.as_ref()
    }
}

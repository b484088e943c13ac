//! One-time passwords for email-gated order lookup.
//!
//! A shopper asks for a code with their email and name; the code is stored
//! under the normalized email for ten minutes and is good for one successful
//! verification.
//!
//! ```text
//! absent --issue--> issued --verify ok--------> absent (name returned)
//!                     |  \--verify late-------> absent (Expired)
//!                     |  \--verify wrong code--> issued (Mismatch)
//!                     \--issue again-----------> issued (new code)
//! ```
//!
//! Delivering the code is the caller's job; a failed delivery leaves the
//! record verifiable.

mod store;

pub use store::{MemoryOtpStore, OtpRecord, OtpStore};

use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use rand::Rng;

use crate::types::Email;

/// How long an issued code stays valid.
pub const OTP_TTL: TimeDelta = TimeDelta::minutes(10);

/// Smallest code that can be issued.
pub const OTP_MIN: u32 = 100_000;

/// Largest code that can be issued.
pub const OTP_MAX: u32 = 999_999;

/// Why a verification attempt failed.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpError {
    /// No code was issued for this email, or it was already used or expired.
    #[error("OTP not found or expired")]
    NotFound,
    /// The code exists but is past its expiry; it has been discarded.
    #[error("OTP has expired")]
    Expired,
    /// Wrong code. The issued code stays valid.
    #[error("Invalid OTP")]
    Mismatch,
}

/// Issues and verifies codes against an [`OtpStore`].
///
/// Cheap to clone; clones share the same store.
#[derive(Debug)]
pub struct OtpLifecycle<S: OtpStore = MemoryOtpStore> {
    store: Arc<S>,
}

impl<S: OtpStore> Clone for OtpLifecycle<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl Default for OtpLifecycle<MemoryOtpStore> {
    fn default() -> Self {
        Self::new(MemoryOtpStore::new())
    }
}

impl<S: OtpStore> OtpLifecycle<S> {
    #[must_use]
    pub fn new(store: S) -> Self {
        Self {
            store: Arc::new(store),
        }
    }

    /// Access the underlying store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Issue a fresh code for `email`, replacing any earlier one.
    ///
    /// Returns the code so the caller can deliver it.
    pub fn issue(&self, email: &str, name: &str) -> String {
        self.issue_at(email, name, Utc::now())
    }

    /// [`issue`](Self::issue) with an explicit clock reading.
    pub fn issue_at(&self, email: &str, name: &str, now: DateTime<Utc>) -> String {
        let code = generate_code();
        let record = OtpRecord {
            code: code.clone(),
            expires_at: now + OTP_TTL,
            name: name.to_owned(),
        };
        self.store.set(&Email::normalize(email), record);
        code
    }

    /// Check `code` for `email`. On success the code is consumed and the
    /// name given at issue time is returned.
    ///
    /// # Errors
    ///
    /// - [`OtpError::NotFound`] if nothing is stored for the email
    /// - [`OtpError::Expired`] if the code is past its expiry (it is deleted)
    /// - [`OtpError::Mismatch`] if `code` is wrong (the record is kept)
    pub fn verify(&self, email: &str, code: &str) -> Result<String, OtpError> {
        self.verify_at(email, code, Utc::now())
    }

    /// [`verify`](Self::verify) with an explicit clock reading.
    ///
    /// # Errors
    ///
    /// See [`verify`](Self::verify).
    pub fn verify_at(
        &self,
        email: &str,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<String, OtpError> {
        let key = Email::normalize(email);
        let record = self.store.get(&key).ok_or(OtpError::NotFound)?;

        if record.is_expired_at(now) {
            self.store.remove(&key);
            return Err(OtpError::Expired);
        }

        if record.code != code {
            return Err(OtpError::Mismatch);
        }

        self.store.remove(&key);
        Ok(record.name)
    }
}

/// Six-digit code, uniform over `OTP_MIN..=OTP_MAX`.
#[must_use]
pub fn generate_code() -> String {
    rand::rng().random_range(OTP_MIN..=OTP_MAX).to_string()
}

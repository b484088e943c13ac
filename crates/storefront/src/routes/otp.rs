//! OTP route handlers for order lookup.
//!
//! A shopper proves control of an email address by echoing back a code
//! mailed to it. The verified address is kept in the session and is the
//! only address `/api/orders-by-email` will answer for.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use little_monsters_core::Email;

use crate::error::{AppError, Result, add_breadcrumb};
use crate::models::session_keys;
use crate::services::checkout::required;
use crate::services::email::log_delivery;
use crate::state::AppState;

/// Name shown when the stored record carries none.
const DEFAULT_NAME: &str = "Guest";

#[derive(Debug, Deserialize)]
pub struct SendOtpForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OtpSent {
    pub success: bool,
    pub message: &'static str,
    /// Only in demo mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub demo_otp: Option<String>,
}

#[derive(Deserialize)]
pub struct VerifyOtpForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub otp: String,
}

impl std::fmt::Debug for VerifyOtpForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VerifyOtpForm")
            .field("email", &self.email)
            .field("otp", &"[REDACTED]")
            .finish()
    }
}

#[derive(Debug, Serialize)]
pub struct OtpVerified {
    pub success: bool,
    pub message: &'static str,
    pub email: String,
    pub name: String,
}

/// Issue a code and email it.
///
/// Delivery failures are logged; the code stays valid either way.
#[instrument(skip(state, form), fields(email = %form.email.trim()))]
pub async fn send_otp(
    State(state): State<AppState>,
    Json(form): Json<SendOtpForm>,
) -> Result<Json<OtpSent>> {
    let email = required(&form.email, "Email is required")?;
    let name = required(&form.name, "Name is required")?;
    let email = Email::parse(&email)
        .map_err(|e| AppError::BadRequest(format!("Invalid email: {e}")))?;

    let code = state.otp().issue(email.as_str(), &name);
    tracing::info!("OTP issued");

    match state.email() {
        Some(mailer) => log_delivery("otp", mailer.send_otp(email.as_str(), &name, &code).await),
        None => tracing::warn!("Email not configured; OTP not delivered"),
    }

    Ok(Json(OtpSent {
        success: true,
        message: "OTP sent to your email",
        demo_otp: state.config().otp_demo_mode.then_some(code),
    }))
}

/// Check a code and remember the email as verified for this session.
#[instrument(skip(state, session, form), fields(email = %form.email.trim()))]
pub async fn verify_otp(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<VerifyOtpForm>,
) -> Result<Json<OtpVerified>> {
    let email = required(&form.email, "Email is required")?;
    let code = required(&form.otp, "OTP is required")?;

    if !state.verify_attempts().try_attempt(&email) {
        tracing::warn!("OTP verification attempts exhausted");
        return Err(AppError::TooManyRequests(
            "Too many verification attempts. Try again in a minute.".to_string(),
        ));
    }

    let name = state.otp().verify(&email, &code).map_err(|e| {
        tracing::info!(reason = %e, "OTP verification failed");
        AppError::Otp(e)
    })?;

    session
        .insert(session_keys::VERIFIED_EMAIL, Email::normalize(&email))
        .await?;
    add_breadcrumb("otp", "Email verified", None);

    Ok(Json(OtpVerified {
        success: true,
        message: "OTP verified successfully",
        email,
        name: if name.trim().is_empty() {
            DEFAULT_NAME.to_string()
        } else {
            name
        },
    }))
}

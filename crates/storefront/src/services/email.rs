//! Email service for OTP codes and order notifications.
//!
//! Uses SMTP via lettre for delivery with Askama templates (HTML and plain
//! text alternatives). Callers treat delivery as best-effort: see
//! [`log_delivery`].

use askama::Template;
use chrono::Datelike;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use thiserror::Error;

use little_monsters_core::{CartLine, OrderId, OrderItem, PaymentMethod, Price, RefundId};

use crate::config::EmailConfig;

/// Store name used in subjects and the email header.
pub const STORE_NAME: &str = "Little Monsters";

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum EmailError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Template rendering error.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

// =============================================================================
// Email Data
// =============================================================================

/// One row of the item table, with amounts already formatted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailLine {
    pub name: String,
    pub quantity: u32,
    pub price: String,
    pub subtotal: String,
}

impl EmailLine {
    #[must_use]
    pub fn new(name: impl Into<String>, unit_price: Decimal, quantity: u32) -> Self {
        Self {
            name: name.into(),
            quantity,
            price: Price::inr(unit_price).display(),
            subtotal: Price::inr(unit_price * Decimal::from(quantity)).display(),
        }
    }
}

impl From<&CartLine> for EmailLine {
    fn from(line: &CartLine) -> Self {
        Self::new(line.product.name.clone(), line.product.price, line.quantity)
    }
}

impl From<&OrderItem> for EmailLine {
    fn from(item: &OrderItem) -> Self {
        Self::new(item.product.name.clone(), item.product.price, item.quantity)
    }
}

/// Data for the order confirmation email.
#[derive(Debug, Clone)]
pub struct OrderConfirmation {
    pub order_id: OrderId,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub items: Vec<EmailLine>,
    pub total: Decimal,
    pub payment_method: PaymentMethod,
}

/// Data for the order cancelled email.
#[derive(Debug, Clone)]
pub struct OrderCancellation {
    pub order_id: OrderId,
    pub name: String,
    pub email: String,
    pub reason: Option<String>,
    pub items: Vec<EmailLine>,
    pub total: Option<Decimal>,
}

/// Data for the refund request received email.
#[derive(Debug, Clone)]
pub struct RefundAcknowledgement {
    pub order_id: OrderId,
    pub refund_id: RefundId,
    pub name: String,
    pub email: String,
    pub reason: String,
    pub items: Vec<EmailLine>,
    pub total: Option<Decimal>,
}

// =============================================================================
// Subjects
// =============================================================================

/// Subject of the OTP email.
pub const OTP_SUBJECT: &str = "Your OTP for Orders Verification";

#[must_use]
pub fn order_confirmed_subject(order_id: &OrderId) -> String {
    format!("Order Confirmed! #{} - {STORE_NAME}", order_id.short_code())
}

#[must_use]
pub fn order_cancelled_subject(order_id: &OrderId) -> String {
    format!("Order Cancelled #{} - {STORE_NAME}", order_id.short_code())
}

#[must_use]
pub fn refund_requested_subject(refund_id: &RefundId) -> String {
    format!(
        "Refund Request Received #{} - {STORE_NAME}",
        refund_id.short_code()
    )
}

// =============================================================================
// Templates
// =============================================================================

/// Fields shared by every HTML template through the base layout.
struct Layout<'a> {
    store_name: &'a str,
    support_email: &'a str,
    year: i32,
}

#[derive(Template)]
#[template(path = "email/otp_code.html")]
struct OtpCodeHtml<'a> {
    layout: Layout<'a>,
    name: &'a str,
    code: &'a str,
}

#[derive(Template)]
#[template(path = "email/otp_code.txt")]
struct OtpCodeText<'a> {
    name: &'a str,
    code: &'a str,
}

#[derive(Template)]
#[template(path = "email/order_confirmed.html")]
struct OrderConfirmedHtml<'a> {
    layout: Layout<'a>,
    order: &'a OrderConfirmation,
    short_id: String,
    items: &'a [EmailLine],
    total: String,
    is_cod: bool,
}

#[derive(Template)]
#[template(path = "email/order_confirmed.txt")]
struct OrderConfirmedText<'a> {
    order: &'a OrderConfirmation,
    short_id: String,
    items: &'a [EmailLine],
    total: String,
    is_cod: bool,
}

#[derive(Template)]
#[template(path = "email/order_cancelled.html")]
struct OrderCancelledHtml<'a> {
    layout: Layout<'a>,
    order: &'a OrderCancellation,
    short_id: String,
    items: &'a [EmailLine],
    total: Option<String>,
}

#[derive(Template)]
#[template(path = "email/order_cancelled.txt")]
struct OrderCancelledText<'a> {
    order: &'a OrderCancellation,
    short_id: String,
    items: &'a [EmailLine],
    total: Option<String>,
}

#[derive(Template)]
#[template(path = "email/refund_requested.html")]
struct RefundRequestedHtml<'a> {
    layout: Layout<'a>,
    refund: &'a RefundAcknowledgement,
    short_order_id: String,
    short_refund_id: String,
    items: &'a [EmailLine],
    total: Option<String>,
}

#[derive(Template)]
#[template(path = "email/refund_requested.txt")]
struct RefundRequestedText<'a> {
    refund: &'a RefundAcknowledgement,
    short_order_id: String,
    short_refund_id: String,
    items: &'a [EmailLine],
    total: Option<String>,
}

fn format_inr(amount: Decimal) -> String {
    Price::inr(amount).display()
}

// =============================================================================
// EmailService
// =============================================================================

/// Email service for sending transactional emails.
#[derive(Clone)]
pub struct EmailService {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
    support_email: String,
}

impl EmailService {
    /// Create a new email service from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the SMTP relay can't be configured.
    pub fn new(config: &EmailConfig) -> Result<Self, SmtpError> {
        let credentials = Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.expose_secret().to_string(),
        );

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(credentials)
            .build();

        Ok(Self {
            mailer,
            from_address: config.from_address.clone(),
            support_email: config.smtp_username.clone(),
        })
    }

    fn layout(&self) -> Layout<'_> {
        Layout {
            store_name: STORE_NAME,
            support_email: &self.support_email,
            year: chrono::Utc::now().year(),
        }
    }

    /// Send a one-time code for order lookup.
    ///
    /// # Errors
    ///
    /// Returns error if email fails to send or template fails to render.
    pub async fn send_otp(&self, to: &str, name: &str, code: &str) -> Result<(), EmailError> {
        let html = OtpCodeHtml {
            layout: self.layout(),
            name,
            code,
        }
        .render()?;
        let text = OtpCodeText { name, code }.render()?;

        self.send_multipart_email(to, OTP_SUBJECT, &text, &html)
            .await
    }

    /// Send the order confirmation.
    ///
    /// # Errors
    ///
    /// Returns error if email fails to send or template fails to render.
    pub async fn send_order_confirmation(&self, order: &OrderConfirmation) -> Result<(), EmailError> {
        let short_id = order.order_id.short_code();
        let total = format_inr(order.total);
        let is_cod = order.payment_method == PaymentMethod::Cod;

        let html = OrderConfirmedHtml {
            layout: self.layout(),
            order,
            short_id: short_id.clone(),
            items: &order.items,
            total: total.clone(),
            is_cod,
        }
        .render()?;
        let text = OrderConfirmedText {
            order,
            short_id,
            items: &order.items,
            total,
            is_cod,
        }
        .render()?;

        self.send_multipart_email(
            &order.email,
            &order_confirmed_subject(&order.order_id),
            &text,
            &html,
        )
        .await
    }

    /// Send the order cancelled notice.
    ///
    /// # Errors
    ///
    /// Returns error if email fails to send or template fails to render.
    pub async fn send_order_cancelled(&self, order: &OrderCancellation) -> Result<(), EmailError> {
        let short_id = order.order_id.short_code();
        let total = order.total.map(format_inr);

        let html = OrderCancelledHtml {
            layout: self.layout(),
            order,
            short_id: short_id.clone(),
            items: &order.items,
            total: total.clone(),
        }
        .render()?;
        let text = OrderCancelledText {
            order,
            short_id,
            items: &order.items,
            total,
        }
        .render()?;

        self.send_multipart_email(
            &order.email,
            &order_cancelled_subject(&order.order_id),
            &text,
            &html,
        )
        .await
    }

    /// Acknowledge a refund request.
    ///
    /// # Errors
    ///
    /// Returns error if email fails to send or template fails to render.
    pub async fn send_refund_requested(
        &self,
        refund: &RefundAcknowledgement,
    ) -> Result<(), EmailError> {
        let short_order_id = refund.order_id.short_code();
        let short_refund_id = refund.refund_id.short_code();
        let total = refund.total.map(format_inr);

        let html = RefundRequestedHtml {
            layout: self.layout(),
            refund,
            short_order_id: short_order_id.clone(),
            short_refund_id: short_refund_id.clone(),
            items: &refund.items,
            total: total.clone(),
        }
        .render()?;
        let text = RefundRequestedText {
            refund,
            short_order_id,
            short_refund_id,
            items: &refund.items,
            total,
        }
        .render()?;

        self.send_multipart_email(
            &refund.email,
            &refund_requested_subject(&refund.refund_id),
            &text,
            &html,
        )
        .await
    }

    /// Send a multipart email with both plain text and HTML versions.
    async fn send_multipart_email(
        &self,
        to: &str,
        subject: &str,
        text_body: &str,
        html_body: &str,
    ) -> Result<(), EmailError> {
        let email = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| EmailError::InvalidAddress(self.from_address.clone()))?,
            )
            .to(to
                .parse()
                .map_err(|_| EmailError::InvalidAddress(to.to_string()))?)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text_body.to_string()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html_body.to_string()),
                    ),
            )?;

        self.mailer.send(email).await?;

        tracing::info!(to = %to, subject = %subject, "Email sent successfully");
        Ok(())
    }
}

/// Log the outcome of a best-effort send. Never fails the caller.
pub fn log_delivery(kind: &'static str, result: Result<(), EmailError>) {
    if let Err(e) = result {
        tracing::warn!(kind, error = %e, "Failed to send email");
    }
}

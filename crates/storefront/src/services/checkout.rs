//! Checkout orchestration: price revalidation and order placement.
//!
//! The cart keeps its own product copies, so prices can drift from the
//! catalog between add-to-cart and checkout. Before an order is sent to the
//! admin API every line is re-fetched bypassing the cache: withdrawn products
//! are dropped from the cart and changed products replace the stored copy.

use little_monsters_core::{Cart, Email, PaymentMethod, Product, ProductId};

use crate::backend::{BackendClient, BackendError, CustomerDetails};
use crate::error::AppError;

/// What revalidation changed in the cart.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Revalidation {
    /// Products no longer in the catalog, with the name the cart knew them by.
    pub removed: Vec<(ProductId, String)>,
    /// Products whose stored copy differed from the catalog.
    pub refreshed: Vec<ProductId>,
}

impl Revalidation {
    #[must_use]
    pub const fn has_removals(&self) -> bool {
        !self.removed.is_empty()
    }

    /// Message for the 409 response when products were withdrawn.
    #[must_use]
    pub fn conflict_message(&self) -> String {
        let names: Vec<&str> = self.removed.iter().map(|(_, name)| name.as_str()).collect();
        format!(
            "Some items are no longer available and were removed from your cart: {}",
            names.join(", ")
        )
    }
}

/// Fetch the live record of every product in `cart`.
///
/// `None` marks a product the catalog no longer has.
///
/// # Errors
///
/// Returns any backend failure other than not-found.
pub async fn fetch_live_products(
    backend: &BackendClient,
    cart: &Cart,
) -> Result<Vec<(ProductId, Option<Product>)>, BackendError> {
    let mut live = Vec::with_capacity(cart.len());
    for line in cart.lines() {
        let id = line.product.id.clone();
        match backend.get_product_fresh(&id).await {
            Ok(product) => live.push((id, Some(product))),
            Err(BackendError::NotFound(_)) => live.push((id, None)),
            Err(e) => return Err(e),
        }
    }
    Ok(live)
}

/// Reconcile `cart` with live catalog records.
pub fn apply_revalidation(cart: &mut Cart, live: Vec<(ProductId, Option<Product>)>) -> Revalidation {
    let mut outcome = Revalidation::default();

    for (id, product) in live {
        match product {
            None => {
                let name = cart
                    .get(&id)
                    .map(|line| line.product.name.clone())
                    .unwrap_or_else(|| id.to_string());
                cart.remove_item(&id);
                outcome.removed.push((id, name));
            }
            Some(product) => {
                let changed = cart.get(&id).is_some_and(|line| line.product != product);
                if changed && cart.refresh_product(product) {
                    outcome.refreshed.push(id);
                }
            }
        }
    }

    outcome
}

/// Checkout form as posted by the client.
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    /// `"cod"` or `"online"` (any case); defaults to online.
    #[serde(default)]
    pub payment_method: Option<String>,
}

impl CheckoutForm {
    /// Check required fields and normalize the email.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` naming the first problem found.
    pub fn validate(self) -> Result<(CustomerDetails, PaymentMethod), AppError> {
        let name = required(&self.name, "Name is required")?;
        let email = Email::parse(&self.email)
            .map_err(|e| AppError::BadRequest(format!("Invalid email: {e}")))?;
        let phone = required(&self.phone, "Phone is required")?;
        let address = required(&self.address, "Address is required")?;
        let payment_method = match self.payment_method.as_deref().map(str::trim) {
            None | Some("") => PaymentMethod::Online,
            Some(raw) => raw
                .parse()
                .map_err(|e| AppError::BadRequest(format!("{e}")))?,
        };

        Ok((
            CustomerDetails {
                name,
                email: email.into_inner(),
                phone,
                address,
            },
            payment_method,
        ))
    }
}

/// Trimmed value, or a 400 with `message` if blank.
///
/// # Errors
///
/// Returns `AppError::BadRequest(message)` when `value` is blank.
pub fn required(value: &str, message: &str) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(AppError::BadRequest(message.to_string()))
    } else {
        Ok(trimmed.to_string())
    }
}

//! Request and response bodies for the admin API.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use little_monsters_core::{
    Attribute, AttributeId, CartLine, CategoryId, OrderId, PaymentMethod, ProductId, StoreId,
};

/// Catalog filters for `GET /products`.
///
/// Unset fields are left out of the query string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<CategoryId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_id: Option<AttributeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age_id: Option<AttributeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_id: Option<AttributeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_id: Option<AttributeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_featured: Option<bool>,
}

impl ProductQuery {
    /// Featured products only.
    #[must_use]
    pub fn featured() -> Self {
        Self {
            is_featured: Some(true),
            ..Self::default()
        }
    }

    /// Query string pairs in the order the admin API documents them.
    #[must_use]
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        let ids = [
            ("categoryId", self.category_id.as_ref().map(CategoryId::as_str)),
            ("sizeId", self.size_id.as_ref().map(AttributeId::as_str)),
            ("ageId", self.age_id.as_ref().map(AttributeId::as_str)),
            ("durationId", self.duration_id.as_ref().map(AttributeId::as_str)),
            (
                "destinationId",
                self.destination_id.as_ref().map(AttributeId::as_str),
            ),
        ];
        for (key, value) in ids {
            if let Some(value) = value.filter(|v| !v.is_empty()) {
                pairs.push((key, value.to_string()));
            }
        }
        if let Some(featured) = self.is_featured {
            pairs.push(("isFeatured", featured.to_string()));
        }
        pairs
    }
}

/// All filter attribute lists, fetched together for the category page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterOptions {
    pub sizes: Vec<Attribute>,
    pub ages: Vec<Attribute>,
    pub durations: Vec<Attribute>,
    pub destinations: Vec<Attribute>,
}

/// `POST /checkout` body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub store_id: StoreId,
    pub items: Vec<CheckoutItem>,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    /// `"cod"` for cash on delivery; absent for online payment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<&'static str>,
}

impl CheckoutRequest {
    /// Build a checkout for the given cart lines.
    #[must_use]
    pub fn new(
        store_id: StoreId,
        lines: &[CartLine],
        customer: CustomerDetails,
        payment_method: PaymentMethod,
    ) -> Self {
        Self {
            store_id,
            items: lines.iter().map(CheckoutItem::from).collect(),
            name: customer.name,
            email: customer.email,
            phone: customer.phone,
            address: customer.address,
            payment_method: match payment_method {
                PaymentMethod::Cod => Some("cod"),
                PaymentMethod::Online => None,
            },
        }
    }
}

/// Contact and delivery details collected on the checkout form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerDetails {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
}

/// One cart line as the admin API expects it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutItem {
    pub product_id: ProductId,
    pub name: String,
    pub price: Decimal,
    pub quantity: u32,
}

impl From<&CartLine> for CheckoutItem {
    fn from(line: &CartLine) -> Self {
        Self {
            product_id: line.product.id.clone(),
            name: line.product.name.clone(),
            price: line.product.price,
            quantity: line.quantity,
        }
    }
}

/// `POST /checkout` response.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutResponse {
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub order: Option<CheckoutOrder>,
}

/// The order created by a checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutOrder {
    pub id: OrderId,
    /// Present for online payments.
    #[serde(default)]
    pub amount_in_paise: Option<u64>,
    /// Present for online payments.
    #[serde(default)]
    pub razorpay_order_id: Option<String>,
}

/// `POST /verify-payment` body. The gateway fields keep Razorpay's snake_case
/// names on the wire; the camelCase aliases accept the storefront client's form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentVerification {
    #[serde(alias = "razorpayPaymentId")]
    pub razorpay_payment_id: String,
    #[serde(alias = "razorpayOrderId")]
    pub razorpay_order_id: String,
    #[serde(alias = "razorpaySignature")]
    pub razorpay_signature: String,
    #[serde(rename = "orderId")]
    pub order_id: OrderId,
}

/// Generic `{success, error?}` acknowledgement.
#[derive(Debug, Clone, Deserialize)]
pub struct Acknowledgement {
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
}

/// `PATCH /orders/{id}` body.
#[derive(Debug, Clone, Serialize)]
pub struct OrderStatusUpdate {
    pub status: &'static str,
}

/// `POST /refunds` body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundRequest<'a> {
    pub order_id: &'a OrderId,
    pub reason: &'a str,
}

//! Shopping cart state.
//!
//! A [`Cart`] is an ordered list of [`CartLine`]s, one per product id, kept
//! in first-added order. Every operation is total: ids that aren't in the
//! cart turn mutations into no-ops rather than errors.
//!
//! The cart holds its own copy of each product. Totals are computed from
//! that copy, so they can drift from the live catalog until the copy is
//! refreshed with [`Cart::refresh_product`].
//!
//! Persistence lives in [`persist`]: the whole cart is written as one JSON
//! blob under [`CART_STORAGE_KEY`] and read back with [`Cart::rehydrate`],
//! which also accepts the legacy bare-product format.

mod persist;

pub use persist::{CART_STORAGE_KEY, CART_STORAGE_VERSION, normalize_entries};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{Product, ProductId};

/// One row of the cart: a product copy and how many the shopper wants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product: Product,
    /// Always >= 1 while the line exists.
    pub quantity: u32,
}

impl CartLine {
    /// `quantity * unit price`.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.product.price * Decimal::from(self.quantity)
    }
}

/// The shopper's cart.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// An empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { lines: Vec::new() }
    }

    /// Lines in first-added order.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Number of distinct products.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub fn get(&self, product_id: &ProductId) -> Option<&CartLine> {
        self.lines.iter().find(|line| &line.product.id == product_id)
    }

    #[must_use]
    pub fn contains(&self, product_id: &ProductId) -> bool {
        self.get(product_id).is_some()
    }

    fn get_mut(&mut self, product_id: &ProductId) -> Option<&mut CartLine> {
        self.lines
            .iter_mut()
            .find(|line| &line.product.id == product_id)
    }

    /// Add one unit of `product`.
    ///
    /// Bumps the existing line for the same id, otherwise appends a new line
    /// with quantity 1. Returns the line's quantity after the change.
    pub fn add_item(&mut self, product: Product) -> u32 {
        if let Some(line) = self.get_mut(&product.id) {
            line.quantity = line.quantity.saturating_add(1);
            return line.quantity;
        }

        self.lines.push(CartLine {
            product,
            quantity: 1,
        });
        1
    }

    /// Remove the line for `product_id`, if any.
    pub fn remove_item(&mut self, product_id: &ProductId) {
        self.lines.retain(|line| &line.product.id != product_id);
    }

    /// Set the quantity exactly. Anything below 1 removes the line.
    pub fn set_quantity(&mut self, product_id: &ProductId, quantity: i64) {
        if quantity < 1 {
            self.remove_item(product_id);
            return;
        }

        if let Some(line) = self.get_mut(product_id) {
            line.quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        }
    }

    pub fn increment_quantity(&mut self, product_id: &ProductId) {
        if let Some(line) = self.get_mut(product_id) {
            line.quantity = line.quantity.saturating_add(1);
        }
    }

    /// Take one unit away; the line disappears when it would reach zero.
    pub fn decrement_quantity(&mut self, product_id: &ProductId) {
        match self.get(product_id).map(|line| line.quantity) {
            Some(quantity) if quantity <= 1 => self.remove_item(product_id),
            Some(_) => {
                if let Some(line) = self.get_mut(product_id) {
                    line.quantity -= 1;
                }
            }
            None => {}
        }
    }

    /// Empty the cart (after an order has been placed).
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Sum of quantities across all lines.
    #[must_use]
    pub fn total_item_count(&self) -> u64 {
        self.lines.iter().map(|line| u64::from(line.quantity)).sum()
    }

    /// Sum of `quantity * price` using the cart's stored product copies.
    #[must_use]
    pub fn total_price(&self) -> Decimal {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// Replace the stored copy of a product (e.g. with a live catalog
    /// record), keeping its quantity.
    ///
    /// Returns `true` if the cart held that product.
    pub fn refresh_product(&mut self, product: Product) -> bool {
        match self.get_mut(&product.id) {
            Some(line) => {
                line.product = product;
                true
            }
            None => false,
        }
    }
}

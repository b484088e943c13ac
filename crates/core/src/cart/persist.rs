//! Cart persistence format.
//!
//! The cart is written as a single JSON document:
//!
//! ```json
//! {"version": 1, "items": [{"product": {...}, "quantity": 2}]}
//! ```
//!
//! Older storefront builds stored each cart entry as a bare product record
//! (one entry per unit, no quantity). Rehydration accepts every shape that
//! has been written under [`CART_STORAGE_KEY`]:
//!
//! - the current `{version, items}` document
//! - the `{state: {items}}` envelope written by the browser-side store
//! - a bare array of entries
//!
//! and normalizes each entry with [`normalize_entries`].

use serde::Serialize;
use serde_json::Value;

use super::{Cart, CartLine};
use crate::types::Product;

/// Storage key the cart blob lives under.
pub const CART_STORAGE_KEY: &str = "cart-storage";

/// Version written into new blobs.
pub const CART_STORAGE_VERSION: u32 = 1;

#[derive(Serialize)]
struct StoredCart<'a> {
    version: u32,
    items: &'a [CartLine],
}

/// Map persisted entries of any known shape onto cart lines.
///
/// - `{product, quantity}` entries are kept as-is; a quantity below 1 drops
///   the entry.
/// - Entries without that shape but with an `id` are legacy bare products
///   and become `{product: entry, quantity: 1}`.
/// - Anything else (including records that fail to parse as a product) is
///   dropped.
///
/// Lines for the same product id are merged by summing quantities, keeping
/// the position of the first occurrence.
#[must_use]
pub fn normalize_entries(entries: Vec<Value>) -> Vec<CartLine> {
    let mut lines: Vec<CartLine> = Vec::with_capacity(entries.len());

    for entry in entries {
        let Some(line) = normalize_entry(entry) else {
            continue;
        };

        match lines
            .iter_mut()
            .find(|existing| existing.product.id == line.product.id)
        {
            Some(existing) => {
                existing.quantity = existing.quantity.saturating_add(line.quantity);
            }
            None => lines.push(line),
        }
    }

    lines
}

fn normalize_entry(entry: Value) -> Option<CartLine> {
    let Value::Object(mut fields) = entry else {
        return None;
    };

    if fields.contains_key("product") && fields.contains_key("quantity") {
        let quantity = fields.get("quantity").and_then(Value::as_i64)?;
        if quantity < 1 {
            return None;
        }
        let product: Product = serde_json::from_value(fields.remove("product")?).ok()?;
        return Some(CartLine {
            product,
            quantity: u32::try_from(quantity).unwrap_or(u32::MAX),
        });
    }

    if fields.contains_key("id") {
        let product: Product = serde_json::from_value(Value::Object(fields)).ok()?;
        return Some(CartLine {
            product,
            quantity: 1,
        });
    }

    None
}

/// Pull the entry array out of whichever document shape was stored.
fn extract_entries(document: Value) -> Vec<Value> {
    match document {
        Value::Array(entries) => entries,
        Value::Object(mut fields) => {
            if let Some(Value::Object(mut state)) = fields.remove("state") {
                if let Some(Value::Array(entries)) = state.remove("items") {
                    return entries;
                }
                return Vec::new();
            }
            match fields.remove("items") {
                Some(Value::Array(entries)) => entries,
                _ => Vec::new(),
            }
        }
        _ => Vec::new(),
    }
}

impl Cart {
    /// Serialize the whole cart for storage.
    #[must_use]
    pub fn to_blob(&self) -> String {
        let stored = StoredCart {
            version: CART_STORAGE_VERSION,
            items: &self.lines,
        };
        // Products serialize to plain JSON objects; this cannot fail.
        serde_json::to_string(&stored).unwrap_or_else(|_| String::from("{\"items\":[]}"))
    }

    /// Rebuild a cart from a stored blob.
    ///
    /// Never fails: unreadable blobs and unknown entries yield an empty cart
    /// or are skipped.
    #[must_use]
    pub fn rehydrate(blob: &str) -> Self {
        let entries = serde_json::from_str::<Value>(blob)
            .map(extract_entries)
            .unwrap_or_default();

        Self {
            lines: normalize_entries(entries),
        }
    }

    /// Rebuild a cart from an optional stored blob (absent = empty cart).
    #[must_use]
    pub fn rehydrate_or_default(blob: Option<&str>) -> Self {
        blob.map(Self::rehydrate).unwrap_or_default()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;
    use serde_json::json;

    use super::*;
    use crate::cart::tests::product;
    use crate::types::ProductId;

    const LEGACY_BLOB: &str = r#"{
        "state": {
            "items": [
                {"id": "kit-1", "name": "Mountain Kit", "price": "499.00", "images": []},
                {"id": "kit-2", "name": "Beach Kit", "price": "250", "images": []}
            ]
        },
        "version": 0
    }"#;

    const CURRENT_BLOB: &str = r#"{
        "version": 1,
        "items": [
            {"product": {"id": "kit-1", "name": "Mountain Kit", "price": "499.00"}, "quantity": 3},
            {"product": {"id": "kit-2", "name": "Beach Kit", "price": "250"}, "quantity": 1}
        ]
    }"#;

    #[test]
    fn test_round_trip_preserves_lines() {
        let mut cart = Cart::new();
        cart.add_item(product("a", 120));
        cart.add_item(product("b", 80));
        cart.add_item(product("a", 120));

        let restored = Cart::rehydrate(&cart.to_blob());
        assert_eq!(restored, cart);
    }

    #[test]
    fn test_blob_shape() {
        let mut cart = Cart::new();
        cart.add_item(product("a", 120));

        let value: Value = serde_json::from_str(&cart.to_blob()).unwrap();
        assert_eq!(value["version"], json!(1));
        assert_eq!(value["items"][0]["quantity"], json!(1));
        assert_eq!(value["items"][0]["product"]["id"], json!("a"));
    }

    #[test]
    fn test_rehydrate_current_format() {
        let cart = Cart::rehydrate(CURRENT_BLOB);
        assert_eq!(cart.len(), 2);
        assert_eq!(cart.get(&ProductId::new("kit-1")).unwrap().quantity, 3);
        assert_eq!(cart.total_item_count(), 4);
        assert_eq!(cart.total_price(), Decimal::new(499 * 3 + 250, 0));
    }

    #[test]
    fn test_rehydrate_legacy_envelope() {
        let cart = Cart::rehydrate(LEGACY_BLOB);
        assert_eq!(cart.len(), 2);
        assert!(cart.lines().iter().all(|line| line.quantity == 1));
        assert_eq!(cart.total_item_count(), 2);
        assert_eq!(cart.lines()[0].product.name, "Mountain Kit");
    }

    #[test]
    fn test_rehydrate_bare_legacy_array() {
        let blob = r#"[
            {"id": "kit-1", "name": "Mountain Kit", "price": "499"},
            {"id": "kit-1", "name": "Mountain Kit", "price": "499"},
            {"id": "kit-3", "name": "Desert Kit", "price": "300"}
        ]"#;

        let cart = Cart::rehydrate(blob);
        assert_eq!(cart.len(), 2);
        assert_eq!(cart.get(&ProductId::new("kit-1")).unwrap().quantity, 2);
        assert_eq!(cart.total_item_count(), 3);
    }

    #[test]
    fn test_rehydrate_mixed_entries() {
        let blob = r#"{"state": {"items": [
            {"product": {"id": "kit-1", "name": "Mountain Kit", "price": "499"}, "quantity": 2},
            {"id": "kit-2", "name": "Beach Kit", "price": "250"},
            {"name": "no id at all"},
            {"product": {"id": "kit-4", "name": "Zero", "price": "1"}, "quantity": 0},
            {"id": "kit-5", "name": "Bad price", "price": "abc"},
            "not-an-object"
        ]}}"#;

        let cart = Cart::rehydrate(blob);
        let ids: Vec<&str> = cart.lines().iter().map(|l| l.product.id.as_str()).collect();
        assert_eq!(ids, ["kit-1", "kit-2"]);
        assert_eq!(cart.total_item_count(), 3);
    }

    #[test]
    fn test_rehydrate_then_mutate_keeps_totals_consistent() {
        let mut cart = Cart::rehydrate(LEGACY_BLOB);
        cart.add_item(product("kit-1", 499));
        cart.decrement_quantity(&ProductId::new("kit-2"));

        let sum: u64 = cart.lines().iter().map(|l| u64::from(l.quantity)).sum();
        assert_eq!(cart.total_item_count(), sum);
        assert_eq!(cart.total_item_count(), 2);
    }

    #[test]
    fn test_migrated_cart_round_trips() {
        let migrated = Cart::rehydrate(LEGACY_BLOB);
        let restored = Cart::rehydrate(&migrated.to_blob());
        assert_eq!(restored, migrated);
    }

    #[test]
    fn test_rehydrate_garbage_is_empty() {
        assert!(Cart::rehydrate("").is_empty());
        assert!(Cart::rehydrate("not json").is_empty());
        assert!(Cart::rehydrate("42").is_empty());
        assert!(Cart::rehydrate(r#"{"state": null}"#).is_empty());
        assert!(Cart::rehydrate(r#"{"items": "nope"}"#).is_empty());
        assert!(Cart::rehydrate_or_default(None).is_empty());
    }

    #[test]
    fn test_normalize_entries_literal_inputs() {
        let lines = normalize_entries(vec![
            json!({"id": "kit-1", "name": "Mountain Kit", "price": "499"}),
            json!({"product": {"id": "kit-2", "name": "Beach Kit", "price": "250"}, "quantity": 4}),
        ]);

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].quantity, 1);
        assert_eq!(lines[1].quantity, 4);
        assert_eq!(lines[1].product.price, Decimal::new(250, 0));
    }
}

//! Session-backed cart store.
//!
//! Wraps the core [`Cart`] reducer: the cart is rehydrated from the session
//! when loaded and the whole blob is written back after every mutation.
//! Two concurrent requests on one session are last-write-wins.

use rust_decimal::Decimal;
use serde::Serialize;
use tower_sessions::Session;

use little_monsters_core::{Cart, CartLine, Price, Product, ProductId};

use crate::models::session_keys;

/// Toast shown after an item is added.
pub const ITEM_ADDED_MESSAGE: &str = "Item added to cart.";

type SessionResult<T> = Result<T, tower_sessions::session::Error>;

/// A cart bound to the session it persists into.
pub struct CartStore {
    session: Session,
    cart: Cart,
}

impl CartStore {
    /// Load the cart from the session, migrating older formats.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store can't be read.
    pub async fn load(session: Session) -> SessionResult<Self> {
        let blob: Option<String> = session.get(session_keys::CART).await?;
        let cart = Cart::rehydrate_or_default(blob.as_deref());
        Ok(Self { session, cart })
    }

    #[must_use]
    pub const fn cart(&self) -> &Cart {
        &self.cart
    }

    async fn persist(&self) -> SessionResult<()> {
        self.session
            .insert(session_keys::CART, self.cart.to_blob())
            .await
    }

    /// Add one unit of `product`; returns the line's new quantity.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store can't be written.
    pub async fn add_item(&mut self, product: Product) -> SessionResult<u32> {
        let quantity = self.cart.add_item(product);
        self.persist().await?;
        Ok(quantity)
    }

    /// # Errors
    ///
    /// Returns an error if the session store can't be written.
    pub async fn remove_item(&mut self, product_id: &ProductId) -> SessionResult<()> {
        self.cart.remove_item(product_id);
        self.persist().await
    }

    /// # Errors
    ///
    /// Returns an error if the session store can't be written.
    pub async fn set_quantity(&mut self, product_id: &ProductId, quantity: i64) -> SessionResult<()> {
        self.cart.set_quantity(product_id, quantity);
        self.persist().await
    }

    /// # Errors
    ///
    /// Returns an error if the session store can't be written.
    pub async fn increment_quantity(&mut self, product_id: &ProductId) -> SessionResult<()> {
        self.cart.increment_quantity(product_id);
        self.persist().await
    }

    /// # Errors
    ///
    /// Returns an error if the session store can't be written.
    pub async fn decrement_quantity(&mut self, product_id: &ProductId) -> SessionResult<()> {
        self.cart.decrement_quantity(product_id);
        self.persist().await
    }

    /// # Errors
    ///
    /// Returns an error if the session store can't be written.
    pub async fn clear(&mut self) -> SessionResult<()> {
        self.cart.clear();
        self.persist().await
    }

    /// Apply an in-memory edit (e.g. price revalidation) and persist it.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store can't be written.
    pub async fn update<T>(&mut self, edit: impl FnOnce(&mut Cart) -> T) -> SessionResult<T> {
        let out = edit(&mut self.cart);
        self.persist().await?;
        Ok(out)
    }

    #[must_use]
    pub fn view(&self) -> CartView {
        CartView::from(&self.cart)
    }
}

/// JSON shape of the cart for the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub items: Vec<CartLine>,
    pub total_items: u64,
    pub total_price: Decimal,
    /// `total_price` formatted for display, e.g. `₹1,299`.
    pub formatted_total: String,
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        let total_price = cart.total_price();
        Self {
            items: cart.lines().to_vec(),
            total_items: cart.total_item_count(),
            total_price,
            formatted_total: Price::inr(total_price).display(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use tower_sessions::MemoryStore;

    use super::*;

    fn session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    fn product(id: &str, price: i64) -> Product {
        Product {
            id: ProductId::new(id),
            name: format!("Kit {id}"),
            price: Decimal::new(price, 0),
            is_featured: false,
            category: None,
            size: None,
            age: None,
            duration: None,
            destination: None,
            images: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_mutations_persist_to_session() {
        let session = session();
        let mut store = CartStore::load(session.clone()).await.unwrap();
        store.add_item(product("a", 100)).await.unwrap();
        store.add_item(product("a", 100)).await.unwrap();
        store.add_item(product("b", 50)).await.unwrap();

        let reloaded = CartStore::load(session).await.unwrap();
        assert_eq!(reloaded.cart(), store.cart());
        assert_eq!(reloaded.cart().total_item_count(), 3);
        assert_eq!(reloaded.cart().total_price(), Decimal::new(250, 0));
    }

    #[tokio::test]
    async fn test_decrement_to_zero_removes_and_persists() {
        let session = session();
        let mut store = CartStore::load(session.clone()).await.unwrap();
        store.add_item(product("a", 100)).await.unwrap();
        store
            .decrement_quantity(&ProductId::new("a"))
            .await
            .unwrap();

        let reloaded = CartStore::load(session).await.unwrap();
        assert!(reloaded.cart().is_empty());
    }

    #[tokio::test]
    async fn test_loads_legacy_blob_from_session() {
        let session = session();
        session
            .insert(
                session_keys::CART,
                r#"{"state":{"items":[{"id":"kit-1","name":"Mountain Kit","price":"499"}]}}"#,
            )
            .await
            .unwrap();

        let store = CartStore::load(session).await.unwrap();
        assert_eq!(store.cart().len(), 1);
        assert_eq!(store.cart().total_item_count(), 1);
    }

    #[tokio::test]
    async fn test_update_persists_edit() {
        let session = session();
        let mut store = CartStore::load(session.clone()).await.unwrap();
        store.add_item(product("a", 100)).await.unwrap();

        let refreshed = store
            .update(|cart| cart.refresh_product(product("a", 120)))
            .await
            .unwrap();
        assert!(refreshed);

        let reloaded = CartStore::load(session).await.unwrap();
        assert_eq!(reloaded.cart().total_price(), Decimal::new(120, 0));
    }

    #[test]
    fn test_view_totals() {
        let mut cart = Cart::new();
        cart.add_item(product("a", 1299));
        cart.add_item(product("a", 1299));

        let view = CartView::from(&cart);
        assert_eq!(view.total_items, 2);
        assert_eq!(view.total_price, Decimal::new(2598, 0));
        assert_eq!(view.formatted_total, "₹2,598");

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["totalItems"], 2);
        assert_eq!(json["items"][0]["quantity"], 2);
    }
}

//! Cart route handlers.
//!
//! The cart lives in the session under `cart-storage`. Every mutation
//! responds with the updated cart and an `HX-Trigger: cart-updated` header
//! so the navbar badge can refresh.

use axum::{
    Json,
    extract::{Path, State},
    response::{AppendHeaders, IntoResponse},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_sessions::Session;
use tracing::instrument;

use little_monsters_core::ProductId;

use crate::error::{Result, add_breadcrumb};
use crate::services::cart::{CartStore, CartView, ITEM_ADDED_MESSAGE};
use crate::state::AppState;

const HX_TRIGGER: &str = "HX-Trigger";
const CART_UPDATED: &str = "cart-updated";

/// Form data for adding to cart.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartForm {
    pub product_id: ProductId,
}

/// Form data for setting a line's quantity.
#[derive(Debug, Deserialize)]
pub struct SetQuantityForm {
    /// Values below 1 remove the line.
    pub quantity: i64,
}

/// Response for add-to-cart: the toast text and the line's new quantity.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemAdded {
    pub message: &'static str,
    pub quantity: u32,
    pub cart: CartView,
}

fn updated(view: CartView) -> impl IntoResponse {
    (AppendHeaders([(HX_TRIGGER, CART_UPDATED)]), Json(view))
}

/// Current cart.
#[instrument(skip(session))]
pub async fn show(session: Session) -> Result<Json<CartView>> {
    let store = CartStore::load(session).await?;
    Ok(Json(store.view()))
}

/// Add one unit of a product, fetched from the catalog.
#[instrument(skip(state, session))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<AddToCartForm>,
) -> Result<impl IntoResponse> {
    let product = state.backend().get_product(&form.product_id).await?;

    let mut store = CartStore::load(session).await?;
    let quantity = store.add_item(product).await?;
    add_breadcrumb("cart", "Added item", Some(&[("product_id", form.product_id.as_str())]));

    let trigger = json!({ "cart-updated": null, "showToast": ITEM_ADDED_MESSAGE }).to_string();
    Ok((
        AppendHeaders([(HX_TRIGGER, trigger)]),
        Json(ItemAdded {
            message: ITEM_ADDED_MESSAGE,
            quantity,
            cart: store.view(),
        }),
    ))
}

/// Remove a line.
#[instrument(skip(session))]
pub async fn remove(session: Session, Path(product_id): Path<ProductId>) -> Result<impl IntoResponse> {
    let mut store = CartStore::load(session).await?;
    store.remove_item(&product_id).await?;
    Ok(updated(store.view()))
}

/// Set a line's quantity exactly.
#[instrument(skip(session))]
pub async fn set_quantity(
    session: Session,
    Path(product_id): Path<ProductId>,
    Json(form): Json<SetQuantityForm>,
) -> Result<impl IntoResponse> {
    let mut store = CartStore::load(session).await?;
    store.set_quantity(&product_id, form.quantity).await?;
    Ok(updated(store.view()))
}

#[instrument(skip(session))]
pub async fn increment(session: Session, Path(product_id): Path<ProductId>) -> Result<impl IntoResponse> {
    let mut store = CartStore::load(session).await?;
    store.increment_quantity(&product_id).await?;
    Ok(updated(store.view()))
}

#[instrument(skip(session))]
pub async fn decrement(session: Session, Path(product_id): Path<ProductId>) -> Result<impl IntoResponse> {
    let mut store = CartStore::load(session).await?;
    store.decrement_quantity(&product_id).await?;
    Ok(updated(store.view()))
}

/// Empty the cart.
#[instrument(skip(session))]
pub async fn clear(session: Session) -> Result<impl IntoResponse> {
    let mut store = CartStore::load(session).await?;
    store.clear().await?;
    Ok(updated(store.view()))
}

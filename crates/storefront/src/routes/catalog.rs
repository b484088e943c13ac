//! Catalog proxy route handlers.
//!
//! Thin pass-throughs to the admin API; responses come from the client's
//! five-minute cache where possible.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use tracing::instrument;

use little_monsters_core::{Category, CategoryId, Product, ProductId};

use crate::backend::{FilterOptions, ProductQuery};
use crate::error::Result;
use crate::state::AppState;

/// Products matching the query's filters.
#[instrument(skip(state))]
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> Result<Json<Vec<Product>>> {
    Ok(Json(state.backend().list_products(&query).await?))
}

#[instrument(skip(state))]
pub async fn show_product(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<Product>> {
    Ok(Json(state.backend().get_product(&id).await?))
}

#[instrument(skip(state))]
pub async fn list_categories(State(state): State<AppState>) -> Result<Json<Vec<Category>>> {
    Ok(Json(state.backend().list_categories().await?))
}

#[instrument(skip(state))]
pub async fn show_category(
    State(state): State<AppState>,
    Path(id): Path<CategoryId>,
) -> Result<Json<Category>> {
    Ok(Json(state.backend().get_category(&id).await?))
}

/// Sizes, ages, durations and destinations for the filter sidebar.
#[instrument(skip(state))]
pub async fn filters(State(state): State<AppState>) -> Result<Json<FilterOptions>> {
    Ok(Json(state.backend().filter_options().await?))
}

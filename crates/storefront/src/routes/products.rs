//! Catalog route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use spindle_core::{ProductId, ProductKind};
use tower_sessions::Session;
use tracing::instrument;

use crate::api::catalog::ProductFilter;
use crate::error::AppError;
use crate::models::{Product, session};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub kind: Option<ProductKind>,
    pub rush_eligible: Option<bool>,
}

/// GET /products
#[instrument(skip(state))]
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Product>>, AppError> {
    let filter = ProductFilter {
        kind: query.kind,
        rush_eligible: query.rush_eligible,
    };
    let products = state.catalog().list_products(&filter).await?;
    Ok(Json(products))
}

/// Product detail plus how many the session's cart already holds.
#[derive(Debug, Serialize)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: Product,
    pub in_cart: u32,
}

/// GET /products/{id}
#[instrument(skip(state, session))]
pub async fn detail(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<ProductId>,
) -> Result<Json<ProductDetail>, AppError> {
    let product = state.catalog().get_product(id).await?;
    let cart = session::load_cart(&session).await?;
    let in_cart = cart.item_quantity(id);
    Ok(Json(ProductDetail { product, in_cart }))
}

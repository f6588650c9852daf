//! Cart route handlers.
//!
//! Every mutation loads the cart from the session, applies the change, and
//! writes the whole cart back, then returns the refreshed view. Over-stock
//! quantities are accepted and surfaced as warnings, never rejected.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};
use spindle_core::{Price, ProductId};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::AppError;
use crate::models::{Cart, CartLine, session};
use crate::state::AppState;

/// One cart line as the client sees it.
#[derive(Debug, Serialize)]
pub struct CartLineView {
    pub product_id: ProductId,
    pub title: String,
    pub unit_price: Price,
    pub quantity: u32,
    pub line_total: Price,
    /// Set when the requested quantity exceeds the stock snapshot.
    pub over_stock: bool,
}

/// The cart as the client sees it.
#[derive(Debug, Serialize)]
pub struct CartView {
    pub lines: Vec<CartLineView>,
    pub subtotal: Price,
    pub item_count: u32,
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        Self {
            lines: cart.lines().iter().map(CartLineView::from).collect(),
            subtotal: cart.subtotal(),
            item_count: cart.item_count(),
        }
    }
}

impl From<&CartLine> for CartLineView {
    fn from(line: &CartLine) -> Self {
        Self {
            product_id: line.product.id,
            title: line.product.title.clone(),
            unit_price: line.product.price,
            quantity: line.quantity,
            line_total: line.line_total(),
            over_stock: line.over_stock(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub product_id: ProductId,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

const fn default_quantity() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
pub struct UpdateQuantityRequest {
    pub quantity: u32,
}

/// GET /cart
#[instrument(skip_all)]
pub async fn view(session: Session) -> Result<Json<CartView>, AppError> {
    let cart = session::load_cart(&session).await?;
    Ok(Json(CartView::from(&cart)))
}

/// POST /cart/items
///
/// Fetches the product from the catalog (404 if unknown) and merges it into
/// the cart.
#[instrument(skip(state, session), fields(product_id = %request.product_id))]
pub async fn add_item(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<AddItemRequest>,
) -> Result<Json<CartView>, AppError> {
    if request.quantity == 0 {
        return Err(AppError::BadRequest("Quantity must be at least 1".to_string()));
    }
    let product = state.catalog().get_product(request.product_id).await?;

    let mut cart = session::load_cart(&session).await?;
    cart.add_item(product, request.quantity);
    session::save_cart(&session, &cart).await?;

    Ok(Json(CartView::from(&cart)))
}

/// PUT /cart/items/{product_id}
///
/// Sets the line's quantity; zero removes the line.
#[instrument(skip(session))]
pub async fn update_quantity(
    session: Session,
    Path(product_id): Path<ProductId>,
    Json(request): Json<UpdateQuantityRequest>,
) -> Result<Json<CartView>, AppError> {
    let mut cart = session::load_cart(&session).await?;
    cart.update_quantity(product_id, request.quantity);
    session::save_cart(&session, &cart).await?;

    Ok(Json(CartView::from(&cart)))
}

/// DELETE /cart/items/{product_id}
#[instrument(skip(session))]
pub async fn remove_item(
    session: Session,
    Path(product_id): Path<ProductId>,
) -> Result<Json<CartView>, AppError> {
    let mut cart = session::load_cart(&session).await?;
    cart.remove_item(product_id);
    session::save_cart(&session, &cart).await?;

    Ok(Json(CartView::from(&cart)))
}

/// DELETE /cart
#[instrument(skip(session))]
pub async fn clear(session: Session) -> Result<Json<CartView>, AppError> {
    let mut cart = session::load_cart(&session).await?;
    cart.clear();
    session::save_cart(&session, &cart).await?;

    Ok(Json(CartView::from(&cart)))
}

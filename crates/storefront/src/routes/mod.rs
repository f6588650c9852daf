//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                     - Health check
//!
//! # Catalog
//! GET    /products                   - Product listing (filterable)
//! GET    /products/{id}              - Product detail
//!
//! # Cart
//! GET    /cart                       - Current cart with stock warnings
//! POST   /cart/items                 - Add a product
//! PUT    /cart/items/{id}            - Set a line's quantity (0 removes)
//! DELETE /cart/items/{id}            - Remove a line
//! DELETE /cart                       - Clear the cart
//!
//! # Checkout wizard
//! GET    /checkout                   - Wizard state + live quote
//! POST   /checkout                   - Start (or restart) a checkout
//! PUT    /checkout/delivery          - Update delivery fields
//! PUT    /checkout/payment-method    - Choose a payment method
//! POST   /checkout/next              - Advance (validates current step)
//! POST   /checkout/prev              - Go back
//! POST   /checkout/submit            - Submit from the review step
//! GET    /checkout/return            - Payment gateway return callback
//!
//! # Orders
//! GET    /orders?email=...           - Order history for a customer
//! GET    /orders/{id}                - Order detail
//! POST   /orders/{id}/cancel         - Cancel (PENDING/CONFIRMED only)
//! ```

pub mod cart;
pub mod checkout;
pub mod orders;
pub mod products;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::state::AppState;

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::view).delete(cart::clear))
        .route("/items", post(cart::add_item))
        .route(
            "/items/{product_id}",
            put(cart::update_quantity).delete(cart::remove_item),
        )
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(checkout::view).post(checkout::start))
        .route("/delivery", put(checkout::update_delivery))
        .route("/payment-method", put(checkout::set_payment_method))
        .route("/next", post(checkout::next))
        .route("/prev", post(checkout::prev))
        .route("/submit", post(checkout::submit))
        .route("/return", get(checkout::gateway_return))
}

/// Create the full application router.
pub fn app_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/products", get(products::list))
        .route("/products/{id}", get(products::detail))
        .nest("/cart", cart_routes())
        .nest("/checkout", checkout_routes())
        .route("/orders", get(orders::history))
        .route("/orders/{id}", get(orders::detail))
        .route("/orders/{id}/cancel", post(orders::cancel))
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

//! HTTP route handlers for the admin surface.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                - Health check
//!
//! # Orders
//! GET  /orders                - Order list (filterable by status/email)
//! GET  /orders/{id}           - Order detail with action guards
//! POST /orders/{id}/confirm   - Confirm (PENDING only)
//! POST /orders/{id}/cancel    - Cancel (PENDING/CONFIRMED only)
//!
//! # Users
//! GET  /users                 - Customer account list
//! POST /users/{id}/block      - Block an account (reason required)
//! POST /users/{id}/unblock    - Reinstate a blocked account
//! ```

pub mod orders;
pub mod users;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the full admin router.
pub fn app_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/orders", get(orders::list))
        .route("/orders/{id}", get(orders::detail))
        .route("/orders/{id}/confirm", post(orders::confirm))
        .route("/orders/{id}/cancel", post(orders::cancel))
        .route("/users", get(users::list))
        .route("/users/{id}/block", post(users::block))
        .route("/users/{id}/unblock", post(users::unblock))
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

//! Order history and customer-side lifecycle actions.
//!
//! Reads always go to the commerce API; nothing order-shaped is cached, so
//! the guard predicates in the response reflect the server's current view.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use spindle_core::{Email, OrderId, OrderStatus};
use tracing::instrument;

use crate::api::ApiError;
use crate::api::orders::OrderView;
use crate::error::AppError;
use crate::state::AppState;

/// An order plus the lifecycle actions currently available on it.
///
/// The predicates are recomputed from the fetched status on every request;
/// the server still re-validates, these only gate the UI.
#[derive(Debug, Serialize)]
pub struct OrderWithActions {
    #[serde(flatten)]
    pub order: OrderView,
    pub can_cancel: bool,
}

impl From<OrderView> for OrderWithActions {
    fn from(order: OrderView) -> Self {
        let can_cancel = order.status.can_cancel();
        Self { order, can_cancel }
    }
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub email: String,
}

/// GET /orders?email=...
#[instrument(skip(state, query))]
pub async fn history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<OrderWithActions>>, AppError> {
    let email = Email::parse(&query.email)
        .map_err(|e| AppError::BadRequest(format!("Invalid email: {e}")))?;
    let orders = state.orders().get_orders_by_customer(&email).await?;
    Ok(Json(orders.into_iter().map(OrderWithActions::from).collect()))
}

/// GET /orders/{id}
#[instrument(skip(state))]
pub async fn detail(
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
) -> Result<Json<OrderWithActions>, AppError> {
    let order = state.orders().get_order(id).await?;
    Ok(Json(OrderWithActions::from(order)))
}

/// POST /orders/{id}/cancel
///
/// The guard runs here first to spare the round trip. A 409 from the server
/// means the order moved underneath us, so the response re-reads and reports
/// the status it landed on.
#[instrument(skip(state))]
pub async fn cancel(
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
) -> Result<Json<OrderWithActions>, AppError> {
    let current = state.orders().get_order(id).await?;
    if !current.status.can_cancel() {
        return Err(AppError::Api(ApiError::Conflict(format!(
            "Order cannot be cancelled from status {}",
            current.status
        ))));
    }
    match state.orders().cancel_order(id).await {
        Ok(order) => Ok(Json(OrderWithActions::from(order))),
        Err(ApiError::Conflict(_)) => {
            // The order moved between our read and the cancellation
            let now = state.orders().get_order(id).await?;
            Err(cancellation_conflict(now.status))
        }
        Err(err) => Err(err.into()),
    }
}

/// Conflict reported when the order's status moved before the cancellation
/// landed, carrying where it ended up.
fn cancellation_conflict(status: OrderStatus) -> AppError {
    AppError::Api(ApiError::Conflict(format!(
        "Order changed to {status} before the cancellation landed"
    )))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use spindle_core::{PaymentStatus, Price};

    use super::*;

    fn order(status: OrderStatus) -> OrderView {
        OrderView {
            order_id: OrderId::new(7),
            invoice_id: None,
            status,
            payment_status: PaymentStatus::Pending,
            subtotal: Price::new(200_000),
            vat: Price::new(20_000),
            delivery_fee: Price::new(30_000),
            total: Price::new(250_000),
            created_at: "2026-08-25T10:00:00Z".to_string(),
        }
    }

    #[test]
    fn test_cancel_guard_follows_status() {
        assert!(OrderWithActions::from(order(OrderStatus::Pending)).can_cancel);
        assert!(OrderWithActions::from(order(OrderStatus::Confirmed)).can_cancel);
        assert!(!OrderWithActions::from(order(OrderStatus::Shipped)).can_cancel);
        assert!(!OrderWithActions::from(order(OrderStatus::Cancelled)).can_cancel);
    }

    #[test]
    fn test_cancellation_conflict_reports_fresh_status() {
        match cancellation_conflict(OrderStatus::Shipped) {
            AppError::Api(ApiError::Conflict(message)) => {
                assert!(message.contains("SHIPPED"), "{message}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}

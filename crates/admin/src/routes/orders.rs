//! Order lifecycle route handlers.
//!
//! Guards run here against the freshly fetched status before each
//! transition, so the UI never offers an action the server would reject.
//! The server remains the final authority; a 409 from it means the order
//! moved between our read and the transition, and the handler re-fetches
//! to report the current state.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use spindle_core::{OrderId, OrderStatus};
use tracing::{info, instrument};

use crate::commerce::{AdminOrder, CommerceError, OrderListFilter};
use crate::error::AppError;
use crate::state::AppState;

/// An order plus the lifecycle actions currently available on it.
#[derive(Debug, Serialize)]
pub struct OrderWithActions {
    #[serde(flatten)]
    pub order: AdminOrder,
    pub can_confirm: bool,
    pub can_cancel: bool,
}

impl From<AdminOrder> for OrderWithActions {
    fn from(order: AdminOrder) -> Self {
        let can_confirm = order.status.can_confirm();
        let can_cancel = order.status.can_cancel();
        Self {
            order,
            can_confirm,
            can_cancel,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<OrderStatus>,
    pub email: Option<String>,
}

/// GET /orders
#[instrument(skip(state))]
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<OrderWithActions>>, AppError> {
    let filter = OrderListFilter {
        status: query.status,
        email: query.email,
    };
    let orders = state.commerce().list_orders(&filter).await?;
    Ok(Json(orders.into_iter().map(OrderWithActions::from).collect()))
}

/// GET /orders/{id}
#[instrument(skip(state))]
pub async fn detail(
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
) -> Result<Json<OrderWithActions>, AppError> {
    let order = state.commerce().get_order(id).await?;
    Ok(Json(OrderWithActions::from(order)))
}

/// POST /orders/{id}/confirm
#[instrument(skip(state))]
pub async fn confirm(
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
) -> Result<Json<OrderWithActions>, AppError> {
    let current = state.commerce().get_order(id).await?;
    if !current.status.can_confirm() {
        return Err(AppError::Conflict(format!(
            "Order cannot be confirmed from status {}",
            current.status
        )));
    }

    match state.commerce().confirm_order(id).await {
        Ok(order) => {
            info!(order_id = %id, "Order confirmed");
            Ok(Json(OrderWithActions::from(order)))
        }
        Err(CommerceError::Conflict(_)) => {
            // The order moved between our read and the transition
            let now = state.commerce().get_order(id).await?;
            Err(AppError::Conflict(format!(
                "Order changed to {} before the confirmation landed",
                now.status
            )))
        }
        Err(err) => Err(err.into()),
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct CancelRequest {
    pub reason: Option<String>,
}

/// POST /orders/{id}/cancel
#[instrument(skip(state, request))]
pub async fn cancel(
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
    request: Option<Json<CancelRequest>>,
) -> Result<Json<OrderWithActions>, AppError> {
    let reason = request.and_then(|Json(r)| r.reason);

    let current = state.commerce().get_order(id).await?;
    if !current.status.can_cancel() {
        return Err(AppError::Conflict(format!(
            "Order cannot be cancelled from status {}",
            current.status
        )));
    }

    match state.commerce().cancel_order(id, reason.as_deref()).await {
        Ok(order) => {
            info!(order_id = %id, "Order cancelled");
            Ok(Json(OrderWithActions::from(order)))
        }
        Err(CommerceError::Conflict(_)) => {
            let now = state.commerce().get_order(id).await?;
            Err(AppError::Conflict(format!(
                "Order changed to {} before the cancellation landed",
                now.status
            )))
        }
        Err(err) => Err(err.into()),
    }
}

//! Checkout wizard route handlers.
//!
//! The wizard lives in the session; every handler loads it, applies one
//! change, saves it back, and returns the refreshed view with a live quote.

use axum::{
    Json,
    extract::{Query, State},
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use crate::api::payments::PaymentReturn;
use crate::checkout::{
    self, CheckoutError, DeliverySelection, PaymentMethod, Step, SubmissionOutcome, Wizard,
};
use crate::error::AppError;
use crate::models::session;
use crate::pricing::{Quote, quote};
use crate::state::AppState;

/// Wizard state plus the quote for the current cart and selections.
#[derive(Debug, Serialize)]
pub struct CheckoutView {
    pub step: Step,
    pub delivery: DeliverySelection,
    pub payment_method: Option<PaymentMethod>,
    pub quote: Quote,
}

async fn view_of(
    state: &AppState,
    session: &Session,
    wizard: &Wizard,
) -> Result<CheckoutView, AppError> {
    let cart = session::load_cart(session).await?;
    let quote = quote(cart.lines(), &wizard.delivery, &state.config().pricing);
    Ok(CheckoutView {
        step: wizard.step,
        delivery: wizard.delivery.clone(),
        payment_method: wizard.payment_method,
        quote,
    })
}

/// GET /checkout
#[instrument(skip_all)]
pub async fn view(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<CheckoutView>, AppError> {
    let wizard = session::load_wizard(&session)
        .await?
        .ok_or(CheckoutError::NotStarted)?;
    Ok(Json(view_of(&state, &session, &wizard).await?))
}

/// POST /checkout
///
/// Starts a checkout for the current cart, replacing any earlier one.
#[instrument(skip_all)]
pub async fn start(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<CheckoutView>, AppError> {
    let cart = session::load_cart(&session).await?;
    if cart.is_empty() {
        return Err(CheckoutError::EmptyCart.into());
    }
    let wizard = Wizard::new();
    session::save_wizard(&session, &wizard).await?;
    Ok(Json(view_of(&state, &session, &wizard).await?))
}

/// Partial update of the delivery step. Absent fields are left alone.
#[derive(Debug, Deserialize)]
pub struct DeliveryUpdate {
    pub recipient_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub province: Option<String>,
    pub district: Option<String>,
    pub ward: Option<String>,
    pub address: Option<String>,
    pub delivery_message: Option<String>,
    pub rush_requested: Option<bool>,
}

/// PUT /checkout/delivery
///
/// Province changes cascade (district and ward reset, rush re-evaluated)
/// before any district or rush value from the same request is applied.
#[instrument(skip_all)]
pub async fn update_delivery(
    State(state): State<AppState>,
    session: Session,
    Json(update): Json<DeliveryUpdate>,
) -> Result<Json<CheckoutView>, AppError> {
    let mut wizard = session::load_wizard(&session)
        .await?
        .ok_or(CheckoutError::NotStarted)?;

    let rush_region = &state.config().pricing.rush_region;
    if let Some(province) = update.province {
        wizard.set_province(province, rush_region);
    }
    if let Some(district) = update.district {
        wizard.set_district(district);
    }
    if let Some(ward) = update.ward {
        wizard.delivery.ward = ward;
    }
    if let Some(name) = update.recipient_name {
        wizard.delivery.recipient_name = name;
    }
    if let Some(email) = update.email {
        wizard.delivery.email = email;
    }
    if let Some(phone) = update.phone {
        wizard.delivery.phone = phone;
    }
    if let Some(address) = update.address {
        wizard.delivery.address = address;
    }
    if let Some(message) = update.delivery_message {
        wizard.delivery.delivery_message = if message.trim().is_empty() {
            None
        } else {
            Some(message)
        };
    }
    if let Some(rush) = update.rush_requested {
        wizard.request_rush(rush, rush_region);
    }

    session::save_wizard(&session, &wizard).await?;
    Ok(Json(view_of(&state, &session, &wizard).await?))
}

#[derive(Debug, Deserialize)]
pub struct PaymentMethodRequest {
    pub method: PaymentMethod,
}

/// PUT /checkout/payment-method
#[instrument(skip_all)]
pub async fn set_payment_method(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<PaymentMethodRequest>,
) -> Result<Json<CheckoutView>, AppError> {
    let mut wizard = session::load_wizard(&session)
        .await?
        .ok_or(CheckoutError::NotStarted)?;
    wizard.payment_method = Some(request.method);
    session::save_wizard(&session, &wizard).await?;
    Ok(Json(view_of(&state, &session, &wizard).await?))
}

/// POST /checkout/next
#[instrument(skip_all)]
pub async fn next(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<CheckoutView>, AppError> {
    let mut wizard = session::load_wizard(&session)
        .await?
        .ok_or(CheckoutError::NotStarted)?;
    wizard.next().map_err(CheckoutError::InvalidFields)?;
    session::save_wizard(&session, &wizard).await?;
    Ok(Json(view_of(&state, &session, &wizard).await?))
}

/// POST /checkout/prev
#[instrument(skip_all)]
pub async fn prev(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<CheckoutView>, AppError> {
    let mut wizard = session::load_wizard(&session)
        .await?
        .ok_or(CheckoutError::NotStarted)?;
    wizard.prev();
    session::save_wizard(&session, &wizard).await?;
    Ok(Json(view_of(&state, &session, &wizard).await?))
}

/// POST /checkout/submit
#[instrument(skip_all)]
pub async fn submit(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<SubmissionOutcome>, AppError> {
    let outcome = checkout::submit::submit(&state, &session).await?;
    Ok(Json(outcome))
}

/// What the customer sees after coming back from the gateway.
#[derive(Debug, Serialize)]
pub struct GatewayReturnView {
    pub order_id: spindle_core::OrderId,
    pub paid: bool,
    pub pay_date: Option<String>,
}

/// GET /checkout/return
///
/// The gateway redirects the customer here after payment. Only a success
/// status clears the cart; failures keep everything for a retry.
#[instrument(skip(session))]
pub async fn gateway_return(
    session: Session,
    Query(callback): Query<PaymentReturn>,
) -> Result<Json<GatewayReturnView>, AppError> {
    let paid = checkout::submit::finish_gateway_return(&session, &callback).await?;
    Ok(Json(GatewayReturnView {
        order_id: callback.order_id,
        paid,
        pay_date: callback
            .parsed_pay_date()
            .map(|d| d.format("%Y-%m-%d %H:%M:%S").to_string()),
    }))
}

//! Order client: order creation and customer order history against the
//! commerce API.

use std::sync::Arc;

use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use spindle_core::{Email, InvoiceId, OrderId, OrderStatus, PaymentStatus, Price, ProductId};
use tracing::instrument;

use super::{ApiError, error_for_response};
use crate::config::CommerceApiConfig;

/// Client for the order side of the commerce API.
#[derive(Clone)]
pub struct OrderClient {
    inner: Arc<OrderClientInner>,
}

struct OrderClientInner {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl OrderClient {
    /// Create a new order client.
    #[must_use]
    pub fn new(config: &CommerceApiConfig) -> Self {
        Self {
            inner: Arc::new(OrderClientInner {
                client: reqwest::Client::new(),
                base_url: config.base_url.clone(),
                api_key: config.api_key.expose_secret().to_string(),
            }),
        }
    }

    /// Create an order. The server re-checks stock; a 409 maps to
    /// [`ApiError::Conflict`].
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Conflict`] if stock changed underneath the
    /// request, or a transport/parse error.
    #[instrument(skip(self, request), fields(lines = request.lines.len()))]
    pub async fn create_order(
        &self,
        request: &OrderCreationRequest,
    ) -> Result<OrderCreated, ApiError> {
        let url = format!("{}/orders", self.inner.base_url);
        let response = self
            .inner
            .client
            .post(&url)
            .bearer_auth(&self.inner.api_key)
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_for_response(response).await);
        }

        response
            .json()
            .await
            .map_err(|e| ApiError::Parse(e.to_string()))
    }

    /// Fetch a single order.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotFound`] if the order does not exist, or a
    /// transport/parse error.
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn get_order(&self, id: OrderId) -> Result<OrderView, ApiError> {
        let url = format!("{}/orders/{id}", self.inner.base_url);
        let response = self
            .inner
            .client
            .get(&url)
            .bearer_auth(&self.inner.api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_for_response(response).await);
        }

        response
            .json()
            .await
            .map_err(|e| ApiError::Parse(e.to_string()))
    }

    /// List a customer's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns a transport/parse error.
    #[instrument(skip(self, email))]
    pub async fn get_orders_by_customer(&self, email: &Email) -> Result<Vec<OrderView>, ApiError> {
        let url = format!(
            "{}/orders?email={}",
            self.inner.base_url,
            urlencoding::encode(email.as_str())
        );
        let response = self
            .inner
            .client
            .get(&url)
            .bearer_auth(&self.inner.api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_for_response(response).await);
        }

        response
            .json()
            .await
            .map_err(|e| ApiError::Parse(e.to_string()))
    }

    /// Cancel an order. Only `PENDING` and `CONFIRMED` orders can be
    /// cancelled; anything else comes back as [`ApiError::Conflict`].
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Conflict`] if the order is past cancellation,
    /// [`ApiError::NotFound`] if it does not exist, or a transport/parse
    /// error.
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn cancel_order(&self, id: OrderId) -> Result<OrderView, ApiError> {
        let url = format!("{}/orders/{id}/cancel", self.inner.base_url);
        let response = self
            .inner
            .client
            .post(&url)
            .bearer_auth(&self.inner.api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_for_response(response).await);
        }

        response
            .json()
            .await
            .map_err(|e| ApiError::Parse(e.to_string()))
    }
}

// =============================================================================
// Request / Response Types
// =============================================================================

/// Delivery details captured by the checkout wizard.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeliveryInfo {
    pub recipient_name: String,
    pub email: Email,
    /// Digits only, 10-11 of them; separators are stripped by validation.
    pub phone: String,
    pub province: String,
    pub district: String,
    pub ward: String,
    pub address: String,
    /// Free-text delivery instructions, shown to the courier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_message: Option<String>,
}

/// One order line sent to the commerce API.
#[derive(Debug, Clone, Serialize)]
pub struct OrderLineRequest {
    pub product_id: ProductId,
    pub quantity: u32,
    /// Unit price the customer saw; the server rejects on mismatch.
    pub unit_price: Price,
    /// Whether this line ships in the rush parcel.
    pub rush: bool,
}

/// Full order creation payload.
#[derive(Debug, Clone, Serialize)]
pub struct OrderCreationRequest {
    pub lines: Vec<OrderLineRequest>,
    pub delivery: DeliveryInfo,
    pub payment_method: String,
    pub subtotal: Price,
    pub vat: Price,
    pub delivery_fee: Price,
    pub total: Price,
}

/// Response to a successful order creation.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderCreated {
    pub order_id: OrderId,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub total: Price,
}

/// An order as returned by reads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderView {
    pub order_id: OrderId,
    /// Set once the server has raised an invoice for the order.
    #[serde(default)]
    pub invoice_id: Option<InvoiceId>,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub subtotal: Price,
    pub vat: Price,
    pub delivery_fee: Price,
    pub total: Price,
    pub created_at: String,
}

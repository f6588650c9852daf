//! Elevated-access client for the commerce API.
//!
//! Drives the server-authoritative order lifecycle (confirm/cancel) and
//! user blocking. The server re-validates every transition; a 409 here
//! means the order moved under us and the caller should re-fetch.

use std::sync::Arc;

use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use spindle_core::{Email, InvoiceId, OrderId, OrderStatus, PaymentStatus, Price, UserId};
use thiserror::Error;
use tracing::instrument;

use crate::config::AdminApiConfig;

/// Errors from the commerce API.
#[derive(Debug, Error)]
pub enum CommerceError {
    /// HTTP transport failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status outside the mapped cases.
    #[error("API error: {status} - {message}")]
    Status { status: u16, message: String },

    /// The entity does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The server refused a state transition.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Undecodable response body.
    #[error("Parse error: {0}")]
    Parse(String),
}

async fn error_for(response: reqwest::Response) -> CommerceError {
    let status = response.status();
    let message = response.text().await.unwrap_or_default();
    match status.as_u16() {
        404 => CommerceError::NotFound(message),
        409 => CommerceError::Conflict(message),
        code => CommerceError::Status {
            status: code,
            message,
        },
    }
}

/// An order as the admin surface sees it.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AdminOrder {
    pub order_id: OrderId,
    /// Set once the server has raised an invoice for the order.
    #[serde(default)]
    pub invoice_id: Option<InvoiceId>,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub customer_name: String,
    pub customer_email: Email,
    pub total: Price,
    pub created_at: String,
    #[serde(default)]
    pub cancel_reason: Option<String>,
}

/// A customer account.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AdminUser {
    pub user_id: UserId,
    pub name: String,
    pub email: Email,
    /// Blocked accounts have this false plus a `blocked_reason`.
    pub is_active: bool,
    #[serde(default)]
    pub blocked_reason: Option<String>,
}

/// Optional filters for the order list.
#[derive(Debug, Clone, Default)]
pub struct OrderListFilter {
    pub status: Option<OrderStatus>,
    pub email: Option<String>,
}

/// Admin client for the commerce API.
#[derive(Clone)]
pub struct AdminClient {
    inner: Arc<AdminClientInner>,
}

struct AdminClientInner {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl AdminClient {
    /// Create a new admin client.
    #[must_use]
    pub fn new(config: &AdminApiConfig) -> Self {
        Self {
            inner: Arc::new(AdminClientInner {
                client: reqwest::Client::new(),
                base_url: config.base_url.clone(),
                api_key: config.api_key.expose_secret().to_string(),
            }),
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: String) -> Result<T, CommerceError> {
        let response = self
            .inner
            .client
            .get(&url)
            .bearer_auth(&self.inner.api_key)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(error_for(response).await);
        }
        response
            .json()
            .await
            .map_err(|e| CommerceError::Parse(e.to_string()))
    }

    async fn post_json<B: Serialize + Sync, T: serde::de::DeserializeOwned>(
        &self,
        url: String,
        body: Option<&B>,
    ) -> Result<T, CommerceError> {
        let mut request = self.inner.client.post(&url).bearer_auth(&self.inner.api_key);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(error_for(response).await);
        }
        response
            .json()
            .await
            .map_err(|e| CommerceError::Parse(e.to_string()))
    }

    /// List orders, optionally filtered by status or customer email.
    ///
    /// # Errors
    ///
    /// Returns a transport/parse error.
    #[instrument(skip(self))]
    pub async fn list_orders(&self, filter: &OrderListFilter) -> Result<Vec<AdminOrder>, CommerceError> {
        let mut url = format!("{}/orders", self.inner.base_url);
        let mut params = Vec::new();
        if let Some(status) = filter.status {
            params.push(format!("status={status}"));
        }
        if let Some(email) = &filter.email {
            params.push(format!("email={}", urlencoding::encode(email)));
        }
        if !params.is_empty() {
            url.push('?');
            url.push_str(&params.join("&"));
        }
        self.get_json(url).await
    }

    /// Fetch one order.
    ///
    /// # Errors
    ///
    /// Returns [`CommerceError::NotFound`] for unknown ids, or a
    /// transport/parse error.
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn get_order(&self, id: OrderId) -> Result<AdminOrder, CommerceError> {
        self.get_json(format!("{}/orders/{id}", self.inner.base_url))
            .await
    }

    /// Confirm a pending order.
    ///
    /// # Errors
    ///
    /// Returns [`CommerceError::Conflict`] if the order is not `PENDING`.
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn confirm_order(&self, id: OrderId) -> Result<AdminOrder, CommerceError> {
        self.post_json::<(), _>(format!("{}/orders/{id}/confirm", self.inner.base_url), None)
            .await
    }

    /// Cancel an order, with an optional operator-entered reason.
    ///
    /// # Errors
    ///
    /// Returns [`CommerceError::Conflict`] unless the order is `PENDING`
    /// or `CONFIRMED`.
    #[instrument(skip(self, reason), fields(order_id = %id))]
    pub async fn cancel_order(
        &self,
        id: OrderId,
        reason: Option<&str>,
    ) -> Result<AdminOrder, CommerceError> {
        #[derive(Serialize)]
        struct CancelBody<'a> {
            #[serde(skip_serializing_if = "Option::is_none")]
            reason: Option<&'a str>,
        }
        self.post_json(
            format!("{}/orders/{id}/cancel", self.inner.base_url),
            Some(&CancelBody { reason }),
        )
        .await
    }

    /// List customer accounts.
    ///
    /// # Errors
    ///
    /// Returns a transport/parse error.
    #[instrument(skip(self))]
    pub async fn list_users(&self) -> Result<Vec<AdminUser>, CommerceError> {
        self.get_json(format!("{}/users", self.inner.base_url)).await
    }

    /// Fetch one customer account.
    ///
    /// # Errors
    ///
    /// Returns [`CommerceError::NotFound`] for unknown ids, or a
    /// transport/parse error.
    #[instrument(skip(self), fields(user_id = %id))]
    pub async fn get_user(&self, id: UserId) -> Result<AdminUser, CommerceError> {
        self.get_json(format!("{}/users/{id}", self.inner.base_url))
            .await
    }

    /// Block a customer account. The reason is recorded and shown to other
    /// operators.
    ///
    /// # Errors
    ///
    /// Returns [`CommerceError::Conflict`] if the account is already
    /// blocked, or a transport/parse error.
    #[instrument(skip(self, reason), fields(user_id = %id))]
    pub async fn block_user(&self, id: UserId, reason: &str) -> Result<AdminUser, CommerceError> {
        #[derive(Serialize)]
        struct BlockBody<'a> {
            reason: &'a str,
        }
        self.post_json(
            format!("{}/users/{id}/block", self.inner.base_url),
            Some(&BlockBody { reason }),
        )
        .await
    }

    /// Reinstate a blocked account.
    ///
    /// # Errors
    ///
    /// Returns [`CommerceError::Conflict`] if the account is active, or a
    /// transport/parse error.
    #[instrument(skip(self), fields(user_id = %id))]
    pub async fn unblock_user(&self, id: UserId) -> Result<AdminUser, CommerceError> {
        self.post_json::<(), _>(format!("{}/users/{id}/unblock", self.inner.base_url), None)
            .await
    }
}

//! Payment gateway client.
//!
//! Gateway payments are a redirect flow: the storefront asks the gateway
//! for a hosted payment URL, sends the customer there, and the gateway
//! calls back to our return URL with the result as query parameters.

use std::sync::Arc;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use spindle_core::{OrderId, Price};
use tracing::instrument;

use super::{ApiError, error_for_response};
use crate::config::PaymentGatewayConfig;

/// Format of the gateway's `pay_date` parameter.
const PAY_DATE_FORMAT: &str = "%Y%m%d%H%M%S";

/// Gateway response code meaning the payment went through.
const RESPONSE_SUCCESS: &str = "00";

/// Client for the hosted payment gateway.
#[derive(Clone)]
pub struct PaymentClient {
    inner: Arc<PaymentClientInner>,
}

struct PaymentClientInner {
    client: reqwest::Client,
    base_url: String,
    return_url: String,
    locale: String,
}

impl PaymentClient {
    /// Create a new payment client.
    #[must_use]
    pub fn new(config: &PaymentGatewayConfig) -> Self {
        Self {
            inner: Arc::new(PaymentClientInner {
                client: reqwest::Client::new(),
                base_url: config.base_url.clone(),
                return_url: config.return_url.clone(),
                locale: config.locale.clone(),
            }),
        }
    }

    /// Ask the gateway for a hosted payment URL for an order.
    ///
    /// # Errors
    ///
    /// Returns a transport/parse error, or [`ApiError::Api`] if the gateway
    /// refuses the request.
    #[instrument(skip(self), fields(order_id = %order_id, amount = amount.as_i64()))]
    pub async fn create_redirect(
        &self,
        order_id: OrderId,
        amount: Price,
    ) -> Result<PaymentRedirect, ApiError> {
        let url = format!("{}/payments/redirect", self.inner.base_url);
        let request = RedirectRequest {
            order_id,
            amount,
            locale: &self.inner.locale,
            return_url: &self.inner.return_url,
        };
        let response = self.inner.client.post(&url).json(&request).send().await?;

        if !response.status().is_success() {
            return Err(error_for_response(response).await);
        }

        response
            .json()
            .await
            .map_err(|e| ApiError::Parse(e.to_string()))
    }
}

#[derive(Debug, Serialize)]
struct RedirectRequest<'a> {
    order_id: OrderId,
    amount: Price,
    locale: &'a str,
    return_url: &'a str,
}

/// A hosted payment URL to send the customer to.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentRedirect {
    pub payment_url: String,
}

/// Query parameters the gateway appends when it redirects the customer
/// back to us.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentReturn {
    pub order_id: OrderId,
    pub amount: Price,
    /// Gateway response code; `"00"` means paid.
    pub status: String,
    /// Local timestamp of the payment, `YYYYMMDDHHMMSS`.
    #[serde(default)]
    pub pay_date: Option<String>,
    /// Gateway-side transaction reference.
    #[serde(default)]
    pub transaction_ref: Option<String>,
}

impl PaymentReturn {
    /// Whether the gateway reported a successful payment.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == RESPONSE_SUCCESS
    }

    /// Parse the gateway's pay date, if present and well-formed.
    #[must_use]
    pub fn parsed_pay_date(&self) -> Option<NaiveDateTime> {
        self.pay_date
            .as_deref()
            .and_then(|s| NaiveDateTime::parse_from_str(s, PAY_DATE_FORMAT).ok())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    fn ret(status: &str, pay_date: Option<&str>) -> PaymentReturn {
        PaymentReturn {
            order_id: OrderId::new(42),
            amount: Price::new(270_000),
            status: status.to_string(),
            pay_date: pay_date.map(str::to_string),
            transaction_ref: None,
        }
    }

    #[test]
    fn test_success_code() {
        assert!(ret("00", None).is_success());
        assert!(!ret("24", None).is_success());
        assert!(!ret("", None).is_success());
    }

    #[test]
    fn test_pay_date_parses() {
        let parsed = ret("00", Some("20250814153000")).parsed_pay_date().unwrap();
        assert_eq!(parsed.year(), 2025);
        assert_eq!(parsed.month(), 8);
        assert_eq!(parsed.hour(), 15);
    }

    #[test]
    fn test_pay_date_garbage_is_none() {
        assert!(ret("00", Some("not-a-date")).parsed_pay_date().is_none());
        assert!(ret("00", None).parsed_pay_date().is_none());
    }

    #[test]
    fn test_return_query_deserializes() {
        let q = "order_id=42&amount=270000&status=00&pay_date=20250814153000";
        let ret: PaymentReturn = serde_urlencoded_like(q);
        assert_eq!(ret.order_id, OrderId::new(42));
        assert!(ret.is_success());
    }

    // Decode an x-www-form-urlencoded string through serde_json to avoid a
    // test-only dependency.
    fn serde_urlencoded_like(query: &str) -> PaymentReturn {
        let mut map = serde_json::Map::new();
        for pair in query.split('&') {
            let (k, v) = pair.split_once('=').unwrap();
            let value = if matches!(k, "order_id" | "amount") {
                serde_json::Value::from(v.parse::<i64>().unwrap())
            } else {
                serde_json::Value::String(v.to_string())
            };
            map.insert(k.to_string(), value);
        }
        serde_json::from_value(serde_json::Value::Object(map)).unwrap()
    }
}

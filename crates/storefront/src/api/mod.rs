//! Clients for the remote commerce API and the payment gateway.
//!
//! All persistence lives behind these HTTP contracts - the storefront holds
//! no database of its own. Each client wraps `reqwest` with typed errors;
//! catalog reads are cached with `moka`.

pub mod catalog;
pub mod orders;
pub mod payments;

pub use catalog::CatalogClient;
pub use orders::OrderClient;
pub use payments::PaymentClient;

use thiserror::Error;

/// Errors from the remote commerce API or payment gateway.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP transport failed (connection, timeout, etc.).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API returned a non-success status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// The requested entity does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The server rejected a state transition (e.g. confirming a
    /// non-pending order). Callers should refresh their view.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The response body could not be decoded.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Convert a non-success response into the matching [`ApiError`].
///
/// Reads the body for the error message, so the response is consumed.
pub(crate) async fn error_for_response(response: reqwest::Response) -> ApiError {
    let status = response.status();
    let message = response.text().await.unwrap_or_default();
    match status.as_u16() {
        404 => ApiError::NotFound(message),
        409 => ApiError::Conflict(message),
        code => ApiError::Api {
            status: code,
            message,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ApiError::Api {
            status: 500,
            message: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "API error: 500 - boom");

        let err = ApiError::Conflict("order already confirmed".to_string());
        assert_eq!(err.to_string(), "Conflict: order already confirmed");
    }
}

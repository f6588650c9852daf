//! Order and payment status state machines.
//!
//! The server is the final authority on every transition; these enums mirror
//! its rules so UI surfaces can gate actions (`can_confirm`, `can_cancel`)
//! without guessing. The guards are recomputed from the order's current
//! status on every use - never cached.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A status transition that the state machine does not allow.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    /// `confirm` called on a non-pending order.
    #[error("only PENDING orders can be confirmed (current status: {0})")]
    NotConfirmable(OrderStatus),
    /// `cancel` called on an order past the cancellable window.
    #[error("order cannot be cancelled in status {0}")]
    NotCancellable(OrderStatus),
}

/// Order fulfillment lifecycle.
///
/// Forward-only happy path `PENDING -> CONFIRMED -> PROCESSING -> SHIPPED ->
/// DELIVERED`, with `CANCELLED` reachable from `PENDING` and `CONFIRMED`
/// only. Cancellation is irreversible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Whether `confirm` would be accepted by the server.
    #[must_use]
    pub const fn can_confirm(&self) -> bool {
        matches!(self, Self::Pending)
    }

    /// Whether `cancel` would be accepted by the server.
    #[must_use]
    pub const fn can_cancel(&self) -> bool {
        matches!(self, Self::Pending | Self::Confirmed)
    }

    /// Whether the order can make no further progress.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }

    /// Transition to `CONFIRMED`.
    ///
    /// # Errors
    ///
    /// Rejected unless the current status is `PENDING`.
    pub const fn confirm(self) -> Result<Self, TransitionError> {
        if self.can_confirm() {
            Ok(Self::Confirmed)
        } else {
            Err(TransitionError::NotConfirmable(self))
        }
    }

    /// Transition to `CANCELLED`.
    ///
    /// # Errors
    ///
    /// Rejected unless the current status is `PENDING` or `CONFIRMED`.
    pub const fn cancel(self) -> Result<Self, TransitionError> {
        if self.can_cancel() {
            Ok(Self::Cancelled)
        } else {
            Err(TransitionError::NotCancellable(self))
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "PENDING",
            Self::Confirmed => "CONFIRMED",
            Self::Processing => "PROCESSING",
            Self::Shipped => "SHIPPED",
            Self::Delivered => "DELIVERED",
            Self::Cancelled => "CANCELLED",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "CONFIRMED" => Ok(Self::Confirmed),
            "PROCESSING" => Ok(Self::Processing),
            "SHIPPED" => Ok(Self::Shipped),
            "DELIVERED" => Ok(Self::Delivered),
            "CANCELLED" => Ok(Self::Cancelled),
            _ => Err(format!("invalid order status: {s}")),
        }
    }
}

/// Invoice payment status, owned by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Failed,
    Refunded,
    Cancelled,
}

impl PaymentStatus {
    /// Whether the invoice has been settled.
    #[must_use]
    pub const fn is_paid(&self) -> bool {
        matches!(self, Self::Paid)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_confirm_only_from_pending() {
        assert_eq!(
            OrderStatus::Pending.confirm().unwrap(),
            OrderStatus::Confirmed
        );
        assert!(matches!(
            OrderStatus::Confirmed.confirm(),
            Err(TransitionError::NotConfirmable(OrderStatus::Confirmed))
        ));
        assert!(OrderStatus::Cancelled.confirm().is_err());
        assert!(OrderStatus::Shipped.confirm().is_err());
    }

    #[test]
    fn test_cancel_window() {
        assert_eq!(
            OrderStatus::Pending.cancel().unwrap(),
            OrderStatus::Cancelled
        );
        assert_eq!(
            OrderStatus::Confirmed.cancel().unwrap(),
            OrderStatus::Cancelled
        );
        assert!(OrderStatus::Processing.cancel().is_err());
        assert!(OrderStatus::Shipped.cancel().is_err());
        assert!(OrderStatus::Delivered.cancel().is_err());
        assert!(OrderStatus::Cancelled.cancel().is_err());
    }

    #[test]
    fn test_guards_match_transitions() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Confirmed,
            OrderStatus::Processing,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
            OrderStatus::Cancelled,
        ] {
            assert_eq!(status.can_confirm(), status.confirm().is_ok());
            assert_eq!(status.can_cancel(), status.cancel().is_ok());
        }
    }

    #[test]
    fn test_terminal_states() {
        assert!(OrderStatus::Delivered.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
        assert!(!OrderStatus::Pending.is_terminal());
    }

    #[test]
    fn test_serde_screaming_snake() {
        let json = serde_json::to_string(&OrderStatus::Processing).unwrap();
        assert_eq!(json, "\"PROCESSING\"");
        let back: OrderStatus = serde_json::from_str("\"CANCELLED\"").unwrap();
        assert_eq!(back, OrderStatus::Cancelled);
    }

    #[test]
    fn test_display_from_str_roundtrip() {
        let status: OrderStatus = "SHIPPED".parse().unwrap();
        assert_eq!(status, OrderStatus::Shipped);
        assert_eq!(status.to_string(), "SHIPPED");
        assert!("shipped".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_payment_status() {
        assert!(PaymentStatus::Paid.is_paid());
        assert!(!PaymentStatus::Pending.is_paid());
        let json = serde_json::to_string(&PaymentStatus::Refunded).unwrap();
        assert_eq!(json, "\"REFUNDED\"");
    }
}

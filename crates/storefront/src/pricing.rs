//! Pricing calculator.
//!
//! Pure function of the cart lines and the delivery selection. All currency
//! arithmetic is in whole VND; the only rounding point is the VAT step,
//! which rounds half-up.

use serde::Serialize;
use spindle_core::Price;

use crate::checkout::wizard::DeliverySelection;
use crate::config::PricingConfig;
use crate::models::CartLine;

/// Priced breakdown of a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Quote {
    pub subtotal: Price,
    pub vat: Price,
    pub delivery_fee: Price,
    pub total: Price,
}

impl Quote {
    /// The all-zero quote for an empty cart.
    pub const EMPTY: Self = Self {
        subtotal: Price::ZERO,
        vat: Price::ZERO,
        delivery_fee: Price::ZERO,
        total: Price::ZERO,
    };
}

/// Price a cart against a delivery selection.
///
/// Rush delivery splits the order into two parcels: rush-eligible lines
/// ship rush, the rest ship regular, and each non-empty parcel is charged
/// its own fee. An empty cart prices to zero across the board.
#[must_use]
pub fn quote(lines: &[CartLine], delivery: &DeliverySelection, config: &PricingConfig) -> Quote {
    if lines.is_empty() {
        return Quote::EMPTY;
    }

    let subtotal: Price = lines.iter().map(CartLine::line_total).sum();
    let vat = subtotal.percent_round_half_up(config.vat_percent);
    let delivery_fee = delivery_fee(lines, delivery.rush_requested, config);

    Quote {
        subtotal,
        vat,
        delivery_fee,
        total: subtotal + vat + delivery_fee,
    }
}

/// Delivery fee under the mixed-eligibility rush policy.
fn delivery_fee(lines: &[CartLine], rush_requested: bool, config: &PricingConfig) -> Price {
    if !rush_requested {
        return config.regular_fee;
    }

    let any_rush = lines.iter().any(|l| l.product.rush_eligible);
    let any_regular = lines.iter().any(|l| !l.product.rush_eligible);
    match (any_rush, any_regular) {
        // Two parcels, charged independently
        (true, true) => config.rush_fee + config.regular_fee,
        (true, false) => config.rush_fee,
        // Rush requested but nothing qualifies
        (false, _) => config.regular_fee,
    }
}

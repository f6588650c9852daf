//! Normalized product representation.
//!
//! The catalog wire payload is loose (legacy field names, kind-specific
//! credit fields); everything past the API boundary uses this one shape.

use serde::{Deserialize, Serialize};
use spindle_core::{Price, ProductId, ProductKind};

/// A catalog product as the storefront sees it.
///
/// Immutable from the cart's perspective - the catalog owns it. Cart lines
/// hold a snapshot taken at add-time; the submission pipeline re-fetches and
/// re-checks against the live catalog before any order is created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    /// Unit price in whole VND.
    pub price: Price,
    /// Quantity currently in stock.
    pub available: u32,
    pub kind: ProductKind,
    /// Whether this product may ship in the rush parcel.
    pub rush_eligible: bool,
    /// Who made it: author, artist or director depending on `kind`.
    pub credit: Option<String>,
    /// Shipping weight in kilograms. Carried through; nothing here computes
    /// with it.
    pub weight_kg: Option<f32>,
    /// Physical dimensions, e.g. "20x15x3 cm". Carried through.
    pub dimensions: Option<String>,
}

impl Product {
    /// Whether `requested` units could be fulfilled from current stock.
    #[must_use]
    pub const fn has_stock(&self, requested: u32) -> bool {
        self.available >= requested
    }

    /// Total price for a requested quantity.
    #[must_use]
    pub const fn line_total(&self, quantity: u32) -> Price {
        self.price.times(quantity)
    }
}


#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::test_support::book;

    #[test]
    fn test_has_stock() {
        let p = book(1, 100_000, 3, false);
        assert!(p.has_stock(3));
        assert!(!p.has_stock(4));
    }

    #[test]
    fn test_line_total() {
        let p = book(1, 120_000, 10, false);
        assert_eq!(p.line_total(2).as_i64(), 240_000);
    }
}

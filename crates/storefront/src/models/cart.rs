//! Stock-aware cart store.
//!
//! The cart is deliberately permissive: it never rejects a quantity for
//! exceeding stock. The authoritative check lives server-side at order
//! creation; the storefront surfaces warnings in between (see
//! `checkout::submit::validate_against_stock`).

use serde::{Deserialize, Serialize};
use spindle_core::{Price, ProductId};

use super::Product;

/// One cart entry: a unique product and its requested quantity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    /// Snapshot of the product taken at add-time.
    pub product: Product,
    /// Requested quantity, always >= 1 while the line exists.
    pub quantity: u32,
}

impl CartLine {
    /// Total price of this line.
    #[must_use]
    pub const fn line_total(&self) -> Price {
        self.product.price.times(self.quantity)
    }

    /// Whether the requested quantity exceeds the snapshot's stock.
    #[must_use]
    pub const fn over_stock(&self) -> bool {
        self.quantity > self.product.available
    }
}

/// Ordered collection of cart lines, deduplicated by product id.
///
/// `subtotal` and `item_count` are derived on every call, never stored, so
/// they cannot drift from the lines.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// Add a product to the cart.
    ///
    /// If a line for this product already exists its quantity is
    /// incremented; otherwise a new line is appended. No stock check here -
    /// over-stock quantities are allowed and warned about later.
    pub fn add_item(&mut self, product: Product, quantity: u32) {
        if quantity == 0 {
            return;
        }
        if let Some(line) = self.lines.iter_mut().find(|l| l.product.id == product.id) {
            line.quantity += quantity;
        } else {
            self.lines.push(CartLine { product, quantity });
        }
    }

    /// Replace a line's quantity. A quantity of zero removes the line.
    pub fn update_quantity(&mut self, product_id: ProductId, quantity: u32) {
        if quantity == 0 {
            self.remove_item(product_id);
            return;
        }
        if let Some(line) = self.lines.iter_mut().find(|l| l.product.id == product_id) {
            line.quantity = quantity;
        }
    }

    /// Remove a line. No-op if the product is not in the cart.
    pub fn remove_item(&mut self, product_id: ProductId) {
        self.lines.retain(|l| l.product.id != product_id);
    }

    /// Empty the cart. Used after successful order placement.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Quantity of a product in the cart; 0 when absent.
    #[must_use]
    pub fn item_quantity(&self, product_id: ProductId) -> u32 {
        self.lines
            .iter()
            .find(|l| l.product.id == product_id)
            .map_or(0, |l| l.quantity)
    }

    /// All lines, in insertion order.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Sum of line totals.
    #[must_use]
    pub fn subtotal(&self) -> Price {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// Sum of line quantities.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// Whether the cart holds no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::models::product::test_support::book;

    fn invariants_hold(cart: &Cart) {
        let expected_count: u32 = cart.lines().iter().map(|l| l.quantity).sum();
        let expected_subtotal: i64 = cart
            .lines()
            .iter()
            .map(|l| l.product.price.as_i64() * i64::from(l.quantity))
            .sum();
        assert_eq!(cart.item_count(), expected_count);
        assert_eq!(cart.subtotal().as_i64(), expected_subtotal);
    }

    #[test]
    fn test_add_merges_by_product_id() {
        let mut cart = Cart::default();
        cart.add_item(book(1, 100_000, 10, false), 2);
        cart.add_item(book(1, 100_000, 10, false), 3);
        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.item_quantity(ProductId::new(1)), 5);
        invariants_hold(&cart);
    }

    #[test]
    fn test_derived_fields_after_every_operation() {
        let mut cart = Cart::default();
        cart.add_item(book(1, 100_000, 10, false), 2);
        invariants_hold(&cart);
        cart.add_item(book(2, 250_000, 5, true), 1);
        invariants_hold(&cart);
        cart.update_quantity(ProductId::new(1), 7);
        invariants_hold(&cart);
        cart.remove_item(ProductId::new(2));
        invariants_hold(&cart);
        assert_eq!(cart.subtotal(), Price::new(700_000));
        assert_eq!(cart.item_count(), 7);
    }

    #[test]
    fn test_update_to_zero_removes_line() {
        let mut cart = Cart::default();
        cart.add_item(book(1, 100_000, 10, false), 2);
        cart.update_quantity(ProductId::new(1), 0);
        assert!(cart.is_empty());
        assert_eq!(cart.item_quantity(ProductId::new(1)), 0);
    }

    #[test]
    fn test_absent_product_is_quiet() {
        let mut cart = Cart::default();
        assert_eq!(cart.item_quantity(ProductId::new(99)), 0);
        cart.remove_item(ProductId::new(99));
        cart.update_quantity(ProductId::new(99), 3);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_over_stock_allowed_but_flagged() {
        let mut cart = Cart::default();
        cart.add_item(book(1, 100_000, 2, false), 5);
        assert_eq!(cart.item_quantity(ProductId::new(1)), 5);
        assert!(cart.lines().first().unwrap().over_stock());
    }

    #[test]
    fn test_clear() {
        let mut cart = Cart::default();
        cart.add_item(book(1, 100_000, 10, false), 2);
        cart.clear();
        assert!(cart.is_empty());
        assert_eq!(cart.subtotal(), Price::ZERO);
        assert_eq!(cart.item_count(), 0);
    }

    #[test]
    fn test_add_zero_quantity_is_noop() {
        let mut cart = Cart::default();
        cart.add_item(book(1, 100_000, 10, false), 0);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_insertion_order_preserved() {
        let mut cart = Cart::default();
        cart.add_item(book(2, 1000, 5, false), 1);
        cart.add_item(book(1, 1000, 5, false), 1);
        cart.add_item(book(2, 1000, 5, false), 1);
        let ids: Vec<i64> = cart.lines().iter().map(|l| l.product.id.as_i64()).collect();
        assert_eq!(ids, vec![2, 1]);
    }
}

//! Session cart.
//!
//! The cart is an ordered list of lines serialized into the session under
//! [`keys::CART`](super::session::keys::CART). Each line captures the unit
//! price at the moment the product was first added; later price changes in
//! the catalog do not affect the cart total.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use greenshop_core::{Price, ProductId};

use super::catalog::ProductSummary;

/// One product in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub quantity: u32,
    /// Unit price captured when the line was created.
    pub price: Decimal,
}

impl CartLine {
    /// Captured price multiplied by quantity.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

/// Session-backed shopping cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// Largest quantity accepted by a single add/update request.
    pub const MAX_QUANTITY: u32 = 99;

    /// Add `quantity` of a product, or set it when `replace` is true.
    ///
    /// A new line starts at quantity zero with `unit_price` captured. With
    /// `replace` the quantity becomes `max(1, quantity)`.
    pub fn add(&mut self, product_id: ProductId, unit_price: Decimal, quantity: u32, replace: bool) {
        let index = if let Some(index) = self.position(product_id) {
            index
        } else {
            self.lines.push(CartLine {
                product_id,
                quantity: 0,
                price: unit_price,
            });
            self.lines.len() - 1
        };

        if let Some(line) = self.lines.get_mut(index) {
            line.quantity = if replace {
                quantity.max(1)
            } else {
                line.quantity.saturating_add(quantity)
            };
        }
    }

    /// Remove a product's line. Returns whether anything was removed.
    pub fn remove(&mut self, product_id: ProductId) -> bool {
        let before = self.lines.len();
        self.lines.retain(|line| line.product_id != product_id);
        self.lines.len() != before
    }

    /// Drop every line.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Total number of units (sum of quantities).
    #[must_use]
    pub fn len(&self) -> u32 {
        self.lines
            .iter()
            .fold(0_u32, |acc, line| acc.saturating_add(line.quantity))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Sum of captured price times quantity over all lines.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.lines.iter().map(CartLine::total).sum()
    }

    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Product ids in insertion order.
    #[must_use]
    pub fn product_ids(&self) -> Vec<ProductId> {
        self.lines.iter().map(|line| line.product_id).collect()
    }

    /// Quantity for a product, if it is in the cart.
    #[must_use]
    pub fn quantity_of(&self, product_id: ProductId) -> Option<u32> {
        self.position(product_id)
            .and_then(|index| self.lines.get(index))
            .map(|line| line.quantity)
    }

    /// Join the lines against loaded products, skipping products that no
    /// longer exist.
    #[must_use]
    pub fn resolve(&self, products: &[ProductSummary]) -> Vec<CartItem> {
        self.lines
            .iter()
            .filter_map(|line| {
                products
                    .iter()
                    .find(|summary| summary.product.id == line.product_id)
                    .map(|summary| CartItem {
                        product: summary.clone(),
                        quantity: line.quantity,
                        unit_price: line.price,
                        line_total: line.total(),
                    })
            })
            .collect()
    }

    fn position(&self, product_id: ProductId) -> Option<usize> {
        self.lines
            .iter()
            .position(|line| line.product_id == product_id)
    }
}

/// A cart line joined with its product, ready for display.
#[derive(Debug, Clone)]
pub struct CartItem {
    pub product: ProductSummary,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub line_total: Decimal,
}

impl CartItem {
    #[must_use]
    pub fn unit_price_display(&self) -> String {
        Price::store(self.unit_price).display()
    }

    #[must_use]
    pub fn line_total_display(&self) -> String {
        Price::store(self.line_total).display()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::models::catalog::tests::summary;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_add_accumulates_quantity() {
        let mut cart = Cart::default();
        cart.add(ProductId::new(1), dec("100.00"), 2, false);
        cart.add(ProductId::new(1), dec("100.00"), 3, false);
        assert_eq!(cart.quantity_of(ProductId::new(1)), Some(5));
        assert_eq!(cart.lines().len(), 1);
    }

    #[test]
    fn test_replace_overwrites_quantity() {
        let mut cart = Cart::default();
        cart.add(ProductId::new(1), dec("100.00"), 4, false);
        cart.add(ProductId::new(1), dec("100.00"), 2, true);
        assert_eq!(cart.quantity_of(ProductId::new(1)), Some(2));
    }

    #[test]
    fn test_replace_with_zero_keeps_one() {
        let mut cart = Cart::default();
        cart.add(ProductId::new(1), dec("10.00"), 0, true);
        assert_eq!(cart.quantity_of(ProductId::new(1)), Some(1));
    }

    #[test]
    fn test_price_is_captured_on_first_add() {
        let mut cart = Cart::default();
        cart.add(ProductId::new(1), dec("100.00"), 1, false);
        cart.add(ProductId::new(1), dec("150.00"), 1, false);
        assert_eq!(cart.total(), dec("200.00"));
    }

    #[test]
    fn test_remove_missing_is_noop() {
        let mut cart = Cart::default();
        cart.add(ProductId::new(1), dec("10.00"), 1, false);
        assert!(!cart.remove(ProductId::new(2)));
        assert_eq!(cart.len(), 1);
        assert!(cart.remove(ProductId::new(1)));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_len_and_total() {
        let mut cart = Cart::default();
        cart.add(ProductId::new(1), dec("2499.00"), 2, false);
        cart.add(ProductId::new(2), dec("290.50"), 3, false);
        assert_eq!(cart.len(), 5);
        assert_eq!(cart.total(), dec("5869.50"));
    }

    #[test]
    fn test_clear() {
        let mut cart = Cart::default();
        cart.add(ProductId::new(1), dec("1.00"), 1, false);
        cart.clear();
        assert!(cart.is_empty());
        assert_eq!(cart.total(), Decimal::ZERO);
    }

    #[test]
    fn test_quantity_saturates() {
        let mut cart = Cart::default();
        cart.add(ProductId::new(1), dec("1.00"), u32::MAX, false);
        cart.add(ProductId::new(1), dec("1.00"), 5, false);
        assert_eq!(cart.quantity_of(ProductId::new(1)), Some(u32::MAX));
    }

    #[test]
    fn test_serializes_price_as_string() {
        let mut cart = Cart::default();
        cart.add(ProductId::new(3), dec("1890.00"), 1, false);
        let json = serde_json::to_value(&cart).unwrap();
        assert_eq!(
            json,
            serde_json::json!([{"product_id": 3, "quantity": 1, "price": "1890.00"}])
        );
        let back: Cart = serde_json::from_value(json).unwrap();
        assert_eq!(back, cart);
    }

    #[test]
    fn test_resolve_skips_missing_products_and_uses_captured_price() {
        let mut cart = Cart::default();
        cart.add(ProductId::new(1), dec("100.00"), 2, false);
        cart.add(ProductId::new(2), dec("50.00"), 1, false);

        // Product 1 now costs more; product 2 was deleted.
        let products = vec![summary(1, "Bamboo brush", "120.00")];
        let items = cart.resolve(&products);

        assert_eq!(items.len(), 1);
        let item = items.first().unwrap();
        assert_eq!(item.unit_price, dec("100.00"));
        assert_eq!(item.line_total, dec("200.00"));
        assert_eq!(item.line_total_display(), "200.00 ₽");
    }
}

//! Type-safe price representation using decimal arithmetic.
//!
//! Amounts are `rust_decimal::Decimal` in the currency's standard unit
//! (roubles, not kopecks). Prices are always shown with two decimal places.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A price with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit.
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// Create a price in the store currency.
    #[must_use]
    pub fn store(amount: Decimal) -> Self {
        Self::new(amount, CurrencyCode::default())
    }

    /// Format just the amount with two decimal places (e.g., `"2499.00"`).
    #[must_use]
    pub fn format_amount(amount: Decimal) -> String {
        format!("{:.2}", amount.round_dp(2))
    }

    /// Format for display (e.g., `"2499.00 ₽"` or `"$19.99"`).
    #[must_use]
    pub fn display(&self) -> String {
        let amount = Self::format_amount(self.amount);
        let symbol = self.currency_code.symbol();
        if self.currency_code.symbol_is_prefix() {
            format!("{symbol}{amount}")
        } else {
            format!("{amount} {symbol}")
        }
    }
}

impl std::fmt::Display for Price {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.display())
    }
}

/// ISO 4217 currency codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    RUB,
    USD,
    EUR,
}

impl CurrencyCode {
    /// Currency symbol.
    #[must_use]
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::RUB => "₽",
            Self::USD => "$",
            Self::EUR => "€",
        }
    }

    /// Whether the symbol is written before the amount.
    #[must_use]
    pub const fn symbol_is_prefix(&self) -> bool {
        matches!(self, Self::USD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_amount_pads_to_two_places() {
        assert_eq!(Price::format_amount(Decimal::new(2499, 0)), "2499.00");
        assert_eq!(Price::format_amount(Decimal::new(1095, 1)), "109.50");
        assert_eq!(Price::format_amount(Decimal::ZERO), "0.00");
    }

    #[test]
    fn test_format_amount_rounds() {
        assert_eq!(Price::format_amount(Decimal::new(10_005, 3)), "10.00");
        assert_eq!(Price::format_amount(Decimal::new(10_015, 3)), "10.02");
    }

    #[test]
    fn test_display_store_currency() {
        let price = Price::store(Decimal::new(189_000, 2));
        assert_eq!(price.display(), "1890.00 ₽");
        assert_eq!(price.to_string(), "1890.00 ₽");
    }

    #[test]
    fn test_display_prefix_currency() {
        let price = Price::new(Decimal::new(1999, 2), CurrencyCode::USD);
        assert_eq!(price.display(), "$19.99");
    }
}

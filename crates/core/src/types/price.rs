//! Type-safe price representation using decimal arithmetic.

use core::fmt;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// A price with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (e.g., rupees, not paise).
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

    /// Create a price in the store currency (INR).
    #[must_use]
    pub const fn inr(amount: Decimal) -> Self {
        Self::new(amount, CurrencyCode::INR)
    }

    /// Format for display, e.g. `₹1,299` or `₹1,23,456.50`.
    ///
    /// Whole amounts drop the fractional part; other amounts are rounded to
    /// two places. INR uses lakh grouping (last three digits, then pairs).
    #[must_use]
    pub fn display(&self) -> String {
        let rounded = self
            .amount
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
            "-"
        } else {
            ""
        };
        let abs = rounded.abs();
        let whole = abs.trunc();
        let fraction = abs - whole;

        let grouped = group_lakh(&whole.to_string());

        if fraction.is_zero() {
            format!("{sign}{}{grouped}", self.currency_code.symbol())
        } else {
            let cents = (fraction * Decimal::ONE_HUNDRED)
                .trunc()
                .to_u32()
                .unwrap_or_default();
            format!("{sign}{}{grouped}.{cents:02}", self.currency_code.symbol())
        }
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

/// ISO 4217 currency codes the store trades in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    INR,
}

impl CurrencyCode {
    /// Currency symbol used in customer-facing text.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::INR => "₹",
        }
    }

    /// ISO 4217 code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::INR => "INR",
        }
    }
}

/// Group digits as 1,23,45,678.
fn group_lakh(digits: &str) -> String {
    if digits.len() <= 3 {
        return digits.to_owned();
    }
    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut pairs: Vec<&str> = Vec::new();
    let mut end = head.len();
    while end > 0 {
        let start = end.saturating_sub(2);
        pairs.push(head.get(start..end).unwrap_or_default());
        end = start;
    }
    pairs.reverse();
    format!("{},{tail}", pairs.join(","))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_whole_rupees() {
        assert_eq!(Price::inr(Decimal::new(499, 0)).display(), "₹499");
        assert_eq!(Price::inr(Decimal::new(1299, 0)).display(), "₹1,299");
    }

    #[test]
    fn test_display_lakh_grouping() {
        assert_eq!(Price::inr(Decimal::new(123_456, 0)).display(), "₹1,23,456");
        assert_eq!(
            Price::inr(Decimal::new(12_345_678, 0)).display(),
            "₹1,23,45,678"
        );
    }

    #[test]
    fn test_display_fraction() {
        assert_eq!(Price::inr(Decimal::new(129_950, 2)).display(), "₹1,299.50");
        assert_eq!(Price::inr(Decimal::new(1_000, 2)).display(), "₹10");
    }

    #[test]
    fn test_currency_code() {
        assert_eq!(CurrencyCode::default().code(), "INR");
        assert_eq!(Price::inr(Decimal::ONE).currency_code, CurrencyCode::INR);
    }

    #[test]
    fn test_display_zero() {
        assert_eq!(Price::inr(Decimal::ZERO).display(), "₹0");
    }
}

//! Type-safe price representation using decimal arithmetic.
//!
//! Prices arrive from the remote API either as JSON numbers or as strings.
//! Both are parsed into a [`Decimal`] so line totals never accumulate
//! floating point error. Arithmetic saturates at the `Decimal` bounds
//! instead of panicking.

use core::fmt;
use core::ops::{Add, Mul, Sub};
use core::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A non-currency-tagged price in the store's single currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// Zero.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Create a price from an integer amount of cents.
    #[must_use]
    pub const fn from_cents(cents: i64) -> Self {
        // `Decimal::new` is not `const`; build the same value from raw parts.
        let abs = cents.unsigned_abs();
        #[allow(clippy::cast_possible_truncation)]
        Self(Decimal::from_parts(
            abs as u32,
            (abs >> 32) as u32,
            0,
            cents < 0,
            2,
        ))
    }

    /// Get the decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Parse a price out of a loosely-typed JSON value.
    ///
    /// Accepts numbers and numeric strings; anything else yields `None`.
    #[must_use]
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Number(n) => Decimal::from_str(&n.to_string())
                .or_else(|_| Decimal::from_scientific(&n.to_string()))
                .ok()
                .map(Self),
            serde_json::Value::String(s) => Decimal::from_str(s.trim()).ok().map(Self),
            _ => None,
        }
    }

    /// Multiply by a line quantity.
    #[must_use]
    pub fn times(self, quantity: u32) -> Self {
        Self(self.0.saturating_mul(Decimal::from(quantity)))
    }

    /// Format for display, e.g. `$19.99`.
    #[must_use]
    pub fn display(&self) -> String {
        format!("${:.2}", self.0.round_dp(2))
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

impl From<Decimal> for Price {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl Sub for Price {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }
}

impl Mul<u32> for Price {
    type Output = Self;

    fn mul(self, rhs: u32) -> Self {
        self.times(rhs)
    }
}

impl core::iter::Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_cents() {
        assert_eq!(Price::from_cents(9999).amount(), Decimal::new(9999, 2));
        assert_eq!(Price::from_cents(-150).amount(), Decimal::new(-150, 2));
    }

    #[test]
    fn test_from_json_number_and_string() {
        assert_eq!(Price::from_json(&json!(12.5)), Some(Price::new(Decimal::new(125, 1))));
        assert_eq!(Price::from_json(&json!("7.25")), Some(Price::new(Decimal::new(725, 2))));
        assert_eq!(Price::from_json(&json!(null)), None);
        assert_eq!(Price::from_json(&json!("abc")), None);
    }

    #[test]
    fn test_times_and_sum() {
        let total: Price = [Price::from_cents(1000).times(2), Price::from_cents(250)]
            .into_iter()
            .sum();
        assert_eq!(total, Price::from_cents(2250));
    }

    #[test]
    fn test_overflow_saturates() {
        let max = Price::new(Decimal::MAX);
        assert_eq!(max.times(u32::MAX), max);
        assert_eq!(max + Price::from_cents(1), max);
        assert_eq!(Price::new(Decimal::MIN) - max, Price::new(Decimal::MIN));
        let total: Price = [max, max, Price::from_cents(100)].into_iter().sum();
        assert_eq!(total, max);
    }

    #[test]
    fn test_display_rounds_to_cents() {
        assert_eq!(Price::from_cents(9999).display(), "$99.99");
        assert_eq!(Price::new(Decimal::from(5)).to_string(), "$5.00");
    }

    #[test]
    fn test_serde_round_trip_is_string() {
        let price = Price::from_cents(1999);
        let encoded = serde_json::to_string(&price).unwrap();
        assert_eq!(encoded, "\"19.99\"");
        let decoded: Price = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, price);
    }
}

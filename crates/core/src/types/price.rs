//! Price snapshots stored on cart and order lines.
//!
//! Prices are `NUMERIC(8, 2)` in the database: never negative, at most two
//! fraction digits, at most eight digits overall. [`Price`] enforces the same
//! shape in memory so a value that parses here always fits its column.

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::quantity::Quantity;

/// Errors that can occur when building a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The input is not a decimal number.
    #[error("price is not a valid decimal: {0}")]
    Invalid(String),
    /// The amount is below zero.
    #[error("price cannot be negative")]
    Negative,
    /// The amount has more than two fraction digits.
    #[error("price must have at most {max} decimal places")]
    TooPrecise {
        /// Maximum fraction digits.
        max: u32,
    },
    /// The amount does not fit in eight digits.
    #[error("price must be below {max}")]
    TooLarge {
        /// Exclusive upper bound.
        max: Decimal,
    },
}

/// A non-negative monetary amount with two fraction digits.
///
/// ## Examples
///
/// ```
/// use cartwright_core::{Price, Quantity};
/// use rust_decimal::Decimal;
///
/// let price = Price::parse("9.99").unwrap();
/// let three = Quantity::new(3).unwrap();
/// assert_eq!(price.line_total(three), Decimal::new(2997, 2));
///
/// assert!(Price::parse("-1").is_err());
/// assert!(Price::parse("0.001").is_err());
/// assert!(Price::parse("1000000").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Price(Decimal);

impl Price {
    /// Fraction digits kept on every price.
    pub const SCALE: u32 = 2;

    /// Total digits allowed (`NUMERIC(8, 2)`).
    pub const MAX_DIGITS: u32 = 8;

    /// A price of zero.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Validate and normalize a decimal amount to two fraction digits.
    ///
    /// # Errors
    ///
    /// Returns an error if the amount is negative, has more than two
    /// significant fraction digits, or needs more than eight digits.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative);
        }

        let normalized = amount.normalize();
        if normalized.scale() > Self::SCALE {
            return Err(PriceError::TooPrecise { max: Self::SCALE });
        }

        let max = Self::upper_bound();
        if normalized >= max {
            return Err(PriceError::TooLarge { max });
        }

        let mut value = normalized;
        value.rescale(Self::SCALE);
        Ok(Self(value))
    }

    /// Parse a price from its decimal string form (e.g. `"19.90"`).
    ///
    /// # Errors
    ///
    /// Returns `PriceError::Invalid` for non-numeric input, or any error
    /// [`Price::new`] reports.
    pub fn parse(s: &str) -> Result<Self, PriceError> {
        let amount = s
            .trim()
            .parse::<Decimal>()
            .map_err(|e| PriceError::Invalid(e.to_string()))?;
        Self::new(amount)
    }

    /// Build a price from an integer number of cents.
    ///
    /// # Errors
    ///
    /// Returns an error if the amount is negative or too large.
    pub fn from_cents(cents: i64) -> Result<Self, PriceError> {
        Self::new(Decimal::new(cents, Self::SCALE))
    }

    /// The amount as a decimal with scale 2.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Price times quantity for one cart or order line.
    #[must_use]
    pub fn line_total(&self, quantity: Quantity) -> Decimal {
        self.0 * Decimal::from(quantity.get())
    }

    fn upper_bound() -> Decimal {
        // 10^(8 - 2): the first value needing a seventh integer digit.
        Decimal::from(10_i64.pow(Self::MAX_DIGITS - Self::SCALE))
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Price {
    type Err = PriceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<Decimal> for Price {
    type Error = PriceError;

    fn try_from(amount: Decimal) -> Result<Self, Self::Error> {
        Self::new(amount)
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self {
        price.0
    }
}

// SQLx support (with postgres feature)
#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Price {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <Decimal as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <Decimal as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Price {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let amount = <Decimal as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self::new(amount)?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Price {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <Decimal as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_normalizes_to_two_places() {
        let price = Price::parse("10").unwrap();
        assert_eq!(price.to_string(), "10.00");

        let price = Price::parse("9.9").unwrap();
        assert_eq!(price.to_string(), "9.90");
    }

    #[test]
    fn test_trailing_zeros_do_not_count_as_precision() {
        let price = Price::parse("9.990").unwrap();
        assert_eq!(price.amount(), Decimal::new(999, 2));
    }

    #[test]
    fn test_parse_rejects_negative() {
        assert_eq!(Price::parse("-0.01"), Err(PriceError::Negative));
    }

    #[test]
    fn test_parse_rejects_extra_precision() {
        assert!(matches!(
            Price::parse("1.005"),
            Err(PriceError::TooPrecise { max: 2 })
        ));
    }

    #[test]
    fn test_upper_bound() {
        assert!(Price::parse("999999.99").is_ok());
        assert!(matches!(
            Price::parse("1000000.00"),
            Err(PriceError::TooLarge { .. })
        ));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(Price::parse("cheap"), Err(PriceError::Invalid(_))));
    }

    #[test]
    fn test_line_total() {
        let price = Price::from_cents(999).unwrap();
        let total = price.line_total(Quantity::new(3).unwrap());
        assert_eq!(total, Decimal::new(2997, 2));
    }

    #[test]
    fn test_serde_uses_string_form() {
        let price = Price::parse("12.50").unwrap();
        let json = serde_json::to_string(&price).unwrap();
        assert_eq!(json, "\"12.50\"");

        let back: Price = serde_json::from_str(&json).unwrap();
        assert_eq!(back, price);
    }

    #[test]
    fn test_deserialize_validates() {
        let result: Result<Price, _> = serde_json::from_str("\"-3.00\"");
        assert!(result.is_err());
    }
}

//! Precision-safe decimal types for order parameters.
//!
//! Uses `rust_decimal` for exact decimal arithmetic so that the
//! precision repairs applied to rejected orders are reproducible
//! digit-for-digit.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of fractional digits used when rendering values for the exchange.
pub const FIXED_DECIMALS: u32 = 6;

/// Render a value as a fixed-point string with [`FIXED_DECIMALS`] places.
pub fn format_fixed(value: Decimal) -> String {
    format!("{:.6}", value.round_dp(FIXED_DECIMALS))
}

/// Drop the rightmost significant fractional digit of the fixed-point form.
///
/// `0.4012 -> 0.401`, `123.45 -> 123.4`, `0.5 -> 0`. Integral values have
/// no fractional digit to drop and come back unchanged.
pub fn drop_last_digit(value: Decimal) -> Decimal {
    let fixed = value.round_dp(FIXED_DECIMALS).normalize();
    let scale = fixed.scale();
    if scale == 0 {
        return fixed;
    }
    fixed
        .round_dp_with_strategy(scale - 1, RoundingStrategy::ToZero)
        .normalize()
}

/// Floor a value to a multiple of `increment`.
///
/// A non-positive increment, or one so small the division overflows, leaves
/// the value unchanged.
pub fn floor_to_increment(value: Decimal, increment: Decimal) -> Decimal {
    if increment <= Decimal::ZERO {
        return value;
    }
    value
        .checked_div(increment)
        .and_then(|steps| steps.floor().checked_mul(increment))
        .map_or(value, |floored| floored.normalize())
}

/// Limit price with exact decimal precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(pub Decimal);

impl Price {
    pub const ZERO: Self = Self(Decimal::ZERO);

    #[inline]
    pub fn new(value: Decimal) -> Self {
        Self(value)
    }

    #[inline]
    pub fn inner(&self) -> Decimal {
        self.0
    }

    #[inline]
    pub fn is_positive(&self) -> bool {
        self.0.is_sign_positive() && !self.0.is_zero()
    }

    /// Fixed-point string sent as `limit_price`.
    pub fn to_fixed(&self) -> String {
        format_fixed(self.0)
    }

    /// Precision repair: drop the last fractional digit.
    #[must_use]
    pub fn drop_last_digit(&self) -> Self {
        Self(drop_last_digit(self.0))
    }

    /// Round down to the product's quote increment.
    #[must_use]
    pub fn floor_to_increment(&self, increment: Decimal) -> Self {
        Self(floor_to_increment(self.0, increment))
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Price {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.trim().parse()?))
    }
}

impl From<Decimal> for Price {
    fn from(d: Decimal) -> Self {
        Self(d)
    }
}

/// Base-currency quantity with exact decimal precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Size(pub Decimal);

impl Size {
    pub const ZERO: Self = Self(Decimal::ZERO);

    #[inline]
    pub fn new(value: Decimal) -> Self {
        Self(value)
    }

    #[inline]
    pub fn inner(&self) -> Decimal {
        self.0
    }

    #[inline]
    pub fn is_positive(&self) -> bool {
        self.0.is_sign_positive() && !self.0.is_zero()
    }

    /// Fixed-point string sent as `base_size`.
    pub fn to_fixed(&self) -> String {
        format_fixed(self.0)
    }

    /// Precision repair: drop the last fractional digit.
    #[must_use]
    pub fn drop_last_digit(&self) -> Self {
        Self(drop_last_digit(self.0))
    }

    /// Round down to the product's base increment.
    #[must_use]
    pub fn floor_to_increment(&self, increment: Decimal) -> Self {
        Self(floor_to_increment(self.0, increment))
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Size {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.trim().parse()?))
    }
}

impl From<Decimal> for Size {
    fn from(d: Decimal) -> Self {
        Self(d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_format_fixed_pads_to_six_places() {
        assert_eq!(format_fixed(dec!(0.4012)), "0.401200");
        assert_eq!(format_fixed(dec!(100)), "100.000000");
        assert_eq!(format_fixed(dec!(1.23456789)), "1.234568");
    }

    #[test]
    fn test_drop_last_digit() {
        assert_eq!(drop_last_digit(dec!(0.4012)), dec!(0.401));
        assert_eq!(drop_last_digit(dec!(123.45)), dec!(123.4));
        assert_eq!(drop_last_digit(dec!(0.035252)), dec!(0.03525));
        assert_eq!(drop_last_digit(dec!(0.5)), dec!(0));
    }

    #[test]
    fn test_drop_last_digit_works_on_fixed_form() {
        // Anything past six places is rounded away before trimming.
        assert_eq!(drop_last_digit(dec!(1.23456789)), dec!(1.23456));
    }

    #[test]
    fn test_drop_last_digit_integral_unchanged() {
        assert_eq!(drop_last_digit(dec!(100)), dec!(100));
        assert_eq!(drop_last_digit(dec!(100.000)), dec!(100));
    }

    #[test]
    fn test_floor_to_increment() {
        let price = Price::new(dec!(0.0039678));
        assert_eq!(price.floor_to_increment(dec!(0.000001)).inner(), dec!(0.003967));

        let size = Size::new(dec!(1.2345));
        assert_eq!(size.floor_to_increment(dec!(0.001)).inner(), dec!(1.234));
        assert_eq!(size.floor_to_increment(Decimal::ZERO).inner(), dec!(1.2345));
    }

    #[test]
    fn test_floor_to_increment_bad_increment_leaves_value() {
        assert_eq!(floor_to_increment(dec!(1.2345), dec!(-0.01)), dec!(1.2345));

        // 1e11 / 1e-28 does not fit in a Decimal.
        let tiny = Decimal::new(1, 28);
        assert_eq!(floor_to_increment(dec!(100000000000.5), tiny), dec!(100000000000.5));
    }
}

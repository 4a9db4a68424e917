//! # Decimal Module
//!
//! Provides `DecimalValue`, the exact-precision number every subtotal,
//! impact and total flows through.
//!
//! ## Why Not Integer Cents Everywhere?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Unit prices ARE integer minor units (cents).                          │
//! │                                                                         │
//! │  But promotions produce fractions of a cent mid-computation:           │
//! │    400 × 0.9       = 360          (fine in cents)                      │
//! │    $200 spread over 3 items = 66.666...  (NOT fine in cents)           │
//! │                                                                         │
//! │  OUR SOLUTION: exact decimals with an EXPLICIT scale per operation     │
//! │    stage 3 subtotals  → scale 4                                        │
//! │    stage 4 spreading  → scale 10                                       │
//! │    grand total        → scale 10, rounded by the caller                │
//! │                                                                         │
//! │  Floats are only accepted at the boundary (`from_f64`) and are         │
//! │  rounded to a scale immediately.                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Scale Semantics
//! - `*_scaled` arithmetic and `truncate` cut toward zero (fixed-scale
//!   decimal semantics).
//! - `round` is half away from zero; `floor` / `ceil` go toward -∞ / +∞.
//!
//! ## Usage
//! ```rust
//! use tally_core::DecimalValue;
//!
//! let subtotal = DecimalValue::from_int(200) * DecimalValue::from_int(2);
//! let multiplier = DecimalValue::from_str_scaled("0.9", None).unwrap();
//! let discounted = subtotal.mul_scaled(multiplier, 4);
//! assert_eq!(discounted, DecimalValue::from_int(360));
//! ```

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

use crate::error::{CoreError, CoreResult};

// =============================================================================
// DecimalValue Type
// =============================================================================

/// Immutable exact decimal.
///
/// ## Design Decisions
/// - **Newtype over `rust_decimal::Decimal`**: 96-bit mantissa, no float
///   drift, `Copy`.
/// - **Value equality**: `360.0000 == 360`; scale does not affect `Eq`.
/// - **Serde**: serialized as a string so JSON never sees a float.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DecimalValue(Decimal);

impl DecimalValue {
    /// Zero.
    pub const ZERO: DecimalValue = DecimalValue(Decimal::ZERO);

    /// One.
    pub const ONE: DecimalValue = DecimalValue(Decimal::ONE);

    /// Creates a value from an integer (e.g. a unit price in cents).
    #[inline]
    pub fn from_int(value: i64) -> Self {
        DecimalValue(Decimal::from(value))
    }

    /// Parses a decimal string, optionally truncating to `scale`.
    ///
    /// ## Example
    /// ```rust
    /// use tally_core::DecimalValue;
    ///
    /// let rate = DecimalValue::from_str_scaled("0.12345", Some(2)).unwrap();
    /// assert_eq!(rate.to_string(), "0.12");
    /// assert!(DecimalValue::from_str_scaled("ten", None).is_err());
    /// ```
    pub fn from_str_scaled(input: &str, scale: Option<u32>) -> CoreResult<Self> {
        let value = Decimal::from_str_exact(input.trim()).map_err(|e| CoreError::InvalidDecimal {
            input: input.to_string(),
            reason: e.to_string(),
        })?;
        let value = DecimalValue(value);
        Ok(match scale {
            Some(scale) => value.truncate(scale),
            None => value,
        })
    }

    /// Converts a float, rounding to `scale` right away.
    ///
    /// NaN and infinities are rejected.
    pub fn from_f64(value: f64, scale: u32) -> CoreResult<Self> {
        let decimal = Decimal::from_f64(value).ok_or_else(|| CoreError::InvalidDecimal {
            input: value.to_string(),
            reason: "not a finite number in decimal range".to_string(),
        })?;
        Ok(DecimalValue(decimal).round(scale))
    }

    /// Returns the underlying `rust_decimal::Decimal`.
    #[inline]
    pub const fn inner(&self) -> Decimal {
        self.0
    }

    // =========================================================================
    // Scaled Arithmetic
    // =========================================================================

    /// `self + other`, truncated to `scale`.
    pub fn add_scaled(self, other: DecimalValue, scale: u32) -> Self {
        (self + other).truncate(scale)
    }

    /// `self - other`, truncated to `scale`.
    pub fn sub_scaled(self, other: DecimalValue, scale: u32) -> Self {
        (self - other).truncate(scale)
    }

    /// `self × other`, truncated to `scale`.
    pub fn mul_scaled(self, other: DecimalValue, scale: u32) -> Self {
        (self * other).truncate(scale)
    }

    /// `self ÷ other`, truncated to `scale`.
    ///
    /// ## Errors
    /// `CoreError::DivisionByZero` when `other` is zero.
    pub fn checked_div(self, other: DecimalValue, scale: u32) -> CoreResult<Self> {
        if other.is_zero() {
            return Err(CoreError::DivisionByZero {
                dividend: self.to_string(),
            });
        }
        self.0
            .checked_div(other.0)
            .map(|quotient| DecimalValue(quotient).truncate(scale))
            .ok_or_else(|| CoreError::InvalidDecimal {
                input: format!("{} / {}", self, other),
                reason: "quotient out of range".to_string(),
            })
    }

    // =========================================================================
    // Rounding
    // =========================================================================

    /// Cuts digits beyond `scale` (toward zero).
    #[inline]
    pub fn truncate(self, scale: u32) -> Self {
        DecimalValue(self.0.round_dp_with_strategy(scale, RoundingStrategy::ToZero))
    }

    /// Rounds half away from zero: `2.345 → 2.35`, `-2.345 → -2.35`.
    #[inline]
    pub fn round(self, scale: u32) -> Self {
        DecimalValue(
            self.0
                .round_dp_with_strategy(scale, RoundingStrategy::MidpointAwayFromZero),
        )
    }

    /// Rounds toward negative infinity.
    #[inline]
    pub fn floor(self, scale: u32) -> Self {
        DecimalValue(
            self.0
                .round_dp_with_strategy(scale, RoundingStrategy::ToNegativeInfinity),
        )
    }

    /// Rounds toward positive infinity.
    #[inline]
    pub fn ceil(self, scale: u32) -> Self {
        DecimalValue(
            self.0
                .round_dp_with_strategy(scale, RoundingStrategy::ToPositiveInfinity),
        )
    }

    // =========================================================================
    // Predicates & Comparison
    // =========================================================================

    /// Checks if the value is zero.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Three-way comparison, optionally after truncating both sides to
    /// `scale`.
    pub fn compare(&self, other: &DecimalValue, scale: Option<u32>) -> Ordering {
        match scale {
            Some(scale) => self.truncate(scale).0.cmp(&other.truncate(scale).0),
            None => self.0.cmp(&other.0),
        }
    }

    /// Negative values become zero; everything else is returned unchanged.
    #[inline]
    pub fn clamp_non_negative(self) -> Self {
        if self.is_negative() {
            DecimalValue::ZERO
        } else {
            self
        }
    }

    /// Returns the absolute value.
    #[inline]
    pub fn abs(self) -> Self {
        DecimalValue(self.0.abs())
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display drops trailing zeros: `360.0000` prints as `360`.
impl fmt::Display for DecimalValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

impl From<Decimal> for DecimalValue {
    fn from(value: Decimal) -> Self {
        DecimalValue(value)
    }
}

impl From<i64> for DecimalValue {
    fn from(value: i64) -> Self {
        DecimalValue::from_int(value)
    }
}

impl Add for DecimalValue {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        DecimalValue(self.0 + other.0)
    }
}

impl AddAssign for DecimalValue {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for DecimalValue {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        DecimalValue(self.0 - other.0)
    }
}

impl SubAssign for DecimalValue {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Mul for DecimalValue {
    type Output = Self;

    #[inline]
    fn mul(self, other: Self) -> Self {
        DecimalValue(self.0 * other.0)
    }
}

impl Neg for DecimalValue {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        DecimalValue(-self.0)
    }
}

impl Sum for DecimalValue {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(DecimalValue::ZERO, |acc, value| acc + value)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_from_int_and_display() {
        assert_eq!(DecimalValue::from_int(1099).to_string(), "1099");
        assert_eq!(DecimalValue::from(dec!(360.0000)).to_string(), "360");
        assert_eq!(DecimalValue::from(dec!(-0.50)).to_string(), "-0.5");
    }

    #[test]
    fn test_scale_does_not_affect_equality() {
        assert_eq!(DecimalValue::from(dec!(360.0000)), DecimalValue::from_int(360));
    }

    #[test]
    fn test_scaled_arithmetic_truncates() {
        let third = DecimalValue::ONE
            .checked_div(DecimalValue::from_int(3), 4)
            .unwrap();
        assert_eq!(third, DecimalValue::from(dec!(0.3333)));

        let negative = DecimalValue::from(dec!(-1.23456)).mul_scaled(DecimalValue::ONE, 2);
        assert_eq!(negative, DecimalValue::from(dec!(-1.23)));
    }

    #[test]
    fn test_division_by_zero_is_an_error() {
        let result = DecimalValue::from_int(5).checked_div(DecimalValue::ZERO, 4);
        assert!(matches!(result, Err(CoreError::DivisionByZero { .. })));
    }

    #[test]
    fn test_rounding_modes() {
        let value = DecimalValue::from(dec!(2.345));
        assert_eq!(value.round(2), DecimalValue::from(dec!(2.35)));
        assert_eq!(value.floor(2), DecimalValue::from(dec!(2.34)));
        assert_eq!(value.ceil(2), DecimalValue::from(dec!(2.35)));
        assert_eq!((-value).round(2), DecimalValue::from(dec!(-2.35)));
        assert_eq!((-value).floor(2), DecimalValue::from(dec!(-2.35)));
    }

    #[test]
    fn test_predicates_and_clamp() {
        assert!(DecimalValue::ZERO.is_zero());
        assert!(!DecimalValue::ZERO.is_negative());
        assert!(!DecimalValue::ZERO.is_positive());

        let negative = DecimalValue::from_int(-40);
        assert!(negative.is_negative());
        assert_eq!(negative.clamp_non_negative(), DecimalValue::ZERO);
        assert_eq!(negative.abs(), DecimalValue::from_int(40));
    }

    #[test]
    fn test_compare_with_scale() {
        let a = DecimalValue::from(dec!(1.0049));
        let b = DecimalValue::from(dec!(1.0041));
        assert_eq!(a.compare(&b, None), Ordering::Greater);
        assert_eq!(a.compare(&b, Some(3)), Ordering::Equal);
    }

    #[test]
    fn test_from_f64_rejects_nan() {
        assert!(DecimalValue::from_f64(f64::NAN, 2).is_err());
        assert_eq!(
            DecimalValue::from_f64(2.5, 0).unwrap(),
            DecimalValue::from_int(3)
        );
    }

    #[test]
    fn test_serializes_as_string() {
        let json = serde_json::to_string(&DecimalValue::from(dec!(12.50))).unwrap();
        assert_eq!(json, "\"12.50\"");
    }
}

//! Shared arithmetic for price calculations.
//!
//! Rounding lives here so that every rendered amount goes through the same
//! rule.

use rust_decimal::Decimal;

/// Rounds a decimal value to exactly two decimal places using half-up rounding.
///
/// This follows standard financial rounding conventions where values at exactly
/// 0.005 are rounded up to 0.01 (away from zero).
///
/// # Arguments
///
/// * `value` - The decimal value to round
///
/// # Returns
///
/// The value rounded to two decimal places.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use rates_core::calculations::common::round_half_up;
///
/// assert_eq!(round_half_up(dec!(123.454)), dec!(123.45));
/// assert_eq!(round_half_up(dec!(123.455)), dec!(123.46));
/// assert_eq!(round_half_up(dec!(123.456)), dec!(123.46));
/// assert_eq!(round_half_up(dec!(-123.455)), dec!(-123.46)); // Away from zero
/// ```
pub fn round_half_up(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, rust_decimal::RoundingStrategy::MidpointAwayFromZero)
}

/// Takes `percent` off `amount`, e.g. `apply_discount(100, 20) == 80`.
///
/// The result is not rounded; rounding happens once, when the price is
/// formatted for output.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use rates_core::calculations::common::apply_discount;
///
/// assert_eq!(apply_discount(dec!(100.00), dec!(20)), dec!(80.00));
/// assert_eq!(apply_discount(dec!(45.50), dec!(0)), dec!(45.50));
/// assert_eq!(apply_discount(dec!(45.50), dec!(100)), dec!(0));
/// ```
pub fn apply_discount(
    amount: Decimal,
    percent: Decimal,
) -> Decimal {
    amount * (Decimal::ONE - percent / Decimal::ONE_HUNDRED)
}

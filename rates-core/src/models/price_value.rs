//! Weekly hire rates that may be a number or "Price On Application".
//!
//! Every price that enters the system (catalog base rates, operator
//! overrides, restored snapshot values) is parsed through
//! [`PriceValue::parse`], and every price that leaves it is rendered through
//! [`PriceValue::format`]. Keeping both directions in one place is what
//! guarantees a line item reads the same in every export.
//!
//! | Input (trimmed, case-insensitive) | Result |
//! |-----------------------------------|--------|
//! | empty | `None` (no price entered) |
//! | `POA`, `Price On Application`, `Contact For Price` | [`PriceValue::Poa`] |
//! | decimal `>= 0` (commas and a leading `£` allowed) | [`PriceValue::Numeric`] |
//! | anything else, including negatives | [`PriceValue::Invalid`] |

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::calculations::common::round_half_up;

/// Literal shown for POA and invalid prices on every output surface.
pub const POA_LABEL: &str = "POA";

const POA_SYNONYMS: [&str; 3] = ["POA", "PRICE ON APPLICATION", "CONTACT FOR PRICE"];

/// A weekly rate, the POA sentinel, or text that could not be read as either.
///
/// `Invalid` behaves exactly like `Poa` downstream but keeps the original
/// text so the warning can name it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum PriceValue {
    Numeric(Decimal),
    Poa,
    Invalid(String),
}

/// How a [`PriceValue`] is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceStyle<'a> {
    /// Currency-prefixed, e.g. `£80.00`.
    Display(&'a str),
    /// Bare amount, e.g. `80.00`.
    Export,
}

impl PriceStyle<'static> {
    pub const STERLING: Self = PriceStyle::Display("£");
}

/// Trims whitespace, drops thousands separators and a leading currency sign.
fn normalize_price_input(s: &str) -> String {
    let trimmed = s.trim();
    let without_symbol = trimmed.strip_prefix('£').unwrap_or(trimmed);
    without_symbol.trim().replace(',', "")
}

impl PriceValue {
    /// Parses operator or spreadsheet text.
    ///
    /// Returns `None` for blank input: a blank cell means "no price entered"
    /// and is handled by the caller, not represented as a value.
    ///
    /// # Examples
    ///
    /// ```
    /// use rust_decimal_macros::dec;
    /// use rates_core::PriceValue;
    ///
    /// assert_eq!(PriceValue::parse(" 75 "), Some(PriceValue::Numeric(dec!(75))));
    /// assert_eq!(PriceValue::parse("poa"), Some(PriceValue::Poa));
    /// assert_eq!(PriceValue::parse("abc"), Some(PriceValue::Invalid("abc".to_string())));
    /// assert_eq!(PriceValue::parse("   "), None);
    /// ```
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }

        let upper = trimmed.to_uppercase();
        if POA_SYNONYMS.contains(&upper.as_str()) {
            return Some(Self::Poa);
        }

        match normalize_price_input(trimmed).parse::<Decimal>() {
            Ok(amount) if amount >= Decimal::ZERO => Some(Self::Numeric(amount)),
            _ => Some(Self::Invalid(raw.to_string())),
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Numeric(_))
    }

    /// True for `Poa` and for `Invalid`, which is treated as POA everywhere.
    pub fn is_poa(&self) -> bool {
        !self.is_numeric()
    }

    pub fn amount(&self) -> Option<Decimal> {
        match self {
            Self::Numeric(amount) => Some(*amount),
            Self::Poa | Self::Invalid(_) => None,
        }
    }

    /// The amount rounded to two places, half away from zero.
    pub fn rounded_amount(&self) -> Option<Decimal> {
        self.amount().map(round_half_up)
    }

    /// Renders the value for a UI cell or an export field.
    ///
    /// Numbers always carry exactly two decimals. `Poa` and `Invalid` always
    /// render as [`POA_LABEL`]; an unreadable price is never shown as a
    /// number.
    ///
    /// ```
    /// use rust_decimal_macros::dec;
    /// use rates_core::{PriceStyle, PriceValue};
    ///
    /// let price = PriceValue::Numeric(dec!(79.999));
    /// assert_eq!(price.format(PriceStyle::STERLING), "£80.00");
    /// assert_eq!(price.format(PriceStyle::Export), "80.00");
    /// assert_eq!(PriceValue::Invalid("abc".into()).format(PriceStyle::Export), "POA");
    /// ```
    pub fn format(
        &self,
        style: PriceStyle<'_>,
    ) -> String {
        match (self.rounded_amount(), style) {
            (Some(amount), PriceStyle::Display(symbol)) => format!("{symbol}{amount:.2}"),
            (Some(amount), PriceStyle::Export) => format!("{amount:.2}"),
            (None, _) => POA_LABEL.to_string(),
        }
    }

    /// Percentage taken off `base` to arrive at `resolved`.
    ///
    /// POA when either side is not numeric. A zero base yields zero rather
    /// than dividing by it. A ratio too large to represent is also POA.
    ///
    /// ```
    /// use rust_decimal_macros::dec;
    /// use rates_core::PriceValue;
    ///
    /// let pct = PriceValue::discount_percent(
    ///     &PriceValue::Numeric(dec!(100)),
    ///     &PriceValue::Numeric(dec!(75)),
    /// );
    /// assert_eq!(pct, PriceValue::Numeric(dec!(25)));
    /// ```
    pub fn discount_percent(
        base: &PriceValue,
        resolved: &PriceValue,
    ) -> PriceValue {
        match (base.amount(), resolved.amount()) {
            (Some(base), Some(_)) if base.is_zero() => PriceValue::Numeric(Decimal::ZERO),
            (Some(base), Some(resolved)) => base
                .checked_sub(resolved)
                .and_then(|saved| saved.checked_div(base))
                .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
                .map_or_else(
                    || {
                        warn!(%base, %resolved, "discount percentage out of range, shown as POA");
                        PriceValue::Poa
                    },
                    PriceValue::Numeric,
                ),
            _ => PriceValue::Poa,
        }
    }
}

impl fmt::Display for PriceValue {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(&self.format(PriceStyle::Export))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    // =========================================================================
    // parse
    // =========================================================================

    #[test]
    fn parse_blank_is_not_a_price() {
        assert_eq!(PriceValue::parse(""), None);
        assert_eq!(PriceValue::parse(" \t "), None);
    }

    #[test]
    fn parse_recognises_poa_synonyms_in_any_case() {
        for raw in ["POA", "poa", " Price On Application ", "contact for price"] {
            assert_eq!(PriceValue::parse(raw), Some(PriceValue::Poa), "input {raw:?}");
        }
    }

    #[test]
    fn parse_accepts_plain_and_decorated_numbers() {
        assert_eq!(PriceValue::parse("75"), Some(PriceValue::Numeric(dec!(75))));
        assert_eq!(PriceValue::parse("12.50"), Some(PriceValue::Numeric(dec!(12.50))));
        assert_eq!(PriceValue::parse("£1,234.5"), Some(PriceValue::Numeric(dec!(1234.5))));
        assert_eq!(PriceValue::parse("0"), Some(PriceValue::Numeric(dec!(0))));
    }

    #[test]
    fn parse_negative_is_invalid_and_keeps_raw_text() {
        assert_eq!(
            PriceValue::parse("-5"),
            Some(PriceValue::Invalid("-5".to_string()))
        );
    }

    #[test]
    fn parse_garbage_is_invalid() {
        assert_eq!(
            PriceValue::parse("abc"),
            Some(PriceValue::Invalid("abc".to_string()))
        );
        assert_eq!(
            PriceValue::parse("POA please"),
            Some(PriceValue::Invalid("POA please".to_string()))
        );
    }

    // =========================================================================
    // format
    // =========================================================================

    #[test]
    fn format_pads_to_two_decimals() {
        let price = PriceValue::Numeric(dec!(80));

        assert_eq!(price.format(PriceStyle::Export), "80.00");
        assert_eq!(price.format(PriceStyle::STERLING), "£80.00");
    }

    #[test]
    fn format_rounds_half_away_from_zero() {
        assert_eq!(PriceValue::Numeric(dec!(10.005)).format(PriceStyle::Export), "10.01");
        assert_eq!(PriceValue::Numeric(dec!(10.004)).format(PriceStyle::Export), "10.00");
    }

    #[test]
    fn format_poa_and_invalid_identically() {
        for style in [PriceStyle::Export, PriceStyle::STERLING, PriceStyle::Display("$")] {
            assert_eq!(PriceValue::Poa.format(style), "POA");
            assert_eq!(PriceValue::Invalid("xyz".into()).format(style), "POA");
        }
    }

    #[test]
    fn display_uses_export_style() {
        assert_eq!(PriceValue::Numeric(dec!(5.5)).to_string(), "5.50");
    }

    // =========================================================================
    // discount_percent
    // =========================================================================

    #[test]
    fn discount_percent_of_numeric_pair() {
        let pct = PriceValue::discount_percent(
            &PriceValue::Numeric(dec!(100)),
            &PriceValue::Numeric(dec!(80)),
        );

        assert_eq!(pct, PriceValue::Numeric(dec!(20)));
    }

    #[test]
    fn discount_percent_zero_base_is_zero() {
        let pct = PriceValue::discount_percent(
            &PriceValue::Numeric(dec!(0)),
            &PriceValue::Numeric(dec!(10)),
        );

        assert_eq!(pct, PriceValue::Numeric(dec!(0)));
    }

    #[test]
    fn discount_percent_negative_when_marked_up() {
        let pct = PriceValue::discount_percent(
            &PriceValue::Numeric(dec!(50)),
            &PriceValue::Numeric(dec!(60)),
        );

        assert_eq!(pct, PriceValue::Numeric(dec!(-20)));
    }

    #[test]
    fn discount_percent_is_poa_when_either_side_is_not_numeric() {
        let numeric = PriceValue::Numeric(dec!(100));

        assert_eq!(PriceValue::discount_percent(&PriceValue::Poa, &numeric), PriceValue::Poa);
        assert_eq!(PriceValue::discount_percent(&numeric, &PriceValue::Poa), PriceValue::Poa);
        assert_eq!(
            PriceValue::discount_percent(&numeric, &PriceValue::Invalid("x".into())),
            PriceValue::Poa
        );
    }

    #[test]
    fn discount_percent_too_large_to_represent_is_poa() {
        let pct = PriceValue::discount_percent(
            &PriceValue::Numeric(dec!(0.0001)),
            &PriceValue::Numeric(Decimal::MAX),
        );

        assert_eq!(pct, PriceValue::Poa);
    }
}

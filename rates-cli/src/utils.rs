//! Parsers for command-line values such as `Access/Towers=20` or `01/001=75`.

use rates_core::GroupKey;
use rust_decimal::Decimal;
use thiserror::Error;

/// Error returned when a command-line value cannot be read.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ArgError {
    #[error("invalid percentage '{0}'")]
    InvalidPercent(String),

    #[error("expected {expected}, got '{input}'")]
    Malformed {
        expected: &'static str,
        input: String,
    },

    #[error("invalid transport position '{0}'")]
    InvalidPosition(String),
}

/// Normalizes input for decimal parsing: trims whitespace, removes commas
/// (thousands separator) and a trailing `%`.
fn normalize_decimal_input(s: &str) -> String {
    let trimmed = s.trim();
    trimmed.strip_suffix('%').unwrap_or(trimmed).trim().replace(',', "")
}

fn malformed(
    expected: &'static str,
    input: &str,
) -> ArgError {
    ArgError::Malformed {
        expected,
        input: input.to_string(),
    }
}

/// Parses a discount such as `12.5` or `12.5%`.
///
/// Range is not checked here; the session rejects values outside 0 to 100.
pub fn parse_percent(s: &str) -> Result<Decimal, ArgError> {
    let normalized = normalize_decimal_input(s);
    normalized.parse().map_err(|e| {
        tracing::debug!(input = %s, "invalid percentage: {}", e);
        ArgError::InvalidPercent(s.to_string())
    })
}

/// Parses `GROUP/SUB SECTION=PERCENT`. The group ends at the first `/`.
pub fn parse_group_discount(s: &str) -> Result<(GroupKey, Decimal), ArgError> {
    const EXPECTED: &str = "GROUP/SUB SECTION=PERCENT";
    let (key, percent) = s.rsplit_once('=').ok_or_else(|| malformed(EXPECTED, s))?;
    let (group, sub_section) = key.split_once('/').ok_or_else(|| malformed(EXPECTED, s))?;
    let (group, sub_section) = (group.trim(), sub_section.trim());
    if group.is_empty() || sub_section.is_empty() {
        return Err(malformed(EXPECTED, s));
    }
    Ok((GroupKey::new(group, sub_section), parse_percent(percent)?))
}

/// Parses `ITEM=PRICE`. An empty price is kept: it clears the override.
pub fn parse_price_override(s: &str) -> Result<(String, String), ArgError> {
    let (key, raw) = s.split_once('=').ok_or_else(|| malformed("ITEM=PRICE", s))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(malformed("ITEM=PRICE", s));
    }
    Ok((key.to_string(), raw.trim().to_string()))
}

/// Parses `POSITION=CHARGE`, where position counts transport rows from 0.
pub fn parse_transport_charge(s: &str) -> Result<(usize, String), ArgError> {
    let (position, raw) = s.split_once('=').ok_or_else(|| malformed("POSITION=CHARGE", s))?;
    let position = position
        .trim()
        .parse()
        .map_err(|_| ArgError::InvalidPosition(position.trim().to_string()))?;
    Ok((position, raw.trim().to_string()))
}

//! CSV loader for the equipment rate sheet.
//!
//! ## CSV Format
//!
//! Column order does **not** matter (headers are matched by name). Header
//! names are case-sensitive; extra columns are ignored.
//!
//! | Column           | Type    | Notes |
//! |------------------|---------|-------|
//! | `ItemCategory`   | string  | Item key used for overrides and snapshots |
//! | `EquipmentName`  | string  | |
//! | `HireRateWeekly` | price   | Decimal, or `POA` / `Price On Application` / `Contact For Price` |
//! | `GroupName`      | string  | |
//! | `Sub Section`    | string  | |
//! | `Max Discount`   | decimal | Percent; empty means no ceiling (100), a trailing `%` is allowed |
//! | `Include`        | bool    | `TRUE`/`FALSE`, `yes`/`no`, `1`/`0`; empty means false |
//! | `Order`          | decimal | Position within the sub section; empty means 0 |
//!
//! ### Example
//!
//! ```csv
//! ItemCategory,EquipmentName,HireRateWeekly,GroupName,Sub Section,Max Discount,Include,Order
//! 01/001,Scaffold Tower 5m,85.00,Access,Towers,25,TRUE,1
//! 03/010,Mini Excavator,POA,Plant,Excavators,,TRUE,1
//! ```
//!
//! A missing required column fails the whole load. An unreadable price does
//! not: it is kept as an invalid price and shown as POA.

use std::io::Read;
use std::path::Path;

use rates_core::{Catalog, CatalogItem, PriceValue};
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

pub const REQUIRED_COLUMNS: [&str; 8] = [
    "ItemCategory",
    "EquipmentName",
    "HireRateWeekly",
    "GroupName",
    "Sub Section",
    "Max Discount",
    "Include",
    "Order",
];

// ---------------------------------------------------------------------------
// Public error type
// ---------------------------------------------------------------------------

/// Errors that can occur while loading a rate sheet.
#[derive(Debug, Error)]
pub enum CatalogLoadError {
    /// One or more required headers are absent; nothing was loaded.
    #[error("rate sheet must contain columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    /// The underlying CSV could not be read.
    #[error("CSV parse error: {0}")]
    Parse(#[from] csv::Error),

    /// An `Include` cell held something other than a yes/no value.
    #[error("unrecognised Include value '{value}' on row {row}")]
    InvalidInclude { value: String, row: usize },

    /// A `Max Discount` or `Order` cell was not a number.
    #[error("invalid {column} '{value}' on row {row}")]
    InvalidNumber {
        column: &'static str,
        value: String,
        row: usize,
    },

    #[error("cannot read rate sheet: {0}")]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Serde-compatible row that mirrors the CSV layout
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct CatalogRow {
    #[serde(rename = "ItemCategory")]
    item_category: String,
    #[serde(rename = "EquipmentName")]
    equipment_name: String,
    #[serde(rename = "HireRateWeekly")]
    hire_rate_weekly: String,
    #[serde(rename = "GroupName")]
    group_name: String,
    #[serde(rename = "Sub Section")]
    sub_section: String,
    #[serde(rename = "Max Discount")]
    max_discount: String,
    #[serde(rename = "Include")]
    include: String,
    #[serde(rename = "Order")]
    order: String,
}

fn parse_include(
    value: &str,
    row: usize,
) -> Result<bool, CatalogLoadError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "y" | "1" => Ok(true),
        "false" | "no" | "n" | "0" | "" => Ok(false),
        _ => Err(CatalogLoadError::InvalidInclude {
            value: value.to_string(),
            row,
        }),
    }
}

fn parse_number(
    column: &'static str,
    value: &str,
    default: Decimal,
    row: usize,
) -> Result<Decimal, CatalogLoadError> {
    let normalized = value.trim().trim_end_matches('%').trim().replace(',', "");
    if normalized.is_empty() {
        return Ok(default);
    }
    normalized.parse().map_err(|_| CatalogLoadError::InvalidNumber {
        column,
        value: value.to_string(),
        row,
    })
}

/// Convert a single CSV row into a [`CatalogItem`].
///
/// `row_number` is 1-based (for error messages).
fn convert_row(
    row: CatalogRow,
    row_number: usize,
) -> Result<CatalogItem, CatalogLoadError> {
    let base_rate = PriceValue::parse(&row.hire_rate_weekly).unwrap_or_else(|| {
        warn!(item = %row.item_category, row = row_number, "empty hire rate treated as POA");
        PriceValue::Invalid(String::new())
    });

    Ok(CatalogItem {
        max_discount_percent: parse_number(
            "Max Discount",
            &row.max_discount,
            Decimal::ONE_HUNDRED,
            row_number,
        )?,
        include: parse_include(&row.include, row_number)?,
        order: parse_number("Order", &row.order, Decimal::ZERO, row_number)?,
        item_key: row.item_category,
        name: row.equipment_name,
        base_rate,
        group: row.group_name,
        sub_section: row.sub_section,
    })
}

// ---------------------------------------------------------------------------
// Core loader
// ---------------------------------------------------------------------------

/// Loader for rate sheets exported as CSV.
pub struct CatalogLoader;

impl CatalogLoader {
    /// Parse every row, included or not, in file order.
    ///
    /// # Errors
    ///
    /// * [`CatalogLoadError::MissingColumns`] when a required header is absent.
    /// * [`CatalogLoadError::Parse`] when the CSV itself is malformed.
    /// * [`CatalogLoadError::InvalidInclude`] / [`CatalogLoadError::InvalidNumber`]
    ///   for unreadable `Include`, `Max Discount` or `Order` cells.
    pub fn parse<R: Read>(reader: R) -> Result<Vec<CatalogItem>, CatalogLoadError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = csv_reader.headers()?.clone();
        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|column| !headers.iter().any(|header| header == **column))
            .map(|column| column.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(CatalogLoadError::MissingColumns(missing));
        }

        csv_reader
            .deserialize::<CatalogRow>()
            .enumerate()
            .map(|(idx, result)| convert_row(result?, idx + 1))
            .collect()
    }

    /// Parse a rate sheet and keep the included rows in presentation order.
    pub fn load<R: Read>(reader: R) -> Result<Catalog, CatalogLoadError> {
        let rows = Self::parse(reader)?;
        let total = rows.len();
        let catalog = Catalog::from_rows(rows);

        for key in catalog.duplicate_keys() {
            warn!(item = %key, "item key appears on more than one row; overrides apply to all of them");
        }
        info!(included = catalog.len(), total, "rate sheet loaded");

        Ok(catalog)
    }

    pub fn load_from_str(input: &str) -> Result<Catalog, CatalogLoadError> {
        Self::load(input.as_bytes())
    }

    pub fn load_from_file(path: &Path) -> Result<Catalog, CatalogLoadError> {
        let file = std::fs::File::open(path)?;
        Self::load(file)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

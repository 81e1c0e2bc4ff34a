//! JSON form of a saved worksheet.
//!
//! ```json
//! {
//!   "customer_name": "Acme Ltd",
//!   "global_discount": 10.0,
//!   "group_discounts": { "Access_Towers_discount": 20.0 },
//!   "custom_prices": { "X-100": "75" },
//!   "transport_charges": { "transport_1": "8" },
//!   "created_timestamp": "2025-03-01T09:30:00+00:00"
//! }
//! ```
//!
//! Unknown keys are ignored and missing keys default to empty or zero.
//! Reading a document never touches a live session; it produces a
//! [`RestoredState`] that the caller applies in one step.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::SnapshotError;
use crate::calculations::DiscountContext;
use crate::models::{Catalog, GroupKey, TransportCharges};
use crate::session::CustomPriceStore;

/// A frozen copy of one editing session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressSnapshot {
    pub customer_name: String,
    pub global_discount_percent: Decimal,
    pub group_discounts: BTreeMap<GroupKey, Decimal>,
    pub custom_prices: CustomPriceStore,
    pub transport_charges: TransportCharges,
    pub created_at: DateTime<Utc>,
}

/// Session settings read back from a snapshot, ready to apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoredState {
    pub customer_name: String,
    pub discounts: DiscountContext,
    /// Only overrides whose item key exists in the current catalog.
    pub custom_prices: CustomPriceStore,
    pub transport_charges: TransportCharges,
    pub created_at: Option<DateTime<Utc>>,
}

/// How the snapshot's overrides lined up with the current catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconciliationReport {
    pub matched_count: usize,
    pub unmatched_count: usize,
    /// Item keys no longer in the catalog, sorted.
    pub unmatched_keys: Vec<String>,
}

// ---------------------------------------------------------------------------
// Wire layout
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(transparent)]
struct WirePercent(#[serde(with = "rust_decimal::serde::float")] Decimal);

/// Price text; older files may hold a bare number instead of a string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum WireText {
    Text(String),
    Number(serde_json::Number),
}

impl From<WireText> for String {
    fn from(value: WireText) -> Self {
        match value {
            WireText::Text(text) => text,
            WireText::Number(number) => number.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct SnapshotDocumentOut<'a> {
    customer_name: &'a str,
    #[serde(with = "rust_decimal::serde::float")]
    global_discount: Decimal,
    group_discounts: BTreeMap<String, WirePercent>,
    custom_prices: BTreeMap<&'a str, &'a str>,
    transport_charges: BTreeMap<&'a str, &'a str>,
    created_timestamp: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SnapshotDocumentIn {
    customer_name: String,
    global_discount: WirePercent,
    group_discounts: BTreeMap<String, WirePercent>,
    custom_prices: BTreeMap<String, WireText>,
    transport_charges: BTreeMap<String, WireText>,
    created_timestamp: Option<String>,
}

/// Accepts RFC 3339 and offset-less ISO-8601 (read as UTC).
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Picks the catalog pair whose wire key matches, else splits the key.
fn resolve_group_key(
    wire_key: &str,
    known: &HashMap<String, GroupKey>,
) -> Option<GroupKey> {
    known
        .get(wire_key)
        .cloned()
        .or_else(|| GroupKey::parse_wire_key(wire_key))
}

// ---------------------------------------------------------------------------
// Codec
// ---------------------------------------------------------------------------

/// Wire form of the group discounts. Two pairs that flatten to the same
/// key (`A_B`/`C` and `A`/`B_C`) cannot both be stored.
fn wire_group_discounts(
    group_discounts: &BTreeMap<GroupKey, Decimal>,
) -> Result<BTreeMap<String, WirePercent>, SnapshotError> {
    let mut owners: BTreeMap<String, &GroupKey> = BTreeMap::new();
    let mut wire = BTreeMap::new();
    for (key, percent) in group_discounts {
        let wire_key = key.wire_key();
        if let Some(first) = owners.insert(wire_key.clone(), key) {
            return Err(SnapshotError::AmbiguousGroupKey {
                wire_key,
                first: first.to_string(),
                second: key.to_string(),
            });
        }
        wire.insert(wire_key, WirePercent(*percent));
    }
    Ok(wire)
}

/// Writes a snapshot as pretty-printed JSON. Blank overrides are omitted.
///
/// # Errors
///
/// [`SnapshotError::AmbiguousGroupKey`] if two group discounts would be
/// saved under one key.
pub fn serialize(snapshot: &ProgressSnapshot) -> Result<String, SnapshotError> {
    let document = SnapshotDocumentOut {
        customer_name: &snapshot.customer_name,
        global_discount: snapshot.global_discount_percent,
        group_discounts: wire_group_discounts(&snapshot.group_discounts)?,
        custom_prices: snapshot.custom_prices.iter().collect(),
        transport_charges: snapshot.transport_charges.iter().collect(),
        created_timestamp: snapshot.created_at.to_rfc3339(),
    };

    Ok(serde_json::to_string_pretty(&document)?)
}

/// Reads a snapshot and reconciles it against `catalog`.
///
/// Overrides for item keys missing from `catalog` are dropped and listed in
/// the report. Discounts, transport charges and the customer name are
/// taken as-is.
///
/// # Errors
///
/// [`SnapshotError::Malformed`] if the text is not a snapshot document.
pub fn deserialize(
    json: &str,
    catalog: &Catalog,
) -> Result<(RestoredState, ReconciliationReport), SnapshotError> {
    let document: SnapshotDocumentIn = serde_json::from_str(json)?;

    let index = catalog.index();
    let mut report = ReconciliationReport::default();
    let mut custom_prices = CustomPriceStore::default();

    for (item_key, raw) in document.custom_prices {
        if index.contains_key(item_key.as_str()) {
            custom_prices.set(item_key, raw);
            report.matched_count += 1;
        } else {
            warn!(item = %item_key, "saved price ignored; item no longer in catalog");
            report.unmatched_count += 1;
            report.unmatched_keys.push(item_key);
        }
    }

    let known_groups: HashMap<String, GroupKey> = catalog
        .group_keys()
        .into_iter()
        .map(|key| (key.wire_key(), key))
        .collect();

    let mut discounts = DiscountContext::new(document.global_discount.0);
    for (wire_key, percent) in document.group_discounts {
        match resolve_group_key(&wire_key, &known_groups) {
            Some(key) => discounts.set_group_discount(key, percent.0),
            None => warn!(key = %wire_key, "unrecognised group discount key skipped"),
        }
    }

    let created_at = document.created_timestamp.as_deref().and_then(|raw| {
        let parsed = parse_timestamp(raw);
        if parsed.is_none() {
            warn!(timestamp = %raw, "unreadable snapshot timestamp");
        }
        parsed
    });

    let state = RestoredState {
        customer_name: document.customer_name,
        discounts,
        custom_prices,
        transport_charges: document
            .transport_charges
            .into_iter()
            .map(|(id, raw)| (id, raw.into()))
            .collect(),
        created_at,
    };

    Ok((state, report))
}

/// File-name-safe form of a customer name.
///
/// Characters other than ASCII letters, digits, `-` and `_` become `_`; a
/// blank name becomes `customer`.
pub fn customer_slug(customer_name: &str) -> String {
    let slug: String = customer_name
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    if slug.is_empty() { "customer".to_string() } else { slug }
}

/// File name for a snapshot: `progress_<customer>_<YYYYmmdd_HHMMSS>.json`.
pub fn snapshot_file_name(
    customer_name: &str,
    created_at: DateTime<Utc>,
) -> String {
    format!(
        "progress_{}_{}.json",
        customer_slug(customer_name),
        created_at.format("%Y%m%d_%H%M%S")
    )
}

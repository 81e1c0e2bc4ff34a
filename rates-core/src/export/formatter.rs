//! Turns resolved line items into the records every writer consumes.
//!
//! Rounding and number formatting happen here and nowhere else. Each
//! [`ExportValue`] carries the rounded amount for writers that want a real
//! number (spreadsheet cells) together with the exact text every other
//! writer must use, so a line never reads `80.00` in one file and
//! `79.999999` in another.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Serialize, Serializer};

use crate::calculations::ResolvedLineItem;
use crate::models::{PriceStyle, PriceValue, TransportRow};

pub const RECORD_HEADERS: [&str; 7] = [
    "ItemCategory",
    "EquipmentName",
    "OriginalPrice",
    "NetPrice",
    "DiscountPercent",
    "Group",
    "SubSection",
];

pub const ADMIN_HEADERS: [&str; 9] = [
    "Customer Name",
    "Date Created",
    "Item Category",
    "Equipment Name",
    "Original Price (£)",
    "Net Price (£)",
    "Discount %",
    "Group",
    "Sub Section",
];

pub const TRANSPORT_HEADERS: [&str; 2] = ["Delivery or Collection type", "Charge (£)"];

const DATE_CREATED_FORMAT: &str = "%Y-%m-%d %H:%M";

/// A price field: the rounded amount (if any) and its canonical text.
///
/// Serializes as the text alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportValue {
    pub amount: Option<Decimal>,
    pub text: String,
}

impl ExportValue {
    pub fn from_price(price: &PriceValue) -> Self {
        Self {
            amount: price.rounded_amount(),
            text: price.format(PriceStyle::Export),
        }
    }

    /// Numbers are formatted like prices; anything else (`Negotiable`) is
    /// kept as written.
    fn from_charge(raw: &str) -> Self {
        match PriceValue::parse(raw) {
            Some(price @ PriceValue::Numeric(_)) => Self::from_price(&price),
            _ => Self {
                amount: None,
                text: raw.trim().to_string(),
            },
        }
    }
}

impl Serialize for ExportValue {
    fn serialize<S: Serializer>(
        &self,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.text)
    }
}

/// One price-list line in canonical form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ExportRecord {
    pub item_category: String,
    pub equipment_name: String,
    pub original_price: ExportValue,
    pub net_price: ExportValue,
    pub discount_percent: ExportValue,
    pub group: String,
    pub sub_section: String,
    #[serde(skip)]
    pub exceeds_max_discount: bool,
}

impl ExportRecord {
    /// Field texts in [`RECORD_HEADERS`] order.
    pub fn fields(&self) -> [&str; 7] {
        [
            &self.item_category,
            &self.equipment_name,
            &self.original_price.text,
            &self.net_price.text,
            &self.discount_percent.text,
            &self.group,
            &self.sub_section,
        ]
    }
}

/// A line of the internal copy sent to the rates desk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdminRecord {
    #[serde(rename = "Customer Name")]
    pub customer_name: String,
    #[serde(rename = "Date Created")]
    pub date_created: String,
    #[serde(rename = "Item Category")]
    pub item_category: String,
    #[serde(rename = "Equipment Name")]
    pub equipment_name: String,
    #[serde(rename = "Original Price (£)")]
    pub original_price: ExportValue,
    #[serde(rename = "Net Price (£)")]
    pub net_price: ExportValue,
    #[serde(rename = "Discount %")]
    pub discount_percent: ExportValue,
    #[serde(rename = "Group")]
    pub group: String,
    #[serde(rename = "Sub Section")]
    pub sub_section: String,
}

impl AdminRecord {
    /// Field texts in [`ADMIN_HEADERS`] order.
    pub fn fields(&self) -> [&str; 9] {
        [
            &self.customer_name,
            &self.date_created,
            &self.item_category,
            &self.equipment_name,
            &self.original_price.text,
            &self.net_price.text,
            &self.discount_percent.text,
            &self.group,
            &self.sub_section,
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransportRecord {
    #[serde(rename = "Delivery or Collection type")]
    pub transport_type: String,
    #[serde(rename = "Charge (£)")]
    pub charge: ExportValue,
}

impl TransportRecord {
    pub fn fields(&self) -> [&str; 2] {
        [&self.transport_type, &self.charge.text]
    }
}

pub struct ExportFormatter;

impl ExportFormatter {
    /// Builds one record per resolved line, in input order.
    pub fn to_records(resolved: &[ResolvedLineItem]) -> Vec<ExportRecord> {
        resolved
            .iter()
            .map(|line| ExportRecord {
                item_category: line.item.item_key.clone(),
                equipment_name: line.item.name.clone(),
                original_price: ExportValue::from_price(&line.item.base_rate),
                net_price: ExportValue::from_price(&line.resolved_price),
                discount_percent: ExportValue::from_price(&line.discount_percent),
                group: line.item.group.clone(),
                sub_section: line.item.sub_section.clone(),
                exceeds_max_discount: line.exceeds_max_discount,
            })
            .collect()
    }

    /// Records for the internal copy: customer and creation time first.
    pub fn to_admin_records(
        resolved: &[ResolvedLineItem],
        customer_name: &str,
        created: NaiveDateTime,
    ) -> Vec<AdminRecord> {
        let date_created = created.format(DATE_CREATED_FORMAT).to_string();
        Self::to_records(resolved)
            .into_iter()
            .map(|record| AdminRecord {
                customer_name: customer_name.to_string(),
                date_created: date_created.clone(),
                item_category: record.item_category,
                equipment_name: record.equipment_name,
                original_price: record.original_price,
                net_price: record.net_price,
                discount_percent: record.discount_percent,
                group: record.group,
                sub_section: record.sub_section,
            })
            .collect()
    }

    pub fn to_transport_records(rows: &[TransportRow]) -> Vec<TransportRecord> {
        rows.iter()
            .map(|row| TransportRecord {
                transport_type: row.name.clone(),
                charge: ExportValue::from_charge(&row.charge),
            })
            .collect()
    }
}

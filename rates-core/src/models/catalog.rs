use std::collections::{BTreeMap, BTreeSet, HashMap};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{GroupKey, PriceValue};

/// One row of the equipment rate sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    /// `ItemCategory` column. Used as the identity for overrides and
    /// snapshot reconciliation; the rate sheet does not guarantee uniqueness.
    pub item_key: String,
    pub name: String,
    pub base_rate: PriceValue,
    pub group: String,
    pub sub_section: String,
    /// Advisory ceiling; exceeding it warns but never blocks.
    pub max_discount_percent: Decimal,
    pub include: bool,
    pub order: Decimal,
}

impl CatalogItem {
    pub fn group_key(&self) -> GroupKey {
        GroupKey::new(&self.group, &self.sub_section)
    }
}

/// The included rows of a rate sheet, in presentation order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    items: Vec<CatalogItem>,
}

impl Catalog {
    /// Drops rows with `include == false` and sorts the rest by
    /// `(group, sub_section, order)`. The sort is stable, so rows that tie
    /// keep their sheet order.
    pub fn from_rows(rows: Vec<CatalogItem>) -> Self {
        let mut items: Vec<_> = rows.into_iter().filter(|row| row.include).collect();
        items.sort_by(|a, b| {
            (&a.group, &a.sub_section, a.order).cmp(&(&b.group, &b.sub_section, b.order))
        });
        Self { items }
    }

    pub fn items(&self) -> &[CatalogItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains_key(&self, item_key: &str) -> bool {
        self.items.iter().any(|item| item.item_key == item_key)
    }

    /// `item_key -> rows` for every key in the catalog.
    pub fn index(&self) -> HashMap<&str, Vec<&CatalogItem>> {
        let mut index: HashMap<&str, Vec<&CatalogItem>> = HashMap::new();
        for item in &self.items {
            index.entry(item.item_key.as_str()).or_default().push(item);
        }
        index
    }

    /// Every `(group, sub_section)` pair present, sorted.
    pub fn group_keys(&self) -> BTreeSet<GroupKey> {
        self.items.iter().map(CatalogItem::group_key).collect()
    }

    /// Item keys shared by more than one row, sorted.
    pub fn duplicate_keys(&self) -> Vec<String> {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for item in &self.items {
            *counts.entry(item.item_key.as_str()).or_default() += 1;
        }
        counts
            .into_iter()
            .filter(|(_, count)| *count > 1)
            .map(|(key, _)| key.to_string())
            .collect()
    }
}

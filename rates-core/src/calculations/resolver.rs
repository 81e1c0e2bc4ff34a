//! Discount resolution for a single rate-sheet line.
//!
//! The net price of a line is decided in strict precedence order:
//!
//! | Step | Condition | Net price |
//! |------|-----------|-----------|
//! | 1 | Operator override entered | the override, parsed (numeric, POA, or invalid-as-POA) |
//! | 2 | Base rate is POA | POA |
//! | 3 | Otherwise | base rate less the group discount, or the global discount when the group has none |
//!
//! The discount percentage is then derived from base and net price, and
//! compared against the item's advisory ceiling.
//!
//! # Example
//!
//! ```
//! use rust_decimal::Decimal;
//! use rust_decimal_macros::dec;
//! use rates_core::{CatalogItem, DiscountContext, DiscountResolver, GroupKey, PriceValue};
//!
//! let item = CatalogItem {
//!     item_key: "X-100".to_string(),
//!     name: "Breaker".to_string(),
//!     base_rate: PriceValue::Numeric(dec!(100)),
//!     group: "Breaking".to_string(),
//!     sub_section: "Hammers".to_string(),
//!     max_discount_percent: dec!(30),
//!     include: true,
//!     order: Decimal::ONE,
//! };
//!
//! let mut context = DiscountContext::new(dec!(10));
//! context.set_group_discount(GroupKey::new("Breaking", "Hammers"), dec!(20));
//!
//! let line = DiscountResolver::new(&context).resolve(&item, None);
//!
//! assert_eq!(line.resolved_price, PriceValue::Numeric(dec!(80)));
//! assert_eq!(line.discount_percent, PriceValue::Numeric(dec!(20)));
//! assert!(!line.exceeds_max_discount);
//! ```

use std::collections::BTreeMap;
use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::calculations::common::apply_discount;
use crate::models::{Catalog, CatalogItem, GroupKey, PriceValue};
use crate::session::CustomPriceStore;

/// Discount settings of one editing session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscountContext {
    /// Applied to every group without its own entry.
    pub global_discount_percent: Decimal,
    pub group_discounts: BTreeMap<GroupKey, Decimal>,
}

impl DiscountContext {
    pub fn new(global_discount_percent: Decimal) -> Self {
        Self {
            global_discount_percent,
            group_discounts: BTreeMap::new(),
        }
    }

    pub fn set_group_discount(
        &mut self,
        key: GroupKey,
        percent: Decimal,
    ) {
        self.group_discounts.insert(key, percent);
    }

    /// The group's own discount, falling back to the global one.
    pub fn effective_discount(
        &self,
        key: &GroupKey,
    ) -> Decimal {
        self.group_discounts
            .get(key)
            .copied()
            .unwrap_or(self.global_discount_percent)
    }
}

/// Something worth telling the operator about a resolved line.
///
/// Neither variant stops a price list from being produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineWarning {
    /// A price cell could not be read; it is shown as POA.
    InvalidPrice { item_key: String, raw: String },
    /// The net price gives away more than the item's ceiling allows.
    ExceedsMaxDiscount {
        item_key: String,
        discount_percent: Decimal,
        max_discount_percent: Decimal,
    },
}

impl fmt::Display for LineWarning {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            LineWarning::InvalidPrice { item_key, raw } => {
                write!(f, "{item_key}: unreadable price '{raw}' shown as POA")
            }
            LineWarning::ExceedsMaxDiscount {
                item_key,
                discount_percent,
                max_discount_percent,
            } => write!(
                f,
                "{item_key}: discount {:.2}% exceeds the {max_discount_percent}% maximum",
                discount_percent.round_dp(2)
            ),
        }
    }
}

/// One catalog row with its final price.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLineItem {
    pub item: CatalogItem,
    pub resolved_price: PriceValue,
    /// `Numeric` or `Poa`, never `Invalid`.
    pub discount_percent: PriceValue,
    pub exceeds_max_discount: bool,
}

impl ResolvedLineItem {
    pub fn warnings(&self) -> Vec<LineWarning> {
        let mut warnings = Vec::new();

        for price in [&self.item.base_rate, &self.resolved_price] {
            if let PriceValue::Invalid(raw) = price {
                warnings.push(LineWarning::InvalidPrice {
                    item_key: self.item.item_key.clone(),
                    raw: raw.clone(),
                });
            }
        }

        if let (true, Some(discount_percent)) =
            (self.exceeds_max_discount, self.discount_percent.amount())
        {
            warnings.push(LineWarning::ExceedsMaxDiscount {
                item_key: self.item.item_key.clone(),
                discount_percent,
                max_discount_percent: self.item.max_discount_percent,
            });
        }

        warnings
    }
}

/// Resolves line items against one session's discount settings.
///
/// Holds no state of its own; resolving the same inputs twice gives the
/// same result, so callers recompute the whole list on every edit.
#[derive(Debug, Clone, Copy)]
pub struct DiscountResolver<'a> {
    context: &'a DiscountContext,
}

impl<'a> DiscountResolver<'a> {
    pub fn new(context: &'a DiscountContext) -> Self {
        Self { context }
    }

    /// Resolves a single item. `override_raw` is the operator's text for
    /// this item, if any; blank text counts as no override.
    pub fn resolve(
        &self,
        item: &CatalogItem,
        override_raw: Option<&str>,
    ) -> ResolvedLineItem {
        let resolved_price = match override_raw.and_then(PriceValue::parse) {
            Some(price) => price,
            None => self.computed_price(item),
        };

        let discount_percent = PriceValue::discount_percent(&item.base_rate, &resolved_price);

        let exceeds_max_discount = discount_percent
            .amount()
            .is_some_and(|pct| pct > item.max_discount_percent);

        if let PriceValue::Invalid(raw) = &resolved_price {
            warn!(item = %item.item_key, raw = %raw, "unreadable price shown as POA");
        }
        if exceeds_max_discount {
            warn!(
                item = %item.item_key,
                discount = %discount_percent,
                max = %item.max_discount_percent,
                "discount exceeds item maximum"
            );
        }
        debug!(item = %item.item_key, price = %resolved_price, "resolved line");

        ResolvedLineItem {
            item: item.clone(),
            resolved_price,
            discount_percent,
            exceeds_max_discount,
        }
    }

    /// Resolves every catalog row, looking overrides up by item key.
    pub fn resolve_catalog(
        &self,
        catalog: &Catalog,
        custom_prices: &CustomPriceStore,
    ) -> Vec<ResolvedLineItem> {
        catalog
            .items()
            .iter()
            .map(|item| self.resolve(item, custom_prices.get(&item.item_key)))
            .collect()
    }

    fn computed_price(
        &self,
        item: &CatalogItem,
    ) -> PriceValue {
        match &item.base_rate {
            PriceValue::Numeric(base) => {
                let discount = self.context.effective_discount(&item.group_key());
                PriceValue::Numeric(apply_discount(*base, discount))
            }
            PriceValue::Poa => PriceValue::Poa,
            PriceValue::Invalid(raw) => {
                warn!(item = %item.item_key, raw = %raw, "unreadable base rate treated as POA");
                PriceValue::Poa
            }
        }
    }
}

//! The editing session: everything the operator has changed on a worksheet.
//!
//! A session is owned by exactly one operator. Nothing in it is global; a
//! deployment serving several operators keeps one session per operator.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::info;

use super::CustomPriceStore;
use crate::calculations::{DiscountContext, DiscountResolver, ResolvedLineItem};
use crate::models::{Catalog, GroupKey, TransportCharges, TransportRow, TransportSchedule};
use crate::snapshot::{self, ProgressSnapshot, ReconciliationReport, RestoredState, SnapshotError};

/// Errors raised by session edits.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("discount must be between 0 and 100, got {0}")]
    DiscountOutOfRange(Decimal),

    #[error("discount may have at most 6 decimal places, got {0}")]
    DiscountTooPrecise(Decimal),

    #[error("no transport type at position {0}")]
    UnknownTransport(usize),

    #[error("transport charge for '{0}' is fixed and cannot be edited")]
    LockedTransport(String),
}

/// Snapshots store discounts as JSON numbers; with at most this many
/// decimals a percentage in `0..=100` survives the trip exactly.
pub const MAX_DISCOUNT_DECIMALS: u32 = 6;

fn check_percent(percent: Decimal) -> Result<Decimal, SessionError> {
    if percent < Decimal::ZERO || percent > Decimal::ONE_HUNDRED {
        return Err(SessionError::DiscountOutOfRange(percent));
    }
    if percent.normalize().scale() > MAX_DISCOUNT_DECIMALS {
        return Err(SessionError::DiscountTooPrecise(percent));
    }
    Ok(percent)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditingSession {
    pub customer_name: String,
    pub discounts: DiscountContext,
    pub custom_prices: CustomPriceStore,
    pub transport_charges: TransportCharges,
    schedule: TransportSchedule,
}

impl EditingSession {
    pub fn new(schedule: TransportSchedule) -> Self {
        Self {
            schedule,
            ..Default::default()
        }
    }

    pub fn schedule(&self) -> &TransportSchedule {
        &self.schedule
    }

    /// Changes the global discount only; groups with their own discount
    /// keep it.
    pub fn set_global_discount(
        &mut self,
        percent: Decimal,
    ) -> Result<(), SessionError> {
        self.discounts.global_discount_percent = check_percent(percent)?;
        Ok(())
    }

    /// Changes the global discount and resets every group to follow it.
    pub fn apply_global_discount(
        &mut self,
        percent: Decimal,
    ) -> Result<(), SessionError> {
        self.set_global_discount(percent)?;
        self.discounts.group_discounts.clear();
        Ok(())
    }

    pub fn set_group_discount(
        &mut self,
        key: GroupKey,
        percent: Decimal,
    ) -> Result<(), SessionError> {
        let percent = check_percent(percent)?;
        self.discounts.set_group_discount(key, percent);
        Ok(())
    }

    pub fn set_custom_price(
        &mut self,
        item_key: impl Into<String>,
        raw: impl Into<String>,
    ) {
        self.custom_prices.set(item_key, raw);
    }

    /// Drops every override; returns how many there were.
    pub fn reset_overrides(&mut self) -> usize {
        let cleared = self.custom_prices.clear_all();
        info!(cleared, "custom prices reset");
        cleared
    }

    pub fn set_transport_charge(
        &mut self,
        index: usize,
        raw: impl Into<String>,
    ) -> Result<(), SessionError> {
        let kind = self
            .schedule
            .get(index)
            .ok_or(SessionError::UnknownTransport(index))?;
        if kind.locked {
            return Err(SessionError::LockedTransport(kind.name.clone()));
        }
        self.transport_charges.set(TransportSchedule::id_for(index), raw);
        Ok(())
    }

    pub fn transport_rows(&self) -> Vec<TransportRow> {
        self.schedule.rows(&self.transport_charges)
    }

    /// Resolves every catalog row against the current settings.
    pub fn resolve(
        &self,
        catalog: &Catalog,
    ) -> Vec<ResolvedLineItem> {
        DiscountResolver::new(&self.discounts).resolve_catalog(catalog, &self.custom_prices)
    }

    pub fn snapshot(
        &self,
        created_at: DateTime<Utc>,
    ) -> ProgressSnapshot {
        ProgressSnapshot {
            customer_name: self.customer_name.clone(),
            global_discount_percent: self.discounts.global_discount_percent,
            group_discounts: self.discounts.group_discounts.clone(),
            custom_prices: self.custom_prices.clone(),
            transport_charges: self.transport_charges.clone(),
            created_at,
        }
    }

    /// Replaces the session's settings with a restored snapshot. Overrides
    /// are replaced wholesale, not merged.
    pub fn restore(
        &mut self,
        state: RestoredState,
    ) {
        self.customer_name = state.customer_name;
        self.discounts = state.discounts;
        self.custom_prices = state.custom_prices;
        self.transport_charges = state.transport_charges;
    }

    /// Reads a saved snapshot and applies it against `catalog`.
    ///
    /// Either the whole document is applied or, on error, nothing is: the
    /// session is only touched after the document has been fully read.
    pub fn load_snapshot(
        &mut self,
        json: &str,
        catalog: &Catalog,
    ) -> Result<ReconciliationReport, SnapshotError> {
        let (state, report) = snapshot::deserialize(json, catalog)?;
        self.restore(state);
        info!(
            matched = report.matched_count,
            unmatched = report.unmatched_count,
            "progress restored"
        );
        Ok(report)
    }
}

//! Delivery and collection charges quoted alongside the price list.
//!
//! The schedule is the fixed list of transport types with their default
//! charges. The operator's edits live in [`TransportCharges`], keyed by the
//! `transport_<index>` identifiers used in progress snapshots.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One delivery or collection type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportType {
    pub name: String,
    pub default_charge: String,
    /// Locked rows always show their default and reject edits.
    #[serde(default)]
    pub locked: bool,
}

impl TransportType {
    fn new(
        name: &str,
        default_charge: &str,
        locked: bool,
    ) -> Self {
        Self {
            name: name.to_string(),
            default_charge: default_charge.to_string(),
            locked,
        }
    }
}

/// The ordered list of transport types offered on a quote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransportSchedule {
    types: Vec<TransportType>,
}

impl Default for TransportSchedule {
    fn default() -> Self {
        Self::new(vec![
            TransportType::new("Standard - small tools", "5", false),
            TransportType::new("Towables", "7.5", false),
            TransportType::new("Non-mechanical", "10", false),
            TransportType::new("Fencing", "15", false),
            TransportType::new("Tower", "5", false),
            TransportType::new("Powered Access", "Negotiable", true),
            TransportType::new("Low-level Access", "5", false),
            TransportType::new("Long Distance", "15", false),
        ])
    }
}

/// A schedule row with the operator's charge applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportRow {
    pub id: String,
    pub name: String,
    pub charge: String,
}

impl TransportSchedule {
    pub fn new(types: Vec<TransportType>) -> Self {
        Self { types }
    }

    pub fn types(&self) -> &[TransportType] {
        &self.types
    }

    /// Snapshot identifier for the row at `index`.
    pub fn id_for(index: usize) -> String {
        format!("transport_{index}")
    }

    pub fn get(
        &self,
        index: usize,
    ) -> Option<&TransportType> {
        self.types.get(index)
    }

    /// Resolves every row: a non-blank stored charge wins unless the row is
    /// locked, otherwise the default applies.
    pub fn rows(
        &self,
        charges: &TransportCharges,
    ) -> Vec<TransportRow> {
        self.types
            .iter()
            .enumerate()
            .map(|(index, kind)| {
                let id = Self::id_for(index);
                let charge = match charges.get(&id) {
                    Some(raw) if !kind.locked => raw.trim().to_string(),
                    _ => kind.default_charge.clone(),
                };
                TransportRow {
                    id,
                    name: kind.name.clone(),
                    charge,
                }
            })
            .collect()
    }
}

/// Raw charge text entered per transport id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransportCharges {
    entries: BTreeMap<String, String>,
}

impl TransportCharges {
    /// Stored text for `id`, or `None` when absent or blank.
    pub fn get(
        &self,
        id: &str,
    ) -> Option<&str> {
        self.entries
            .get(id)
            .map(String::as_str)
            .filter(|raw| !raw.trim().is_empty())
    }

    pub fn set(
        &mut self,
        id: impl Into<String>,
        raw: impl Into<String>,
    ) {
        self.entries.insert(id.into(), raw.into());
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, String)> for TransportCharges {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn default_schedule_has_eight_types_with_powered_access_locked() {
        let schedule = TransportSchedule::default();

        assert_eq!(schedule.types().len(), 8);
        let locked: Vec<_> = schedule.types().iter().filter(|t| t.locked).collect();
        assert_eq!(locked.len(), 1);
        assert_eq!(locked[0].name, "Powered Access");
        assert_eq!(locked[0].default_charge, "Negotiable");
    }

    #[test]
    fn rows_use_defaults_when_nothing_entered() {
        let rows = TransportSchedule::default().rows(&TransportCharges::default());

        assert_eq!(rows[0].id, "transport_0");
        assert_eq!(rows[0].charge, "5");
        assert_eq!(rows[1].charge, "7.5");
    }

    #[test]
    fn rows_prefer_entered_charge_over_default() {
        let mut charges = TransportCharges::default();
        charges.set("transport_1", " 9.00 ");
        charges.set("transport_2", "   ");

        let rows = TransportSchedule::default().rows(&charges);

        assert_eq!(rows[1].charge, "9.00");
        assert_eq!(rows[2].charge, "10");
    }

    #[test]
    fn rows_ignore_entries_for_locked_types() {
        let mut charges = TransportCharges::default();
        charges.set("transport_5", "20");

        let rows = TransportSchedule::default().rows(&charges);

        assert_eq!(rows[5].charge, "Negotiable");
    }
}

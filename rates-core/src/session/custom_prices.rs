use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Operator-entered price text, keyed by item key.
///
/// Text is stored verbatim and never rejected; it is only interpreted when
/// a line is resolved. Blank text means the same as no entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomPriceStore {
    entries: BTreeMap<String, String>,
}

impl CustomPriceStore {
    /// The override text for `item_key`, or `None` when absent or blank.
    pub fn get(
        &self,
        item_key: &str,
    ) -> Option<&str> {
        self.entries
            .get(item_key)
            .map(String::as_str)
            .filter(|raw| !raw.trim().is_empty())
    }

    /// Stores `raw` for `item_key`; blank text removes the override.
    pub fn set(
        &mut self,
        item_key: impl Into<String>,
        raw: impl Into<String>,
    ) {
        let (item_key, raw) = (item_key.into(), raw.into());
        if raw.trim().is_empty() {
            self.entries.remove(&item_key);
        } else {
            self.entries.insert(item_key, raw);
        }
    }

    pub fn remove(
        &mut self,
        item_key: &str,
    ) -> Option<String> {
        self.entries.remove(item_key)
    }

    pub fn has_override(
        &self,
        item_key: &str,
    ) -> bool {
        self.get(item_key).is_some()
    }

    /// Removes every entry and returns how many were real overrides.
    pub fn clear_all(&mut self) -> usize {
        let cleared = self.len();
        self.entries.clear();
        cleared
    }

    /// Number of non-blank overrides.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Non-blank overrides in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .filter(|(_, raw)| !raw.trim().is_empty())
            .map(|(key, raw)| (key.as_str(), raw.as_str()))
    }
}

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Snapshot files name group discounts `<group>_<sub section>_discount`.
static WIRE_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?s)(.+?)_(.*)_discount$").expect("wire key pattern is valid")
});

/// A `(GroupName, Sub Section)` pair, the scope of a group discount.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GroupKey {
    pub group: String,
    pub sub_section: String,
}

impl GroupKey {
    pub fn new(
        group: impl Into<String>,
        sub_section: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into(),
            sub_section: sub_section.into(),
        }
    }

    /// The key this pair is stored under in a progress snapshot.
    pub fn wire_key(&self) -> String {
        format!("{}_{}_discount", self.group, self.sub_section)
    }

    /// Splits a snapshot key without knowing the catalog.
    ///
    /// The textual form is ambiguous when a group name contains `_`; this
    /// splits at the first underscore. Callers that have a catalog should
    /// match against its known pairs first.
    pub fn parse_wire_key(key: &str) -> Option<Self> {
        let caps = WIRE_KEY.captures(key)?;
        Some(Self::new(&caps[1], &caps[2]))
    }
}

impl fmt::Display for GroupKey {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{} / {}", self.group, self.sub_section)
    }
}

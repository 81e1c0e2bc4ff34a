use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use tracing::info;

use super::codec::{self, snapshot_file_name};
use super::{ReconciliationReport, SnapshotError};
use crate::models::Catalog;
use crate::session::EditingSession;

/// Somewhere snapshot documents can be kept between sessions.
///
/// Documents are write-once: saving under an existing name fails rather
/// than replacing the earlier file.
pub trait SnapshotStore {
    fn save(
        &mut self,
        name: &str,
        document: &str,
    ) -> Result<(), SnapshotError>;

    fn load(
        &self,
        name: &str,
    ) -> Result<String, SnapshotError>;

    /// Names of every stored snapshot, sorted.
    fn list(&self) -> Result<Vec<String>, SnapshotError>;

    /// Serializes `session` and stores it; returns the name it was saved as.
    fn save_session(
        &mut self,
        session: &EditingSession,
        created_at: DateTime<Utc>,
    ) -> Result<String, SnapshotError> {
        let name = snapshot_file_name(&session.customer_name, created_at);
        let document = codec::serialize(&session.snapshot(created_at))?;
        self.save(&name, &document)?;
        info!(snapshot = %name, "progress saved");
        Ok(name)
    }

    /// Loads `name` into `session`; the session is unchanged on error.
    fn restore_session(
        &self,
        name: &str,
        session: &mut EditingSession,
        catalog: &Catalog,
    ) -> Result<ReconciliationReport, SnapshotError> {
        let document = self.load(name)?;
        session.load_snapshot(&document, catalog)
    }
}

/// Keeps snapshots in memory; useful for tests and single-run tools.
#[derive(Debug, Clone, Default)]
pub struct MemorySnapshotStore {
    documents: BTreeMap<String, String>,
}

impl SnapshotStore for MemorySnapshotStore {
    fn save(
        &mut self,
        name: &str,
        document: &str,
    ) -> Result<(), SnapshotError> {
        if self.documents.contains_key(name) {
            return Err(SnapshotError::AlreadyExists(name.to_string()));
        }
        self.documents.insert(name.to_string(), document.to_string());
        Ok(())
    }

    fn load(
        &self,
        name: &str,
    ) -> Result<String, SnapshotError> {
        self.documents
            .get(name)
            .cloned()
            .ok_or_else(|| SnapshotError::NotFound(name.to_string()))
    }

    fn list(&self) -> Result<Vec<String>, SnapshotError> {
        Ok(self.documents.keys().cloned().collect())
    }
}

//! Saving and restoring editing sessions.

pub mod codec;
pub mod store;

use thiserror::Error;

pub use codec::{
    ProgressSnapshot, ReconciliationReport, RestoredState, customer_slug, deserialize, serialize,
    snapshot_file_name,
};
pub use store::{MemorySnapshotStore, SnapshotStore};

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot is not valid: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("snapshot '{0}' not found")]
    NotFound(String),

    #[error("snapshot '{0}' already exists")]
    AlreadyExists(String),

    #[error("group discounts for '{first}' and '{second}' would both be saved as '{wire_key}'")]
    AmbiguousGroupKey {
        wire_key: String,
        first: String,
        second: String,
    },

    #[error("snapshot storage error: {0}")]
    Storage(String),
}

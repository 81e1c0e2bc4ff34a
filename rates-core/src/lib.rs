pub mod calculations;
pub mod export;
pub mod models;
pub mod session;
pub mod snapshot;

pub use calculations::{DiscountContext, DiscountResolver, LineWarning, ResolvedLineItem};
pub use export::{ExportFormatter, ExportRecord, ExportValue};
pub use models::*;
pub use session::{CustomPriceStore, EditingSession, SessionError};
pub use snapshot::{ProgressSnapshot, ReconciliationReport, SnapshotError, SnapshotStore};

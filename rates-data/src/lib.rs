pub mod catalog_loader;
pub mod snapshot_store;
pub mod writers;

pub use catalog_loader::{CatalogLoadError, CatalogLoader, REQUIRED_COLUMNS};
pub use snapshot_store::FileSnapshotStore;
pub use writers::{
    ExportWriteError, PriceListDocument, build_workbook, write_admin_csv, write_csv, write_json,
    write_transport_csv, write_xlsx,
};

//! Canonical export records shared by every output format.

mod formatter;

pub use formatter::{
    ADMIN_HEADERS, AdminRecord, ExportFormatter, ExportRecord, ExportValue, RECORD_HEADERS,
    TRANSPORT_HEADERS, TransportRecord,
};

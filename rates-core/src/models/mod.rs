pub(crate) mod catalog;
mod group_key;
mod price_value;
mod transport;

pub use catalog::{Catalog, CatalogItem};
pub use group_key::GroupKey;
pub use price_value::{POA_LABEL, PriceStyle, PriceValue};
pub use transport::{TransportCharges, TransportRow, TransportSchedule, TransportType};

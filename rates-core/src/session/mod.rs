//! Live state of one pricing worksheet.

mod custom_prices;
mod editing_session;

pub use custom_prices::CustomPriceStore;
pub use editing_session::{EditingSession, SessionError};

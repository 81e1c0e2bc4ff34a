pub mod app;
pub mod config;
pub mod logging;
pub mod utils;

pub use app::{ExportFormat, RunOptions, RunReport, render_summary, run};
pub use config::{ConfigError, RatesConfig};

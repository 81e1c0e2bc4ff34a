//! `net-rates.toml` configuration.
//!
//! Every section and key is optional; anything left out falls back to the
//! built-in defaults below.
//!
//! ```toml
//! [app]
//! currency_symbol = "£"
//! default_discount = 10
//!
//! [storage]
//! snapshot_dir = "progress"
//!
//! [[transport]]
//! name = "Towables"
//! default_charge = "7.5"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use rates_core::TransportSchedule;
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

/// Config file looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "net-rates.toml";

/// Overrides `[storage] snapshot_dir`.
pub const SNAPSHOT_DIR_ENV: &str = "NET_RATES_SNAPSHOT_DIR";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("default_discount must be between 0 and 100, got {0}")]
    DefaultDiscountOutOfRange(Decimal),

    #[error("currency_symbol must not be empty")]
    EmptyCurrencySymbol,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub currency_symbol: String,
    /// Global discount a fresh session starts with.
    pub default_discount: Decimal,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            currency_symbol: "£".to_string(),
            default_discount: Decimal::ZERO,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    pub snapshot_dir: PathBuf,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            snapshot_dir: PathBuf::from("progress"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RatesConfig {
    pub app: AppSettings,
    pub storage: StorageSettings,
    pub transport: TransportSchedule,
}

impl RatesConfig {
    pub fn from_toml(input: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&contents)?;
        info!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// Loads `explicit` if given (it must exist), otherwise
    /// [`DEFAULT_CONFIG_FILE`] if present, otherwise the defaults.
    /// Environment overrides are applied last.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => {
                let fallback = Path::new(DEFAULT_CONFIG_FILE);
                if fallback.is_file() {
                    Self::from_file(fallback)?
                } else {
                    debug!("no config file, using defaults");
                    Self::default()
                }
            }
        };
        config.apply_env_overrides(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Applies overrides read through `lookup`; blank values are ignored.
    pub fn apply_env_overrides<F>(
        &mut self,
        lookup: F,
    ) where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup(SNAPSHOT_DIR_ENV).filter(|v| !v.trim().is_empty()) {
            debug!(dir = %dir, "snapshot directory overridden from environment");
            self.storage.snapshot_dir = PathBuf::from(dir);
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let discount = self.app.default_discount;
        if discount < Decimal::ZERO || discount > Decimal::ONE_HUNDRED {
            return Err(ConfigError::DefaultDiscountOutOfRange(discount));
        }
        if self.app.currency_symbol.is_empty() {
            return Err(ConfigError::EmptyCurrencySymbol);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = RatesConfig::from_toml("").unwrap();

        assert_eq!(config, RatesConfig::default());
        assert_eq!(config.app.currency_symbol, "£");
        assert_eq!(config.transport.types().len(), 8);
    }

    #[test]
    fn sections_override_defaults() {
        let config = RatesConfig::from_toml(
            r#"
            [app]
            currency_symbol = "€"
            default_discount = 12.5

            [storage]
            snapshot_dir = "/var/lib/net-rates"

            [[transport]]
            name = "Van"
            default_charge = "20"

            [[transport]]
            name = "Crane"
            default_charge = "Negotiable"
            locked = true
            "#,
        )
        .unwrap();

        assert_eq!(config.app.currency_symbol, "€");
        assert_eq!(config.app.default_discount, dec!(12.5));
        assert_eq!(config.storage.snapshot_dir, PathBuf::from("/var/lib/net-rates"));
        let names: Vec<_> = config.transport.types().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Van", "Crane"]);
        assert!(config.transport.types()[1].locked);
        assert!(!config.transport.types()[0].locked);
    }

    #[test]
    fn out_of_range_default_discount_is_rejected() {
        let result = RatesConfig::from_toml("[app]\ndefault_discount = 120\n");

        assert!(matches!(
            result,
            Err(ConfigError::DefaultDiscountOutOfRange(d)) if d == dec!(120)
        ));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let result = RatesConfig::from_toml("[app\ncurrency_symbol = ");

        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn env_override_replaces_snapshot_dir() {
        let mut config = RatesConfig::default();

        config.apply_env_overrides(|name| {
            (name == SNAPSHOT_DIR_ENV).then(|| "/tmp/snapshots".to_string())
        });

        assert_eq!(config.storage.snapshot_dir, PathBuf::from("/tmp/snapshots"));
    }

    #[test]
    fn blank_env_override_is_ignored() {
        let mut config = RatesConfig::default();

        config.apply_env_overrides(|_| Some("  ".to_string()));

        assert_eq!(config.storage.snapshot_dir, PathBuf::from("progress"));
    }
}

//! Logging bootstrap driven by the `logging` section of the configuration.
//!
//! ```toml
//! [logging]
//! level = "info"
//! filter = "dragon_wire=debug,hyper=warn"
//! format = "compact"
//! ansi = false
//! ```
//!
//! Without a `logging` section the baseline level is `debug`.

use serde::Deserialize;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::config::{from_table, ConfigError, ConfigStore, Value};

/// Key of the logging section in the root table.
pub const LOGGING_KEY: &str = "logging";

const BASELINE_LEVEL: &str = "debug";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Full,
    Compact,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// Default level for every target.
    pub level: String,
    /// Extra `EnvFilter` directives, applied after `level`.
    pub filter: Option<String>,
    pub format: LogFormat,
    pub ansi: bool,
    pub target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: BASELINE_LEVEL.to_string(),
            filter: None,
            format: LogFormat::Full,
            ansi: true,
            target: true,
        }
    }
}

impl LoggingConfig {
    /// Reads the `logging` section, falling back to the baseline when absent.
    pub fn from_store(store: &ConfigStore) -> Result<Self, ConfigError> {
        match store.table().get(LOGGING_KEY) {
            None => Ok(Self::default()),
            Some(Value::Table(section)) => from_table(section),
            Some(other) => Err(ConfigError::Logging(format!(
                "expected a table, found {}",
                other.type_name()
            ))),
        }
    }

    pub fn env_filter(&self) -> Result<EnvFilter, ConfigError> {
        let directives = match &self.filter {
            Some(filter) => format!("{},{}", self.level, filter),
            None => self.level.clone(),
        };
        EnvFilter::try_new(&directives).map_err(|e| ConfigError::Logging(e.to_string()))
    }
}

/// Installs the global subscriber described by the store.
///
/// A subscriber that is already installed (by the host or an earlier
/// initialization) is left in place.
pub fn bootstrap(store: &ConfigStore) -> Result<(), ConfigError> {
    let config = LoggingConfig::from_store(store)?;
    let filter = config.env_filter()?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(config.ansi)
        .with_target(config.target);

    let result = match config.format {
        LogFormat::Full => builder.try_init(),
        LogFormat::Compact => builder.compact().try_init(),
    };

    if let Err(e) = result {
        debug!(error = %e, "global subscriber already installed");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_baseline_without_section() {
        let store = ConfigStore::from_toml_str("other = 1").unwrap();
        let config = LoggingConfig::from_store(&store).unwrap();
        assert_eq!(config, LoggingConfig::default());
        assert_eq!(config.level, "debug");
    }

    #[test]
    fn test_reads_section() {
        let store = ConfigStore::from_toml_str(
            r#"
            [logging]
            level = "warn"
            filter = "dragon_wire=trace"
            format = "compact"
            ansi = false
            "#,
        )
        .unwrap();
        let config = LoggingConfig::from_store(&store).unwrap();

        assert_eq!(config.level, "warn");
        assert_eq!(config.format, LogFormat::Compact);
        assert!(!config.ansi);
        assert!(config.target);
        assert!(config.env_filter().is_ok());
    }

    #[test]
    fn test_rejects_non_table_section() {
        let store = ConfigStore::from_toml_str("logging = 'loud'").unwrap();
        assert!(matches!(
            LoggingConfig::from_store(&store),
            Err(ConfigError::Logging(_))
        ));
    }

    #[test]
    fn test_rejects_unknown_fields() {
        let store = ConfigStore::from_toml_str("[logging]\nvolume = 11\n").unwrap();
        assert!(LoggingConfig::from_store(&store).is_err());
    }

    #[test]
    fn test_invalid_directive() {
        let config = LoggingConfig {
            level: "dragon_wire=loudest".into(),
            ..LoggingConfig::default()
        };
        assert!(matches!(config.env_filter(), Err(ConfigError::Logging(_))));
    }

    #[test]
    fn test_bootstrap_twice_is_harmless() {
        let store = ConfigStore::from_toml_str("[logging]\nlevel = 'info'\n").unwrap();
        bootstrap(&store).unwrap();
        bootstrap(&store).unwrap();
    }
}

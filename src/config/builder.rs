use std::path::{Path, PathBuf};

use tracing::debug;

use super::env::EnvSource;
use super::file::FileSource;
use super::source::{apply_entry, ConfigSource};
use super::store::CONFIG_PATH_VAR;
use super::{ConfigError, ConfigStore, Table, Value};

/// A configuration source in the loading pipeline.
#[derive(Debug)]
enum Source {
    File { path: PathBuf, required: bool },
    FilesFromVar(String),
    Env { prefix: String, separator: String },
    Custom(Box<dyn ConfigSource>),
}

/// Builder for loading an uninitialized [`ConfigStore`] from several sources.
///
/// Whole documents (files) are merged by top-level update in registration
/// order: a later file replaces earlier top-level keys entirely. Environment
/// entries are written at their nested path.
///
/// ## Environment references
///
/// String values in files can read the process environment:
///
/// ```toml
/// [db]
/// url = "postgres://${environ.DB_HOST}:5432/app"
/// ```
///
/// Use `$$` to escape a literal `$`.
///
/// ## Example
///
/// ```no_run
/// use dragon_wire::config::{Config, Wiring};
///
/// let mut store = Config::builder()
///     .with_value("service", "billing")
///     .with_files_from_env()
///     .with_file("config/local.toml", false)
///     .load()?;
/// store.initialize(&Wiring::new())?;
/// # Ok::<(), dragon_wire::ConfigError>(())
/// ```
#[derive(Debug, Default)]
#[must_use = "builders do nothing until .load() is called"]
pub struct Config {
    extras: Table,
    sources: Vec<Source>,
}

impl Config {
    /// Creates a new configuration builder.
    pub fn builder() -> Self {
        Self::default()
    }

    /// Sets a top-level value before any source is applied, so sources may override it.
    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extras.insert(key.into(), value.into());
        self
    }

    /// Adds a TOML file to be loaded.
    ///
    /// If `required` is `true`, loading fails if the file doesn't exist.
    /// Optional files that are missing are silently skipped.
    pub fn with_file(mut self, path: impl AsRef<Path>, required: bool) -> Self {
        self.sources.push(Source::File {
            path: path.as_ref().to_path_buf(),
            required,
        });
        self
    }

    /// Adds every file named in the comma-separated list held by `var`.
    ///
    /// The variable is read when [`load`](Self::load) runs. An unset variable
    /// adds nothing; every listed file is required.
    pub fn with_files_from_var(mut self, var: impl Into<String>) -> Self {
        self.sources.push(Source::FilesFromVar(var.into()));
        self
    }

    /// Shorthand for [`with_files_from_var`](Self::with_files_from_var) with `DRAGON_WIRE_CONFIG`.
    pub fn with_files_from_env(self) -> Self {
        self.with_files_from_var(CONFIG_PATH_VAR)
    }

    /// Loads configuration from environment variables with the given prefix.
    ///
    /// Environment variables are mapped to config paths by:
    /// 1. Removing the prefix and separator
    /// 2. Splitting remaining segments on the separator
    /// 3. Converting path segments to lowercase
    ///
    /// Values are coerced from strings to the most specific type:
    /// integer, float, boolean, or string (fallback).
    pub fn with_env(mut self, prefix: impl Into<String>, separator: impl Into<String>) -> Self {
        self.sources.push(Source::Env {
            prefix: prefix.into(),
            separator: separator.into(),
        });
        self
    }

    pub fn with_source(mut self, source: impl ConfigSource + 'static) -> Self {
        self.sources.push(Source::Custom(Box::new(source)));
        self
    }

    /// Reads and merges every source into a store ready for initialization.
    pub fn load(self) -> Result<ConfigStore, ConfigError> {
        let mut merged = self.extras;

        for source in self.sources {
            let entries = match source {
                Source::File { path, required } => FileSource::new(path, required).entries()?,
                Source::FilesFromVar(var) => match std::env::var(&var) {
                    Ok(list) => {
                        let mut entries = Vec::new();
                        for file in FileSource::from_path_list(&list) {
                            debug!(path = %file.path().display(), "loading configuration file");
                            entries.extend(file.entries()?);
                        }
                        entries
                    }
                    Err(_) => {
                        debug!(%var, "configuration path variable not set");
                        Vec::new()
                    }
                },
                Source::Env { prefix, separator } => EnvSource::new(prefix, separator).entries()?,
                Source::Custom(source) => source.entries()?,
            };

            for entry in entries {
                apply_entry(&mut merged, entry);
            }
        }

        Ok(ConfigStore::from_table(merged))
    }
}

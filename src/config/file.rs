//! File-based configuration source.

use std::path::{Path, PathBuf};

use super::resolve::interpolate_environ;
use super::source::{ConfigEntry, ConfigSource};
use super::value::table_from_toml;
use super::ConfigError;

/// A configuration source that loads from a TOML file.
///
/// Files can be marked as required or optional. Required files that don't exist
/// cause an error; optional files that don't exist are silently skipped.
/// `${environ.NAME}` references in string values are filled from the process
/// environment before the document enters the store.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    required: bool,
}

impl FileSource {
    /// Creates a new file source.
    ///
    /// If `required` is true, the build will fail if the file doesn't exist.
    pub fn new(path: impl AsRef<Path>, required: bool) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            required,
        }
    }

    /// Parses a comma-separated list of paths into required file sources.
    pub fn from_path_list(list: &str) -> Vec<Self> {
        list.split(',')
            .map(str::trim)
            .filter(|path| !path.is_empty())
            .map(|path| Self::new(path, true))
            .collect()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigSource for FileSource {
    fn entries(&self) -> Result<Vec<ConfigEntry>, ConfigError> {
        let Some(mut table) = load_config_file(&self.path, self.required)? else {
            return Ok(vec![]);
        };
        interpolate_environ(&mut table, &|name: &str| std::env::var(name).ok())?;
        Ok(vec![ConfigEntry::root(table_from_toml(table))])
    }
}

/// Loads and parses a TOML config file.
///
/// Returns `Ok(None)` if the file doesn't exist and `required` is false.
fn load_config_file(path: &Path, required: bool) -> Result<Option<toml::Table>, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(contents) => {
            let table = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
                path: path.to_path_buf(),
                source: e,
            })?;
            Ok(Some(table))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            if required {
                Err(ConfigError::FileNotFound(path.to_path_buf()))
            } else {
                Ok(None)
            }
        }
        Err(e) => Err(ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Value;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_file_source_loads_valid_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "key = \"value\"").unwrap();

        let source = FileSource::new(file.path(), true);
        let entries = source.entries().unwrap();

        assert_eq!(entries.len(), 1);
        assert!(entries[0].path.is_empty());
        let table = entries[0].value.as_table().unwrap();
        assert_eq!(table.get("key"), Some(&Value::from("value")));
    }

    #[test]
    fn test_file_source_interpolates_environ() {
        std::env::set_var("DRAGON_WIRE_TEST_FILE_HOST", "db.internal");
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "host = \"${{environ.DRAGON_WIRE_TEST_FILE_HOST}}\"").unwrap();

        let entries = FileSource::new(file.path(), true).entries().unwrap();
        let table = entries[0].value.as_table().unwrap();
        assert_eq!(table.get("host"), Some(&Value::from("db.internal")));
    }

    #[test]
    fn test_file_source_parse_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "key = = 1").unwrap();

        let result = FileSource::new(file.path(), true).entries();
        assert!(matches!(result, Err(ConfigError::ParseError { .. })));
    }

    #[test]
    fn test_file_source_required_missing() {
        let source = FileSource::new("/nonexistent/path/config.toml", true);
        let result = source.entries();

        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_file_source_optional_missing() {
        let source = FileSource::new("/nonexistent/path/config.toml", false);
        let entries = source.entries().unwrap();

        assert!(entries.is_empty());
    }

    #[test]
    fn test_path_list() {
        let sources = FileSource::from_path_list(" base.toml, ,local.toml ");
        let paths: Vec<&Path> = sources.iter().map(FileSource::path).collect();
        assert_eq!(paths, [Path::new("base.toml"), Path::new("local.toml")]);
    }
}

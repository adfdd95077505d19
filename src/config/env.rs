use super::source::{ConfigEntry, ConfigSource};
use super::{ConfigError, Value};

/// Maps prefixed environment variables onto nested configuration paths.
///
/// With prefix `APP` and separator `__`, `APP__DB__PORT=5432` becomes
/// `db.port = 5432`. An empty separator is reported as
/// [`ConfigError::EmptySeparator`] when entries are read.
#[derive(Debug, Clone)]
pub struct EnvSource {
    prefix: String,
    separator: String,
}

impl EnvSource {
    pub fn new(prefix: impl Into<String>, separator: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            separator: separator.into(),
        }
    }

    fn entries_from<I>(&self, vars: I) -> Result<Vec<ConfigEntry>, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        if self.separator.is_empty() {
            return Err(ConfigError::EmptySeparator(self.prefix.clone()));
        }

        let prefix_with_sep = format!("{}{}", self.prefix, self.separator);
        let mut entries = Vec::new();

        for (key, value) in vars {
            let Some(path_str) = key.strip_prefix(&prefix_with_sep) else {
                continue;
            };
            if path_str.is_empty() {
                continue;
            }

            let path: Vec<String> = path_str
                .split(&self.separator)
                .map(|s| s.to_lowercase())
                .collect();
            entries.push(ConfigEntry::at_path(path, coerce_value(&value)));
        }

        Ok(entries)
    }
}

impl ConfigSource for EnvSource {
    fn entries(&self) -> Result<Vec<ConfigEntry>, ConfigError> {
        self.entries_from(std::env::vars())
    }
}

fn coerce_value(s: &str) -> Value {
    if s.eq_ignore_ascii_case("true") {
        return Value::Boolean(true);
    }
    if s.eq_ignore_ascii_case("false") {
        return Value::Boolean(false);
    }

    if looks_like_integer(s) {
        if let Ok(i) = s.parse::<i64>() {
            return Value::Integer(i);
        }
    }

    if s.contains('.') {
        if let Ok(f) = s.parse::<f64>() {
            return Value::Float(f);
        }
    }

    Value::String(s.to_string())
}

fn looks_like_integer(s: &str) -> bool {
    let s = s.strip_prefix('-').unwrap_or(s);
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

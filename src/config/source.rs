use super::{ConfigError, Table, Value};

/// A piece of configuration produced by a source.
///
/// An empty `path` means `value` is a whole document, merged into the store
/// by top-level update. Otherwise `value` is written at the nested path.
#[derive(Debug, Clone)]
pub struct ConfigEntry {
    pub path: Vec<String>,
    pub value: Value,
}

impl ConfigEntry {
    pub fn root(table: Table) -> Self {
        Self {
            path: Vec::new(),
            value: Value::Table(table),
        }
    }

    pub fn at_path(path: Vec<String>, value: Value) -> Self {
        Self { path, value }
    }
}

pub trait ConfigSource: std::fmt::Debug {
    fn entries(&self) -> Result<Vec<ConfigEntry>, ConfigError>;
}

/// Applies an entry to `table`.
pub fn apply_entry(table: &mut Table, entry: ConfigEntry) {
    match (entry.path.is_empty(), entry.value) {
        (true, Value::Table(document)) => {
            for (key, value) in document {
                table.insert(key, value);
            }
        }
        (true, _) => {}
        (false, value) => set_at_path(table, &entry.path, value),
    }
}

fn set_at_path(table: &mut Table, path: &[String], value: Value) {
    let Some((first, rest)) = path.split_first() else {
        return;
    };

    if rest.is_empty() {
        table.insert(first.clone(), value);
        return;
    }

    if !matches!(table.get(first), Some(Value::Table(_))) {
        table.insert(first.clone(), Value::Table(Table::new()));
    }

    if let Some(Value::Table(nested)) = table.get_mut(first) {
        set_at_path(nested, rest, value);
    }
}

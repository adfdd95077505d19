//! Configuration tree nodes.
//!
//! A [`Value`] is either plain data read from a configuration source or a live
//! [`Component`] placed into the tree by the construction phase.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::de::DeserializeOwned;

use super::component::Component;
use super::ConfigError;

/// Insertion-ordered mapping node.
pub type Table = IndexMap<String, Value>;

#[derive(Clone)]
pub enum Value {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Datetime(toml::value::Datetime),
    Array(Vec<Value>),
    Table(Table),
    Component(Arc<dyn Component>),
}

impl Value {
    /// Short name of the variant, used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::String(_) => "string",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::Boolean(_) => "boolean",
            Value::Datetime(_) => "datetime",
            Value::Array(_) => "array",
            Value::Table(_) => "table",
            Value::Component(_) => "component",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_table(&self) -> Option<&Table> {
        match self {
            Value::Table(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_table_mut(&mut self) -> Option<&mut Table> {
        match self {
            Value::Table(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_component(&self) -> Option<&Arc<dyn Component>> {
        match self {
            Value::Component(c) => Some(c),
            _ => None,
        }
    }

    /// Returns the component downcast to `T`, if this node holds one of that type.
    pub fn component<T: Component>(&self) -> Option<&T> {
        self.as_component().and_then(|c| c.downcast_ref::<T>())
    }

    /// Converts back into a TOML value. Returns `None` if a component is reachable.
    pub fn to_toml(&self) -> Option<toml::Value> {
        Some(match self {
            Value::String(s) => toml::Value::String(s.clone()),
            Value::Integer(i) => toml::Value::Integer(*i),
            Value::Float(f) => toml::Value::Float(*f),
            Value::Boolean(b) => toml::Value::Boolean(*b),
            Value::Datetime(dt) => toml::Value::Datetime(*dt),
            Value::Array(arr) => {
                toml::Value::Array(arr.iter().map(Value::to_toml).collect::<Option<_>>()?)
            }
            Value::Table(t) => toml::Value::Table(
                t.iter()
                    .map(|(k, v)| Some((k.clone(), v.to_toml()?)))
                    .collect::<Option<_>>()?,
            ),
            Value::Component(_) => return None,
        })
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Datetime(a), Value::Datetime(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Table(a), Value::Table(b)) => a == b,
            (Value::Component(a), Value::Component(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => fmt::Debug::fmt(s, f),
            Value::Integer(i) => fmt::Debug::fmt(i, f),
            Value::Float(x) => fmt::Debug::fmt(x, f),
            Value::Boolean(b) => fmt::Debug::fmt(b, f),
            Value::Datetime(dt) => fmt::Display::fmt(dt, f),
            Value::Array(arr) => f.debug_list().entries(arr).finish(),
            Value::Table(t) => f.debug_map().entries(t).finish(),
            Value::Component(c) => f.debug_tuple("Component").field(c).finish(),
        }
    }
}

impl From<toml::Value> for Value {
    fn from(value: toml::Value) -> Self {
        match value {
            toml::Value::String(s) => Value::String(s),
            toml::Value::Integer(i) => Value::Integer(i),
            toml::Value::Float(f) => Value::Float(f),
            toml::Value::Boolean(b) => Value::Boolean(b),
            toml::Value::Datetime(dt) => Value::Datetime(dt),
            toml::Value::Array(arr) => Value::Array(arr.into_iter().map(Value::from).collect()),
            toml::Value::Table(t) => Value::Table(table_from_toml(t)),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<Table> for Value {
    fn from(t: Table) -> Self {
        Value::Table(t)
    }
}

impl From<Vec<Value>> for Value {
    fn from(arr: Vec<Value>) -> Self {
        Value::Array(arr)
    }
}

impl From<Arc<dyn Component>> for Value {
    fn from(c: Arc<dyn Component>) -> Self {
        Value::Component(c)
    }
}

/// Converts a parsed TOML table, keeping key order as parsed.
pub fn table_from_toml(table: toml::Table) -> Table {
    table.into_iter().map(|(k, v)| (k, Value::from(v))).collect()
}

/// Deserializes a table of properties into `T`.
///
/// Factories use this to take typed constructor arguments:
///
/// ```
/// use dragon_wire::config::{from_table, Table};
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct Db {
///     host: String,
/// }
///
/// let mut props = Table::new();
/// props.insert("host".into(), "localhost".into());
/// let db: Db = from_table(&props)?;
/// assert_eq!(db.host, "localhost");
/// # Ok::<(), dragon_wire::ConfigError>(())
/// ```
pub fn from_table<T: DeserializeOwned>(table: &Table) -> Result<T, ConfigError> {
    let mut converted = toml::Table::new();
    for (key, value) in table {
        let value = value
            .to_toml()
            .ok_or_else(|| ConfigError::NotSerializable(key.clone()))?;
        converted.insert(key.clone(), value);
    }
    toml::Value::Table(converted)
        .try_into()
        .map_err(ConfigError::DeserializeError)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Dummy;
    impl Component for Dummy {}

    #[test]
    fn test_toml_conversion_keeps_order() {
        let parsed: toml::Table = toml::from_str(
            r#"
            zeta = 1
            alpha = "a"
            [mid]
            b = true
            a = [1, 2]
            "#,
        )
        .unwrap();
        let table = table_from_toml(parsed);
        let keys: Vec<&str> = table.keys().map(String::as_str).collect();
        assert_eq!(keys, ["zeta", "alpha", "mid"]);
        assert_eq!(table["mid"].as_table().unwrap()["b"], Value::Boolean(true));
    }

    #[test]
    fn test_component_equality_is_identity() {
        let a: Arc<dyn Component> = Arc::new(Dummy);
        let b: Arc<dyn Component> = Arc::new(Dummy);
        assert_eq!(Value::Component(a.clone()), Value::Component(a.clone()));
        assert_ne!(Value::Component(a), Value::Component(b));
    }

    #[test]
    fn test_from_table_rejects_components() {
        let mut props = Table::new();
        props.insert("inner".into(), Value::Component(Arc::new(Dummy)));
        let result: Result<toml::Table, _> = from_table(&props);
        assert!(matches!(result, Err(ConfigError::NotSerializable(key)) if key == "inner"));
    }

    #[test]
    fn test_component_downcast() {
        let value = Value::Component(Arc::new(Dummy));
        assert!(value.component::<Dummy>().is_some());
        assert!(Value::Integer(3).component::<Dummy>().is_none());
    }
}

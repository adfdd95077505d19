//! Scripting capability for `script-marker` nodes.
//!
//! The host decides what a script is. The crate only hands the script text and
//! the mutable store to a [`ScriptEngine`]. [`TomlScript`] is a built-in engine
//! that treats the script as a TOML fragment and writes it into the store.

use super::error::BoxError;
use super::value::table_from_toml;
use super::{ConfigStore, Table, Value};

pub trait ScriptEngine: Send + Sync {
    /// Runs `script` against the store. Changes to `config` are visible to
    /// every node processed afterwards.
    fn execute(&self, script: &str, config: &mut ConfigStore) -> Result<(), BoxError>;
}

impl<F> ScriptEngine for F
where
    F: Fn(&str, &mut ConfigStore) -> Result<(), BoxError> + Send + Sync,
{
    fn execute(&self, script: &str, config: &mut ConfigStore) -> Result<(), BoxError> {
        self(script, config)
    }
}

/// Assignment-only engine: the script is a TOML document deep-merged into the store.
///
/// ```toml
/// [setup]
/// script-marker = [
///     "cache.ttl = 30",
///     "cache.backend = 'memory'",
/// ]
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct TomlScript;

impl ScriptEngine for TomlScript {
    fn execute(&self, script: &str, config: &mut ConfigStore) -> Result<(), BoxError> {
        let parsed: toml::Table = toml::from_str(script)?;
        deep_merge(config.table_mut(), table_from_toml(parsed));
        Ok(())
    }
}

fn deep_merge(base: &mut Table, overlay: Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(Value::Table(base_table)), Value::Table(overlay_table)) => {
                deep_merge(base_table, overlay_table);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

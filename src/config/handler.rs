//! Marker handlers.
//!
//! Each handler recognizes one reserved key in a table node and turns the
//! node's remaining properties into its replacement value.

use std::sync::{Arc, Weak};

use tracing::debug;

use super::component::{Component, Registry};
use super::script::ScriptEngine;
use super::{ConfigError, ConfigStore, Table, Value};

/// Marker of a component specification.
pub const FACTORY_MARKER: &str = "factory-marker";
/// Marker of a copy of another configuration value.
pub const COPY_MARKER: &str = "copy-marker";
/// Marker of an inline script.
pub const SCRIPT_MARKER: &str = "script-marker";

pub(crate) enum Handler<'w> {
    Copy(CopyHandler),
    Script(ScriptHandler<'w>),
    Component(ComponentHandler<'w>),
}

impl Handler<'_> {
    pub(crate) fn marker(&self) -> &'static str {
        match self {
            Handler::Copy(_) => COPY_MARKER,
            Handler::Script(_) => SCRIPT_MARKER,
            Handler::Component(_) => FACTORY_MARKER,
        }
    }

    /// Produces the replacement for `node`, which is a snapshot the handler owns.
    pub(crate) fn apply(&mut self, node: Table, store: &mut ConfigStore) -> Result<Value, ConfigError> {
        match self {
            Handler::Copy(h) => h.apply(node, store),
            Handler::Script(h) => h.apply(node, store),
            Handler::Component(h) => h.apply(node),
        }
    }

    /// Post-phase step. Only the component handler has work to do here.
    pub(crate) fn finish(&mut self, store: &ConfigStore) -> Result<(), ConfigError> {
        match self {
            Handler::Component(h) => h.finish(store),
            Handler::Copy(_) | Handler::Script(_) => Ok(()),
        }
    }
}

/// Replaces `{copy-marker = "a.b", ...}` with a deep copy of the value at `a.b`.
pub(crate) struct CopyHandler;

impl CopyHandler {
    fn apply(&self, mut node: Table, store: &ConfigStore) -> Result<Value, ConfigError> {
        let path = take_string(&mut node, COPY_MARKER)?;
        let mut value = store.lookup(&path)?.clone();
        debug!(%path, extra = node.len(), "copying value");

        if !node.is_empty() {
            let target = value
                .as_table_mut()
                .ok_or_else(|| ConfigError::CopyMerge { path: path.clone() })?;
            target.extend(node);
        }

        Ok(value)
    }
}

/// Runs `{script-marker = ...}` through the host's script engine and keeps the
/// remaining properties as the node's value.
pub(crate) struct ScriptHandler<'w> {
    engine: Option<&'w dyn ScriptEngine>,
}

impl<'w> ScriptHandler<'w> {
    pub(crate) fn new(engine: Option<&'w dyn ScriptEngine>) -> Self {
        Self { engine }
    }

    fn apply(&self, mut node: Table, store: &mut ConfigStore) -> Result<Value, ConfigError> {
        let script = match node.shift_remove(SCRIPT_MARKER) {
            Some(Value::String(s)) => s,
            Some(Value::Array(lines)) => lines
                .iter()
                .map(|line| {
                    line.as_str().ok_or(ConfigError::InvalidMarker {
                        marker: SCRIPT_MARKER,
                        expected: "a string or an array of strings",
                        found: line.type_name(),
                    })
                })
                .collect::<Result<Vec<_>, _>>()?
                .join("\n"),
            other => {
                return Err(ConfigError::InvalidMarker {
                    marker: SCRIPT_MARKER,
                    expected: "a string or an array of strings",
                    found: other.as_ref().map_or("nothing", Value::type_name),
                })
            }
        };

        let engine = self.engine.ok_or(ConfigError::ScriptEngineMissing)?;
        debug!(lines = script.lines().count(), "running script");
        engine
            .execute(&script, store)
            .map_err(|source| ConfigError::ScriptExecution { script, source })?;

        Ok(Value::Table(node))
    }
}

/// Builds components from `{factory-marker = "dotted.name", ...}` nodes.
pub(crate) struct ComponentHandler<'w> {
    registry: &'w Registry,
    created: Vec<Weak<dyn Component>>,
}

impl<'w> ComponentHandler<'w> {
    pub(crate) fn new(registry: &'w Registry) -> Self {
        Self {
            registry,
            created: Vec::new(),
        }
    }

    fn apply(&mut self, mut node: Table) -> Result<Value, ConfigError> {
        let name = take_string(&mut node, FACTORY_MARKER)?;
        let factory = self.registry.resolve(&name)?;
        debug!(factory = %name, "constructing component");

        let component = factory.create(node).map_err(ConfigError::Component)?;
        self.created.push(Arc::downgrade(&component));
        Ok(Value::Component(component))
    }

    /// Calls every component's post-construction hook, in creation order.
    fn finish(&mut self, store: &ConfigStore) -> Result<(), ConfigError> {
        for weak in self.created.drain(..) {
            let Some(component) = weak.upgrade() else {
                debug!("component dropped before initialization, skipping hook");
                continue;
            };
            component
                .initialize_component(store)
                .map_err(ConfigError::Component)?;
        }
        Ok(())
    }
}

fn take_string(node: &mut Table, marker: &'static str) -> Result<String, ConfigError> {
    match node.shift_remove(marker) {
        Some(Value::String(s)) => Ok(s),
        other => Err(ConfigError::InvalidMarker {
            marker,
            expected: "a string",
            found: other.as_ref().map_or("nothing", Value::type_name),
        }),
    }
}

//! Two-phase initialization.
//!
//! Phase one resolves values (copies and scripts) so that phase two can build
//! components from fully resolved specifications.

use std::fmt;
use std::sync::Arc;

use tracing::info;

use super::component::{Factory, Registry};
use super::handler::{ComponentHandler, CopyHandler, Handler, ScriptHandler};
use super::script::ScriptEngine;
use super::walk::walk;
use super::{ConfigError, ConfigStore};
use crate::logging;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Values,
    Construction,
}

impl Phase {
    pub const ALL: [Phase; 2] = [Phase::Values, Phase::Construction];

    /// Handlers of this phase in precedence order.
    fn handlers(self, wiring: &Wiring) -> Vec<Handler<'_>> {
        match self {
            Phase::Values => vec![
                Handler::Copy(CopyHandler),
                Handler::Script(ScriptHandler::new(wiring.script_engine.as_deref())),
            ],
            Phase::Construction => vec![Handler::Component(ComponentHandler::new(&wiring.registry))],
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Values => write!(f, "values"),
            Phase::Construction => write!(f, "construction"),
        }
    }
}

/// Host-supplied collaborators used during initialization.
///
/// ```
/// use std::sync::Arc;
/// use dragon_wire::config::{BoxError, Component, ConfigStore, Table, TomlScript, Wiring};
///
/// #[derive(Debug)]
/// struct Cache;
/// impl Component for Cache {}
///
/// let wiring = Wiring::new()
///     .with_factory("cache.Memory", |_props: Table| -> Result<Arc<dyn Component>, BoxError> {
///         Ok(Arc::new(Cache))
///     })
///     .with_script_engine(TomlScript)
///     .with_logging(false);
///
/// let mut config = ConfigStore::from_toml_str("[cache]\nfactory-marker = 'cache.Memory'\n")?;
/// config.initialize(&wiring)?;
/// assert!(config.get("cache")?.component::<Cache>().is_some());
/// # Ok::<(), dragon_wire::ConfigError>(())
/// ```
#[must_use]
pub struct Wiring {
    registry: Registry,
    script_engine: Option<Arc<dyn ScriptEngine>>,
    bootstrap_logging: bool,
}

impl Wiring {
    pub fn new() -> Self {
        Self {
            registry: Registry::new(),
            script_engine: None,
            bootstrap_logging: true,
        }
    }

    pub fn with_registry(mut self, registry: Registry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_factory(mut self, name: impl Into<String>, factory: impl Factory + 'static) -> Self {
        self.registry.register(name, factory);
        self
    }

    pub fn with_script_engine(mut self, engine: impl ScriptEngine + 'static) -> Self {
        self.script_engine = Some(Arc::new(engine));
        self
    }

    /// Whether to install a global `tracing` subscriber before the first phase.
    pub fn with_logging(mut self, enabled: bool) -> Self {
        self.bootstrap_logging = enabled;
        self
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }
}

impl Default for Wiring {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Wiring {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wiring")
            .field("registry", &self.registry)
            .field("script_engine", &self.script_engine.is_some())
            .field("bootstrap_logging", &self.bootstrap_logging)
            .finish()
    }
}

/// Bootstraps logging, then walks the store once per phase and runs each
/// handler's finishing step after its walk.
pub(crate) fn run(store: &mut ConfigStore, wiring: &Wiring) -> Result<(), ConfigError> {
    if wiring.bootstrap_logging {
        logging::bootstrap(store)?;
    }

    for phase in Phase::ALL {
        let mut handlers = phase.handlers(wiring);
        walk(store, &mut handlers)?;
        for handler in &mut handlers {
            handler.finish(store)?;
        }
        info!(%phase, "configuration phase complete");
    }

    Ok(())
}

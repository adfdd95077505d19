//! Live components and the dotted-name factory registry.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::error::BoxError;
use super::{ConfigError, ConfigStore, Table};

/// A live object constructed from a `factory-marker` node.
///
/// Components may implement [`initialize_component`](Self::initialize_component)
/// to finish setting themselves up once every component of the construction
/// phase exists. The default does nothing.
pub trait Component: Any + fmt::Debug + Send + Sync {
    /// Post-construction hook, called at most once with the initialized store.
    fn initialize_component(&self, _config: &ConfigStore) -> Result<(), BoxError> {
        Ok(())
    }
}

impl dyn Component {
    pub fn downcast_ref<T: Component>(&self) -> Option<&T> {
        (self as &dyn Any).downcast_ref::<T>()
    }

    pub fn is<T: Component>(&self) -> bool {
        (self as &dyn Any).is::<T>()
    }
}

/// Builds a component from the properties of its specification node.
pub trait Factory: Send + Sync {
    fn create(&self, properties: Table) -> Result<Arc<dyn Component>, BoxError>;
}

impl<F> Factory for F
where
    F: Fn(Table) -> Result<Arc<dyn Component>, BoxError> + Send + Sync,
{
    fn create(&self, properties: Table) -> Result<Arc<dyn Component>, BoxError> {
        self(properties)
    }
}

/// Maps dotted names such as `storage.sqlite.Database` to factories.
#[derive(Default)]
pub struct Registry {
    factories: HashMap<String, Box<dyn Factory>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `factory` under `name`, replacing any previous registration.
    pub fn register(&mut self, name: impl Into<String>, factory: impl Factory + 'static) {
        self.factories.insert(name.into(), Box::new(factory));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Resolves a dotted name to its factory.
    pub fn resolve(&self, name: &str) -> Result<&dyn Factory, ConfigError> {
        let not_found = || ConfigError::FactoryResolution {
            name: name.to_string(),
        };

        if name.is_empty() || name.split('.').any(str::is_empty) {
            return Err(not_found());
        }

        self.factories
            .get(name)
            .map(|factory| factory.as_ref())
            .ok_or_else(not_found)
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("Registry").field("factories", &names).finish()
    }
}

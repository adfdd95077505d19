//! Application context holding the initialized configuration.

use crate::config::{ConfigStore, Factory, Registry, ScriptEngine, Wiring};
use crate::Error;

/// Central application context holding the initialized [`ConfigStore`].
///
/// The context is the explicit handle hosts pass around instead of a
/// process-wide global: build it once at startup and hand out references.
///
/// ## Example
///
/// ```no_run
/// use std::sync::Arc;
/// use dragon_wire::config::{BoxError, Component, Config, Table, TomlScript};
/// use dragon_wire::AppContext;
///
/// #[derive(Debug)]
/// struct Mailer;
/// impl Component for Mailer {}
///
/// let ctx = AppContext::builder()
///     .with_config(Config::builder().with_files_from_env().load()?)
///     .with_factory("mail.Mailer", |_props: Table| -> Result<Arc<dyn Component>, BoxError> {
///         Ok(Arc::new(Mailer))
///     })
///     .with_script_engine(TomlScript)
///     .build()?;
///
/// let _mailer = ctx.config().get("mailer")?;
/// # Ok::<(), dragon_wire::Error>(())
/// ```
#[derive(Debug)]
pub struct AppContext {
    config: ConfigStore,
}

impl AppContext {
    /// Creates a new builder for constructing an `AppContext`.
    pub fn builder() -> AppContextBuilder {
        AppContextBuilder {
            config: None,
            wiring: Wiring::new(),
        }
    }

    /// Returns a reference to the initialized configuration.
    pub fn config(&self) -> &ConfigStore {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut ConfigStore {
        &mut self.config
    }

    pub fn into_config(self) -> ConfigStore {
        self.config
    }
}

/// Builder for constructing an [`AppContext`].
#[derive(Debug)]
#[must_use = "builders do nothing until .build() is called"]
pub struct AppContextBuilder {
    config: Option<ConfigStore>,
    wiring: Wiring,
}

impl AppContextBuilder {
    /// Attaches the configuration, usually the result of
    /// [`Config::builder().load()`](crate::Config::load).
    pub fn with_config(mut self, config: ConfigStore) -> Self {
        self.config = Some(config);
        self
    }

    pub fn with_factory(mut self, name: impl Into<String>, factory: impl Factory + 'static) -> Self {
        self.wiring = self.wiring.with_factory(name, factory);
        self
    }

    pub fn with_registry(mut self, registry: Registry) -> Self {
        self.wiring = self.wiring.with_registry(registry);
        self
    }

    pub fn with_script_engine(mut self, engine: impl ScriptEngine + 'static) -> Self {
        self.wiring = self.wiring.with_script_engine(engine);
        self
    }

    /// Whether initialization installs a global `tracing` subscriber. On by default.
    pub fn with_logging(mut self, enabled: bool) -> Self {
        self.wiring = self.wiring.with_logging(enabled);
        self
    }

    /// Initializes the configuration, if it isn't already, and builds the `AppContext`.
    ///
    /// Returns an error if no configuration was provided or initialization fails.
    pub fn build(self) -> Result<AppContext, Error> {
        let mut config = self.config.ok_or(Error::MissingConfig)?;
        config.get_or_initialize(&self.wiring)?;
        Ok(AppContext { config })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::config::{BoxError, Component, ConfigError, Table, TomlScript, Value};

    #[derive(Debug, Default)]
    struct Counter {
        hooks: AtomicUsize,
    }

    impl Component for Counter {
        fn initialize_component(&self, _config: &ConfigStore) -> Result<(), BoxError> {
            self.hooks.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn counter(_props: Table) -> Result<Arc<dyn Component>, BoxError> {
        Ok(Arc::new(Counter::default()))
    }

    #[test]
    fn test_build_initializes_config() {
        let config = ConfigStore::from_toml_str(
            r#"
            [setup]
            script-marker = "counter_name = 'primary'"
            [counter]
            factory-marker = "stats.Counter"
            "#,
        )
        .unwrap();

        let ctx = AppContext::builder()
            .with_config(config)
            .with_factory("stats.Counter", counter)
            .with_script_engine(TomlScript)
            .with_logging(false)
            .build()
            .unwrap();

        let store = ctx.config();
        assert!(store.is_initialized());
        assert_eq!(store.get("counter_name").unwrap(), &Value::from("primary"));
        let counter = store.get("counter").unwrap().component::<Counter>().unwrap();
        assert_eq!(counter.hooks.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_build_reuses_initialized_config() {
        let mut config = ConfigStore::from_toml_str("[counter]\nfactory-marker = 'stats.Counter'\n").unwrap();
        let wiring = Wiring::new()
            .with_factory("stats.Counter", counter)
            .with_logging(false);
        config.initialize(&wiring).unwrap();

        let ctx = AppContext::builder()
            .with_config(config)
            .with_logging(false)
            .build()
            .unwrap();

        let counter = ctx.config().get("counter").unwrap().component::<Counter>().unwrap();
        assert_eq!(counter.hooks.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_missing_config() {
        let result = AppContext::builder().with_logging(false).build();
        assert!(matches!(result, Err(Error::MissingConfig)));
    }

    #[test]
    fn test_initialization_error_is_wrapped() {
        let config = ConfigStore::from_toml_str("[x]\nfactory-marker = 'unknown.Thing'\n").unwrap();
        let result = AppContext::builder()
            .with_config(config)
            .with_logging(false)
            .build();
        assert!(matches!(
            result,
            Err(Error::Config(ConfigError::FactoryResolution { .. }))
        ));
    }
}

//! The configuration store: the root table plus its initialization state.

use tracing::debug;

use super::phase::{self, Wiring};
use super::value::table_from_toml;
use super::{ConfigError, Table, Value};

/// Environment variable holding the comma-separated list of configuration files.
pub const CONFIG_PATH_VAR: &str = "DRAGON_WIRE_CONFIG";

const MISSING_KEY_HINT: &str = "Maybe you forgot to set the environment variable \
DRAGON_WIRE_CONFIG to point to your configuration file(s)? It takes a \
comma-separated list of TOML files, merged left to right.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum State {
    #[default]
    Uninitialized,
    Initializing,
    Initialized,
}

/// The root configuration table.
///
/// A store starts out as plain data. [`initialize`](Self::initialize) runs the
/// value phase and the construction phase over it exactly once, after which
/// marker nodes have been replaced by copies, script residue and components.
#[derive(Debug, Default)]
pub struct ConfigStore {
    table: Table,
    state: State,
}

impl ConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_table(table: Table) -> Self {
        Self {
            table,
            state: State::Uninitialized,
        }
    }

    /// Parses a TOML document into an uninitialized store.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let table: toml::Table = toml::from_str(source)?;
        Ok(Self::from_table(table_from_toml(table)))
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn is_initialized(&self) -> bool {
        self.state == State::Initialized
    }

    /// Returns the value stored under `key`.
    ///
    /// A missing key fails with [`ConfigError::MissingKey`], whose message
    /// explains how configuration files are supplied.
    pub fn get(&self, key: &str) -> Result<&Value, ConfigError> {
        self.table.get(key).ok_or_else(|| missing_key(key))
    }

    pub fn get_mut(&mut self, key: &str) -> Result<&mut Value, ConfigError> {
        self.table.get_mut(key).ok_or_else(|| missing_key(key))
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.table.contains_key(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.table.insert(key.into(), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.table.shift_remove(key)
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn table_mut(&mut self) -> &mut Table {
        &mut self.table
    }

    /// Shallow merge: top-level keys of `other` replace those already present.
    pub fn update(&mut self, other: Table) {
        for (key, value) in other {
            self.table.insert(key, value);
        }
    }

    /// Resolves a dotted path such as `services.db.host` by successive table lookups.
    pub fn lookup(&self, path: &str) -> Result<&Value, ConfigError> {
        let missing = |segment: &str| ConfigError::CopyPath {
            path: path.to_string(),
            segment: segment.to_string(),
        };

        let mut segments = path.split('.');
        let first = segments.next().unwrap_or_default();
        let mut current = self.table.get(first).ok_or_else(|| missing(first))?;

        for segment in segments {
            current = current
                .as_table()
                .and_then(|t| t.get(segment))
                .ok_or_else(|| missing(segment))?;
        }

        Ok(current)
    }

    /// Runs both initialization phases over the store.
    ///
    /// Fails with [`ConfigError::AlreadyInitialized`] without touching the
    /// table if the store was initialized before. A failure part-way leaves
    /// the table partially transformed; callers are expected to abort.
    pub fn initialize(&mut self, wiring: &Wiring) -> Result<(), ConfigError> {
        if self.state != State::Uninitialized {
            return Err(ConfigError::AlreadyInitialized);
        }

        self.state = State::Initializing;
        phase::run(self, wiring)?;
        self.state = State::Initialized;
        debug!(keys = self.table.len(), "configuration initialized");
        Ok(())
    }

    /// Initializes the store on first use; later calls return it unchanged.
    ///
    /// A store left behind by a failed initialization is never handed out:
    /// it fails with [`ConfigError::PartiallyInitialized`].
    pub fn get_or_initialize(&mut self, wiring: &Wiring) -> Result<&mut Self, ConfigError> {
        match self.state {
            State::Uninitialized => self.initialize(wiring)?,
            State::Initializing => return Err(ConfigError::PartiallyInitialized),
            State::Initialized => {}
        }
        Ok(self)
    }
}

fn missing_key(key: &str) -> ConfigError {
    ConfigError::MissingKey {
        key: key.to_string(),
        hint: MISSING_KEY_HINT,
    }
}

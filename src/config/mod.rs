//! Configuration loading, the config store, and its two-phase initialization.

mod builder;
mod component;
mod env;
mod error;
mod file;
mod handler;
mod phase;
mod resolve;
mod script;
mod source;
mod store;
mod value;
mod walk;

pub use builder::Config;
pub use component::{Component, Factory, Registry};
pub use env::EnvSource;
pub use error::{BoxError, ConfigError};
pub use file::FileSource;
pub use handler::{COPY_MARKER, FACTORY_MARKER, SCRIPT_MARKER};
pub use phase::{Phase, Wiring};
pub use resolve::ENVIRON;
pub use script::{ScriptEngine, TomlScript};
pub use source::{ConfigEntry, ConfigSource};
pub use store::{ConfigStore, State, CONFIG_PATH_VAR};
pub use value::{from_table, table_from_toml, Table, Value};

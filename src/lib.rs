pub mod config;
pub mod context;
mod error;
pub mod logging;

pub use config::{Component, Config, ConfigError, ConfigStore, Value, Wiring};
pub use context::AppContext;
pub use error::Error;

use std::path::PathBuf;
use thiserror::Error;

/// Boxed error for faults raised by host-supplied factories, hooks and script engines.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("the required key '{key}' was not found in your configuration. {hint}")]
    MissingKey { key: String, hint: &'static str },

    #[error("configuration was already initialized")]
    AlreadyInitialized,

    #[error("an earlier initialization failed part-way; the configuration is unusable")]
    PartiallyInitialized,

    #[error("cannot copy '{path}': segment '{segment}' not found")]
    CopyPath { path: String, segment: String },

    #[error("cannot merge extra properties into copy of '{path}': value is not a table")]
    CopyMerge { path: String },

    #[error("script failed: {source}\n--- script ---\n{script}")]
    ScriptExecution { script: String, source: BoxError },

    #[error("configuration contains a script but no script engine was configured")]
    ScriptEngineMissing,

    #[error("cannot resolve factory '{name}'")]
    FactoryResolution { name: String },

    #[error("invalid value for marker '{marker}': expected {expected}, found {found}")]
    InvalidMarker {
        marker: &'static str,
        expected: &'static str,
        found: &'static str,
    },

    #[error(transparent)]
    Component(BoxError),

    #[error("value at '{0}' holds a component and cannot be deserialized")]
    NotSerializable(String),

    #[error("failed to deserialize config: {0}")]
    DeserializeError(#[from] toml::de::Error),

    #[error("invalid logging configuration: {0}")]
    Logging(String),

    #[error("required config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("environment variable referenced in config is not set: {0}")]
    MissingEnvVar(String),

    #[error("invalid reference '{0}' (only ${{environ.NAME}} is supported)")]
    InvalidReference(String),

    #[error("unclosed reference (missing '}}')")]
    UnclosedReference,

    #[error("environment source separator must not be empty (prefix '{0}')")]
    EmptySeparator(String),
}

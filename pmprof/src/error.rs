//! Error types.
//!
//! The measurement API itself is total and never fails. Errors only arise at
//! the edges: reading or writing the configuration file and exporting
//! snapshots as JSON.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from loading, saving or editing configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O error reading or writing the configuration file.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid INI.
    #[error("Failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    /// No setting with this name exists.
    #[error("Unknown configuration key '{0}'")]
    UnknownKey(String),

    /// The value cannot be converted to the setting's type.
    #[error("Invalid value '{value}' for {key}: {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },
}

/// Errors from profiler operations that touch the outside world.
#[derive(Debug, Error)]
pub enum ProfilerError {
    /// Configuration could not be loaded or saved.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Snapshot could not be serialised.
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

//! CLI error type.

use pmprof::{ConfigError, ProfilerError};
use thiserror::Error;

/// Errors surfaced to the user by CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// Invalid configuration key or value given on the command line.
    #[error("{0}")]
    Config(String),

    /// Configuration file could not be read or written.
    #[error(transparent)]
    ConfigFile(#[from] ConfigError),

    /// Profiler operation failed.
    #[error(transparent)]
    Profiler(#[from] ProfilerError),

    /// Invalid command-line argument.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

//! Helpers shared across CLI commands.

use std::path::{Path, PathBuf};

use pmprof::{config_file_path, ProfilerConfig};
use tracing::warn;

use crate::error::CliError;

/// The configuration file in effect: the `--config` override or the default.
pub fn effective_config_path(override_path: Option<&Path>) -> PathBuf {
    override_path
        .map(Path::to_path_buf)
        .unwrap_or_else(config_file_path)
}

/// Load the configuration, using defaults when the file does not exist yet.
pub fn load_config(override_path: Option<&Path>) -> Result<ProfilerConfig, CliError> {
    let path = effective_config_path(override_path);
    if !path.exists() {
        return Ok(ProfilerConfig::default());
    }
    Ok(ProfilerConfig::load_from(&path)?)
}

/// Load the configuration, falling back to defaults on any error.
pub fn load_config_or_default(override_path: Option<&Path>) -> ProfilerConfig {
    load_config(override_path).unwrap_or_else(|e| {
        warn!(error = %e, "Using default configuration");
        ProfilerConfig::default()
    })
}

//! Configuration management CLI commands.
//!
//! Provides `config get`, `config set`, `config list`, and `config path` for
//! viewing and modifying profiler settings from the command line.

use std::path::Path;

use clap::Subcommand;
use pmprof::{ConfigKey, ProfilerConfig};

use super::common::{effective_config_path, load_config, load_config_or_default};
use crate::error::CliError;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Get a configuration value
    Get {
        /// Configuration key in format section.key (e.g., report.chain_totals_row)
        key: String,
    },

    /// Set a configuration value
    Set {
        /// Configuration key in format section.key (e.g., profiler.enabled)
        key: String,

        /// Value to set
        value: String,
    },

    /// List all configuration settings
    List,

    /// Show the configuration file path
    Path,
}

/// Run a config subcommand.
pub fn run(command: ConfigCommands, config_path: Option<&Path>) -> Result<(), CliError> {
    match command {
        ConfigCommands::Get { key } => run_get(&key, config_path),
        ConfigCommands::Set { key, value } => run_set(&key, &value, config_path),
        ConfigCommands::List => run_list(config_path),
        ConfigCommands::Path => run_path(config_path),
    }
}

fn parse_key(key: &str) -> Result<ConfigKey, CliError> {
    key.parse::<ConfigKey>().map_err(|_| {
        CliError::Config(format!(
            "Unknown configuration key '{}'. Use 'pmprof config list' to see available keys.",
            key
        ))
    })
}

/// Get a configuration value.
fn run_get(key: &str, config_path: Option<&Path>) -> Result<(), CliError> {
    let config_key = parse_key(key)?;
    let config = load_config_or_default(config_path);
    println!("{}", config_key.get(&config));
    Ok(())
}

/// Set a configuration value.
fn run_set(key: &str, value: &str, config_path: Option<&Path>) -> Result<(), CliError> {
    let config_key = parse_key(key)?;
    let path = effective_config_path(config_path);

    let mut config = load_config(Some(path.as_path()))?;
    set_value(&mut config, config_key, value)?;
    config.save_to(&path)?;

    println!("Set {} = {}", config_key.name(), config_key.get(&config));
    Ok(())
}

fn set_value(config: &mut ProfilerConfig, key: ConfigKey, value: &str) -> Result<(), CliError> {
    key.set(config, value)
        .map_err(|e| CliError::Config(e.to_string()))
}

/// List all configuration settings.
fn run_list(config_path: Option<&Path>) -> Result<(), CliError> {
    let config = load_config_or_default(config_path);
    print!("{}", render_list(&config));
    Ok(())
}

fn render_list(config: &ProfilerConfig) -> String {
    let mut lines = vec![
        "Configuration Settings".to_string(),
        "======================".to_string(),
        String::new(),
    ];

    let mut current_section = "";
    for key in ConfigKey::all() {
        let section = key.section();

        if section != current_section {
            if !current_section.is_empty() {
                lines.push(String::new());
            }
            lines.push(format!("[{}]", section));
            current_section = section;
        }

        lines.push(format!("  {} = {}", key.key_name(), key.get(config)));
    }

    lines.push(String::new());
    lines.join("\n")
}

/// Show the configuration file path.
fn run_path(config_path: Option<&Path>) -> Result<(), CliError> {
    println!("{}", effective_config_path(config_path).display());
    Ok(())
}

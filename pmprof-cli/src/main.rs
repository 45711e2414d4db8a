//! pmprof CLI - Command-line interface
//!
//! Runs an instrumented demo workload and manages the profiler configuration
//! file.

mod commands;
mod error;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing::debug;

use commands::config::ConfigCommands;
use commands::demo::DemoArgs;
use error::CliError;

#[derive(Debug, Parser)]
#[command(name = "pmprof", version, about = "Poor man's profiling for time and memory")]
struct Cli {
    /// Enable debug logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use this configuration file instead of the default location
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run an instrumented workload and print every report
    Demo(DemoArgs),

    /// View or modify configuration settings
    #[command(subcommand)]
    Config(ConfigCommands),
}

fn main() {
    let cli = Cli::parse();
    pmprof::logging::init_logging(cli.verbose);
    debug!(command = ?cli.command, "Starting");

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Demo(args) => commands::demo::run(args, config_path),
        Commands::Config(command) => commands::config::run(command, config_path),
    }
}

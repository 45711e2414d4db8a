//! Logging setup.
//!
//! The library only emits `tracing` events; installing a subscriber is up to
//! the application. [`init_logging`] is a convenience for binaries and tests
//! that want readable output on stderr.

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset.
fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "pmprof=debug,pmprof_cli=debug"
    } else {
        "pmprof=info,pmprof_cli=info"
    }
}

/// Install a stderr fmt subscriber.
///
/// `RUST_LOG` takes precedence over `verbose`. Returns `false` when a global
/// subscriber was already installed, in which case nothing changes.
pub fn init_logging(verbose: bool) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .is_ok()
}

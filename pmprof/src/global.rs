//! Process-wide profiler for drop-in instrumentation.

use std::sync::OnceLock;

use tracing::warn;

use crate::config::ProfilerConfig;
use crate::profiler::Profiler;

static GLOBAL_PROFILER: OnceLock<Profiler> = OnceLock::new();

/// The shared process-wide [`Profiler`].
///
/// Created on first use from the configuration file, or from defaults when
/// the file is missing or unreadable. Code that needs isolation (tests,
/// libraries) should own a `Profiler` instead.
///
/// ```
/// let profiler = pmprof::global();
/// profiler.counter_inc("startup", "calls");
/// println!("{}", profiler.report_profile_counters("startup"));
/// ```
pub fn global() -> &'static Profiler {
    GLOBAL_PROFILER.get_or_init(|| {
        let config = ProfilerConfig::load().unwrap_or_else(|e| {
            warn!(error = %e, "Ignoring unreadable profiler configuration");
            ProfilerConfig::default()
        });
        Profiler::from_config(config)
    })
}

//! The public facade.
//!
//! [`Profiler`] owns a [`ProfileRegistry`], the runtime settings and a
//! [`HostRuntime`]. Every operation resolves its profile reference, looks up
//! or creates the entity it needs, and delegates to it.
//!
//! # Enabled Flag
//!
//! The enabled flag is checked first by every operation. While disabled:
//!
//! - mutations do nothing
//! - reads return zero or empty values and create nothing
//! - reports return [`DISABLED_MARKER`](crate::DISABLED_MARKER)
//!
//! [`Profiler::gc`] is the inverse: it only reaches the host while disabled.
//!
//! # Profile References
//!
//! Operations take `impl Into<ProfileRef>`, so callers can pass a name
//! (`"orders"`), a sample object (`ProfileRef::of(&service)`) or
//! `ProfileRef::Default`.

use std::any::Any;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use tracing::{debug, info};

use crate::cache::{downcast_value, CacheValue};
use crate::chain::ChainSnapshot;
use crate::clock::ClockSnapshot;
use crate::config::{ProfilerConfig, ReportOptions};
use crate::counter::CounterSnapshot;
use crate::error::ProfilerError;
use crate::host::{HostRuntime, SystemHost};
use crate::naming::ProfileRef;
use crate::registry::{Profile, ProfileRegistry};
use crate::report::Renderer;

/// Settings that may change while the profiler is in use.
#[derive(Debug, Clone)]
struct Settings {
    default_profile_name: String,
    report: ReportOptions,
}

/// Serialisable copy of every counter, clock and chain.
///
/// Each list is sorted by profile, then name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RegistrySnapshot {
    pub counters: Vec<CounterSnapshot>,
    pub clocks: Vec<ClockSnapshot>,
    pub chains: Vec<ChainSnapshot>,
}

/// In-process instrumentation registry.
pub struct Profiler {
    registry: ProfileRegistry,
    enabled: AtomicBool,
    settings: RwLock<Settings>,
    host: Arc<dyn HostRuntime>,
}

impl Default for Profiler {
    fn default() -> Self {
        Self::new()
    }
}

impl Profiler {
    /// Create an enabled profiler with default settings and the system host.
    pub fn new() -> Self {
        Self::from_config(ProfilerConfig::default())
    }

    /// Create a profiler from a configuration.
    pub fn from_config(config: ProfilerConfig) -> Self {
        Self {
            registry: ProfileRegistry::new(),
            enabled: AtomicBool::new(config.enabled),
            settings: RwLock::new(Settings {
                default_profile_name: config.default_profile_name,
                report: config.report,
            }),
            host: Arc::new(SystemHost::new()),
        }
    }

    /// Replace the host runtime.
    pub fn with_host(mut self, host: Arc<dyn HostRuntime>) -> Self {
        self.host = host;
        self
    }

    // ------------------------------------------------------------------
    // Settings
    // ------------------------------------------------------------------

    /// Whether operations currently take effect.
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    /// Turn the profiler on or off.
    pub fn set_enabled(&self, enabled: bool) {
        let previous = self.enabled.swap(enabled, Ordering::AcqRel);
        if previous != enabled {
            info!(enabled, "Profiler toggled");
        }
    }

    /// Turn the profiler on.
    pub fn enable(&self) {
        self.set_enabled(true);
    }

    /// Turn the profiler off.
    pub fn disable(&self) {
        self.set_enabled(false);
    }

    /// Current default profile name.
    pub fn default_profile_name(&self) -> String {
        self.settings.read().default_profile_name.clone()
    }

    /// Change the profile used by `ProfileRef::Default`.
    ///
    /// An empty name is ignored.
    pub fn set_default_profile_name(&self, name: impl Into<String>) {
        let name = name.into();
        if name.is_empty() {
            return;
        }
        debug!(profile = %name, "Default profile changed");
        self.settings.write().default_profile_name = name;
    }

    /// Current report options.
    pub fn report_options(&self) -> ReportOptions {
        self.settings.read().report
    }

    /// Replace the report options.
    pub fn set_report_options(&self, options: ReportOptions) {
        self.settings.write().report = options;
    }

    /// Edit the report options in place.
    pub fn update_report_options(&self, update: impl FnOnce(&mut ReportOptions)) {
        update(&mut self.settings.write().report);
    }

    /// Current settings as a configuration value.
    pub fn config(&self) -> ProfilerConfig {
        let settings = self.settings.read();
        ProfilerConfig {
            enabled: self.is_enabled(),
            default_profile_name: settings.default_profile_name.clone(),
            report: settings.report,
        }
    }

    /// Apply every setting of a configuration.
    pub fn apply_config(&self, config: ProfilerConfig) {
        self.set_enabled(config.enabled);
        self.set_default_profile_name(config.default_profile_name);
        self.set_report_options(config.report);
    }

    // ------------------------------------------------------------------
    // Resolution
    // ------------------------------------------------------------------

    fn resolve_name(&self, profile: ProfileRef<'_>) -> String {
        let settings = self.settings.read();
        profile.resolve(&settings.default_profile_name).into_owned()
    }

    fn profile<'p>(&self, profile: impl Into<ProfileRef<'p>>) -> Arc<Profile> {
        self.registry.get_or_create(&self.resolve_name(profile.into()))
    }

    fn existing_profile<'p>(&self, profile: impl Into<ProfileRef<'p>>) -> Option<Arc<Profile>> {
        self.registry.get(&self.resolve_name(profile.into()))
    }

    fn renderer(&self) -> Renderer<'_> {
        Renderer::new(self.is_enabled(), self.report_options(), self.host.as_ref())
    }

    // ------------------------------------------------------------------
    // Counters
    // ------------------------------------------------------------------

    /// Add one to a counter.
    pub fn counter_inc<'p>(&self, profile: impl Into<ProfileRef<'p>>, counter: &str) {
        if self.is_enabled() {
            self.profile(profile).counter_increment(counter);
        }
    }

    /// Set a counter to `value`.
    pub fn counter_set<'p>(&self, profile: impl Into<ProfileRef<'p>>, counter: &str, value: i64) {
        if self.is_enabled() {
            self.profile(profile).counter_set(counter, value);
        }
    }

    /// Read a counter, creating it at zero when missing.
    pub fn counter_get<'p>(&self, profile: impl Into<ProfileRef<'p>>, counter: &str) -> i64 {
        if !self.is_enabled() {
            return 0;
        }
        self.profile(profile).counter_get(counter)
    }

    /// Zero a counter if it exists.
    pub fn counter_reset<'p>(&self, profile: impl Into<ProfileRef<'p>>, counter: &str) {
        if !self.is_enabled() {
            return;
        }
        if let Some(profile) = self.existing_profile(profile) {
            profile.counter_reset(counter);
        }
    }

    // ------------------------------------------------------------------
    // Clocks
    // ------------------------------------------------------------------

    /// Start a clock, creating it when missing.
    pub fn clock_start<'p>(&self, profile: impl Into<ProfileRef<'p>>, clock: &str) {
        if self.is_enabled() {
            self.profile(profile).clock_start(clock, self.host.now());
        }
    }

    /// Stop a clock. A missing clock stays missing.
    pub fn clock_stop<'p>(&self, profile: impl Into<ProfileRef<'p>>, clock: &str) {
        if !self.is_enabled() {
            return;
        }
        let now = self.host.now();
        if let Some(profile) = self.existing_profile(profile) {
            profile.clock_stop(clock, now);
        }
    }

    /// Accumulated milliseconds, or 0 for a missing clock.
    pub fn clock_elapsed<'p>(&self, profile: impl Into<ProfileRef<'p>>, clock: &str) -> i64 {
        self.clock(profile, clock).map_or(0, |c| c.elapsed_ms)
    }

    /// Start count, or 0 for a missing clock.
    pub fn clock_start_count<'p>(&self, profile: impl Into<ProfileRef<'p>>, clock: &str) -> u64 {
        self.clock(profile, clock).map_or(0, |c| c.starts)
    }

    /// Stop count, or 0 for a missing clock.
    pub fn clock_stop_count<'p>(&self, profile: impl Into<ProfileRef<'p>>, clock: &str) -> u64 {
        self.clock(profile, clock).map_or(0, |c| c.stops)
    }

    /// Reset a clock if it exists.
    pub fn clock_reset<'p>(&self, profile: impl Into<ProfileRef<'p>>, clock: &str) {
        if !self.is_enabled() {
            return;
        }
        if let Some(profile) = self.existing_profile(profile) {
            profile.clock_reset(clock);
        }
    }

    /// Snapshot of one clock, if it exists.
    pub fn clock<'p>(
        &self,
        profile: impl Into<ProfileRef<'p>>,
        clock: &str,
    ) -> Option<ClockSnapshot> {
        if !self.is_enabled() {
            return None;
        }
        self.existing_profile(profile)?.clock(clock)
    }

    /// Snapshots of every clock in a profile, sorted by name.
    pub fn clocks<'p>(&self, profile: impl Into<ProfileRef<'p>>) -> Vec<ClockSnapshot> {
        if !self.is_enabled() {
            return Vec::new();
        }
        let mut clocks = self
            .existing_profile(profile)
            .map(|p| p.clocks())
            .unwrap_or_default();
        clocks.sort_by(|a, b| a.name.cmp(&b.name));
        clocks
    }

    // ------------------------------------------------------------------
    // Chains
    // ------------------------------------------------------------------

    /// Capture free memory and the current time as a new link.
    pub fn chain_add_link<'p>(&self, profile: impl Into<ProfileRef<'p>>, chain: &str, link: &str) {
        if !self.is_enabled() {
            return;
        }
        let profile = self.profile(profile);
        let free_memory = self.host.free_memory();
        let timestamp = self.host.now();
        profile.chain_add_link(chain, link, free_memory, timestamp);
    }

    /// Drop a chain's links if the chain exists.
    pub fn chain_reset<'p>(&self, profile: impl Into<ProfileRef<'p>>, chain: &str) {
        if !self.is_enabled() {
            return;
        }
        if let Some(profile) = self.existing_profile(profile) {
            profile.chain_reset(chain);
        }
    }

    /// Snapshot of one chain, if it exists.
    pub fn chain<'p>(
        &self,
        profile: impl Into<ProfileRef<'p>>,
        chain: &str,
    ) -> Option<ChainSnapshot> {
        if !self.is_enabled() {
            return None;
        }
        self.existing_profile(profile)?.chain(chain)
    }

    // ------------------------------------------------------------------
    // Caches
    // ------------------------------------------------------------------

    /// Store a debug value and return its effective key.
    ///
    /// Returns `None` while disabled.
    pub fn cache_add<'p, T: CacheValue>(
        &self,
        profile: impl Into<ProfileRef<'p>>,
        cache: &str,
        key: Option<&str>,
        value: T,
    ) -> Option<String> {
        self.cache_add_shared(profile, cache, key, Arc::new(value))
    }

    /// Store an already shared debug value and return its effective key.
    pub fn cache_add_shared<'p>(
        &self,
        profile: impl Into<ProfileRef<'p>>,
        cache: &str,
        key: Option<&str>,
        value: Arc<dyn CacheValue>,
    ) -> Option<String> {
        if !self.is_enabled() {
            return None;
        }
        let now = self.host.now();
        Some(self.profile(profile).cache_add(cache, key, value, now))
    }

    /// Value stored under an effective key. Never creates the cache.
    pub fn get_object<'p>(
        &self,
        profile: impl Into<ProfileRef<'p>>,
        cache: &str,
        key: &str,
    ) -> Option<Arc<dyn CacheValue>> {
        if !self.is_enabled() {
            return None;
        }
        self.existing_profile(profile)?.cache_get(cache, key)
    }

    /// Value stored under an effective key, downcast to `T`.
    pub fn get_object_as<'p, T: Any + Clone>(
        &self,
        profile: impl Into<ProfileRef<'p>>,
        cache: &str,
        key: &str,
    ) -> Option<T> {
        downcast_value(&self.get_object(profile, cache, key)?)
    }

    /// Every value of a cache in insertion order, creating the cache when
    /// missing.
    pub fn get_objects<'p>(
        &self,
        profile: impl Into<ProfileRef<'p>>,
        cache: &str,
    ) -> Vec<Arc<dyn CacheValue>> {
        if !self.is_enabled() {
            return Vec::new();
        }
        self.profile(profile).cache_values(cache)
    }

    /// Drop a cache's objects if the cache exists.
    pub fn cache_reset<'p>(&self, profile: impl Into<ProfileRef<'p>>, cache: &str) {
        if !self.is_enabled() {
            return;
        }
        if let Some(profile) = self.existing_profile(profile) {
            profile.cache_reset(cache);
        }
    }

    // ------------------------------------------------------------------
    // Reports
    // ------------------------------------------------------------------

    /// Counter table across all profiles.
    pub fn report_all_counters(&self) -> String {
        let renderer = self.renderer();
        if !self.is_enabled() {
            return renderer.counters(Vec::new());
        }
        let counters = self
            .registry
            .profiles()
            .iter()
            .flat_map(|p| p.counters())
            .collect();
        renderer.counters(counters)
    }

    /// Counter table for one profile.
    pub fn report_profile_counters<'p>(&self, profile: impl Into<ProfileRef<'p>>) -> String {
        let renderer = self.renderer();
        if !self.is_enabled() {
            return renderer.counters(Vec::new());
        }
        renderer.counters(self.profile(profile).counters())
    }

    /// Clock table across all profiles.
    pub fn report_all_clocks(&self) -> String {
        let renderer = self.renderer();
        if !self.is_enabled() {
            return renderer.clocks(Vec::new());
        }
        let clocks = self
            .registry
            .profiles()
            .iter()
            .flat_map(|p| p.clocks())
            .collect();
        renderer.clocks(clocks)
    }

    /// Clock table for one profile.
    pub fn report_profile_clocks<'p>(&self, profile: impl Into<ProfileRef<'p>>) -> String {
        let renderer = self.renderer();
        if !self.is_enabled() {
            return renderer.clocks(Vec::new());
        }
        renderer.clocks(self.profile(profile).clocks())
    }

    /// Chain table across all profiles.
    pub fn report_all_chains(&self) -> String {
        let renderer = self.renderer();
        if !self.is_enabled() {
            return renderer.chains(Vec::new());
        }
        let chains = self
            .registry
            .profiles()
            .iter()
            .flat_map(|p| p.chains())
            .collect();
        renderer.chains(chains)
    }

    /// Chain table for every chain of one profile.
    pub fn report_profile_chains<'p>(&self, profile: impl Into<ProfileRef<'p>>) -> String {
        let renderer = self.renderer();
        if !self.is_enabled() {
            return renderer.chains(Vec::new());
        }
        renderer.chains(self.profile(profile).chains())
    }

    /// Chain table for a single chain. Empty when the chain does not exist.
    pub fn report_chain<'p>(&self, profile: impl Into<ProfileRef<'p>>, chain: &str) -> String {
        let renderer = self.renderer();
        if !self.is_enabled() {
            return renderer.chains(Vec::new());
        }
        let chains = self
            .existing_profile(profile)
            .and_then(|p| p.chain(chain))
            .into_iter()
            .collect();
        renderer.chains(chains)
    }

    /// Object dump of one cache. Empty when the cache does not exist.
    pub fn report_cache<'p>(&self, profile: impl Into<ProfileRef<'p>>, cache: &str) -> String {
        let renderer = self.renderer();
        if !self.is_enabled() {
            return renderer.caches(Vec::new());
        }
        match self.existing_profile(profile).and_then(|p| p.cache(cache)) {
            Some(cache) => renderer.cache(&cache),
            None => String::new(),
        }
    }

    /// Counters, clocks, chains and caches of one profile.
    pub fn report_profile<'p>(&self, profile: impl Into<ProfileRef<'p>>) -> String {
        let renderer = self.renderer();
        if !self.is_enabled() {
            return renderer.profile(Vec::new(), Vec::new(), Vec::new(), Vec::new());
        }
        let profile = self.profile(profile);
        renderer.profile(
            profile.counters(),
            profile.clocks(),
            profile.chains(),
            profile.caches(),
        )
    }

    /// Sorted copy of every counter, clock and chain.
    pub fn snapshot(&self) -> RegistrySnapshot {
        if !self.is_enabled() {
            return RegistrySnapshot::default();
        }
        let profiles = self.registry.profiles();
        let mut snapshot = RegistrySnapshot {
            counters: profiles.iter().flat_map(|p| p.counters()).collect(),
            clocks: profiles.iter().flat_map(|p| p.clocks()).collect(),
            chains: profiles.iter().flat_map(|p| p.chains()).collect(),
        };
        snapshot
            .counters
            .sort_by(|a, b| a.profile.cmp(&b.profile).then_with(|| a.name.cmp(&b.name)));
        snapshot
            .clocks
            .sort_by(|a, b| a.profile.cmp(&b.profile).then_with(|| a.name.cmp(&b.name)));
        snapshot
            .chains
            .sort_by(|a, b| a.profile.cmp(&b.profile).then_with(|| a.name.cmp(&b.name)));
        snapshot
    }

    /// [`snapshot`](Self::snapshot) as pretty-printed JSON.
    pub fn report_json(&self) -> Result<String, ProfilerError> {
        Ok(serde_json::to_string_pretty(&self.snapshot())?)
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Names of every profile, sorted.
    pub fn profile_names(&self) -> Vec<String> {
        self.registry.names()
    }

    /// Destroy every profile. Later references start from empty profiles.
    pub fn close_all(&self) {
        if self.is_enabled() {
            self.registry.close_all();
            info!("Closed all profiles");
        }
    }

    /// Reset every entity of one profile, creating the profile when missing.
    pub fn reset_profile<'p>(&self, profile: impl Into<ProfileRef<'p>>) {
        if !self.is_enabled() {
            return;
        }
        let profile = self.profile(profile);
        profile.reset();
        debug!(profile = %profile.name(), "Reset profile");
    }

    /// Reset every entity of every profile.
    pub fn reset_all(&self) {
        if self.is_enabled() {
            self.registry.reset_all();
            info!("Reset all profiles");
        }
    }

    /// Zero every counter.
    pub fn reset_all_counters(&self) {
        if self.is_enabled() {
            self.registry.reset_all_counters();
            debug!("Reset all counters");
        }
    }

    /// Reset every clock.
    pub fn reset_all_clocks(&self) {
        if self.is_enabled() {
            self.registry.reset_all_clocks();
            debug!("Reset all clocks");
        }
    }

    /// Clear every chain.
    pub fn reset_all_chains(&self) {
        if self.is_enabled() {
            self.registry.reset_all_chains();
            debug!("Reset all chains");
        }
    }

    /// Clear every cache.
    pub fn reset_all_caches(&self) {
        if self.is_enabled() {
            self.registry.reset_all_caches();
            debug!("Reset all caches");
        }
    }

    /// Ask the host to release unused memory. Only acts while the profiler
    /// is disabled.
    pub fn gc(&self) {
        if !self.is_enabled() {
            debug!("Requesting garbage collection");
            self.host.collect_garbage();
        }
    }
}

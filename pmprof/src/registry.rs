//! Profile registry.
//!
//! The registry maps profile names to [`Profile`]s and creates them lazily on
//! first reference. Each profile owns four independent name → entity maps
//! (counters, clocks, chains, caches) behind a single mutex.
//!
//! # Access Modes
//!
//! Entity lookups come in two flavours and the choice is part of each
//! operation's contract:
//!
//! - **get-or-create**: counter operations, `chain_add_link`, `cache_add`,
//!   `cache_values` and `clock_start` create the entity when it is missing
//! - **get-if-present**: clock reads and `clock_stop`, object lookup, and every
//!   per-entity reset leave a missing entity missing
//!
//! # Thread Safety
//!
//! The name → profile map is a `DashMap`; profiles are handed out as
//! `Arc<Profile>`. All mutation and iteration of a profile's maps happens under
//! its `parking_lot::Mutex`. Snapshots are copied out under the lock so report
//! formatting never holds it.

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::cache::{Cache, CacheSnapshot, CacheValue};
use crate::chain::{Chain, ChainSnapshot, Link};
use crate::clock::{Clock, ClockSnapshot};
use crate::counter::{Counter, CounterSnapshot};
use crate::host::{Bytes, Timestamp};

#[derive(Debug, Default)]
struct ProfileInner {
    counters: HashMap<String, Counter>,
    clocks: HashMap<String, Clock>,
    chains: HashMap<String, Chain>,
    caches: HashMap<String, Cache>,
}

impl ProfileInner {
    fn counter(&mut self, profile: &str, name: &str) -> &mut Counter {
        self.counters.entry(name.to_string()).or_insert_with(|| {
            trace!(profile, counter = name, "Creating counter");
            Counter::new(name)
        })
    }

    fn clock(&mut self, profile: &str, name: &str) -> &mut Clock {
        self.clocks.entry(name.to_string()).or_insert_with(|| {
            trace!(profile, clock = name, "Creating clock");
            Clock::new(name)
        })
    }

    fn chain(&mut self, profile: &str, name: &str) -> &mut Chain {
        self.chains.entry(name.to_string()).or_insert_with(|| {
            trace!(profile, chain = name, "Creating chain");
            Chain::new(name)
        })
    }

    fn cache(&mut self, profile: &str, name: &str) -> &mut Cache {
        self.caches.entry(name.to_string()).or_insert_with(|| {
            trace!(profile, cache = name, "Creating cache");
            Cache::new(name)
        })
    }

    fn reset_counters(&mut self) {
        self.counters.values_mut().for_each(Counter::reset);
    }

    fn reset_clocks(&mut self) {
        self.clocks.values_mut().for_each(Clock::reset);
    }

    fn reset_chains(&mut self) {
        self.chains.values_mut().for_each(Chain::reset);
    }

    fn reset_caches(&mut self) {
        self.caches.values_mut().for_each(Cache::reset);
    }
}

/// Named namespace of counters, clocks, chains and caches.
#[derive(Debug)]
pub struct Profile {
    name: String,
    inner: Mutex<ProfileInner>,
}

impl Profile {
    /// Create an empty profile.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            inner: Mutex::new(ProfileInner::default()),
        }
    }

    /// Profile name.
    pub fn name(&self) -> &str {
        &self.name
    }

    // ------------------------------------------------------------------
    // Counters
    // ------------------------------------------------------------------

    /// Add one to a counter, creating it at zero first if needed.
    pub fn counter_increment(&self, name: &str) {
        self.inner.lock().counter(&self.name, name).increment();
    }

    /// Set a counter, creating it if needed.
    pub fn counter_set(&self, name: &str, value: i64) {
        self.inner.lock().counter(&self.name, name).set(value);
    }

    /// Read a counter. A missing counter is created and reads as zero.
    pub fn counter_get(&self, name: &str) -> i64 {
        self.inner.lock().counter(&self.name, name).value()
    }

    /// Zero a counter if it exists.
    pub fn counter_reset(&self, name: &str) {
        if let Some(counter) = self.inner.lock().counters.get_mut(name) {
            counter.reset();
        }
    }

    /// Snapshot of every counter, unordered.
    pub fn counters(&self) -> Vec<CounterSnapshot> {
        self.inner
            .lock()
            .counters
            .values()
            .map(|c| c.snapshot(&self.name))
            .collect()
    }

    // ------------------------------------------------------------------
    // Clocks
    // ------------------------------------------------------------------

    /// Start a clock at `now`, creating it if needed.
    pub fn clock_start(&self, name: &str, now: Timestamp) {
        self.inner.lock().clock(&self.name, name).start(now);
    }

    /// Stop a clock at `now`. Does nothing if the clock was never started.
    pub fn clock_stop(&self, name: &str, now: Timestamp) {
        if let Some(clock) = self.inner.lock().clocks.get_mut(name) {
            clock.stop(now);
        }
    }

    /// Snapshot of one clock if it exists.
    pub fn clock(&self, name: &str) -> Option<ClockSnapshot> {
        self.inner
            .lock()
            .clocks
            .get(name)
            .map(|c| c.snapshot(&self.name))
    }

    /// Reset a clock if it exists.
    pub fn clock_reset(&self, name: &str) {
        if let Some(clock) = self.inner.lock().clocks.get_mut(name) {
            clock.reset();
        }
    }

    /// Snapshot of every clock, unordered.
    pub fn clocks(&self) -> Vec<ClockSnapshot> {
        self.inner
            .lock()
            .clocks
            .values()
            .map(|c| c.snapshot(&self.name))
            .collect()
    }

    // ------------------------------------------------------------------
    // Chains
    // ------------------------------------------------------------------

    /// Append a link to a chain, creating the chain if needed.
    pub fn chain_add_link(
        &self,
        chain: &str,
        link: &str,
        free_memory: Bytes,
        timestamp: Timestamp,
    ) {
        self.inner
            .lock()
            .chain(&self.name, chain)
            .append(Link::new(link, free_memory, timestamp));
    }

    /// Clear a chain's links if the chain exists.
    pub fn chain_reset(&self, chain: &str) {
        if let Some(chain) = self.inner.lock().chains.get_mut(chain) {
            chain.reset();
        }
    }

    /// Snapshot of one chain if it exists.
    pub fn chain(&self, chain: &str) -> Option<ChainSnapshot> {
        self.inner
            .lock()
            .chains
            .get(chain)
            .map(|c| c.snapshot(&self.name))
    }

    /// Snapshot of every chain, unordered.
    pub fn chains(&self) -> Vec<ChainSnapshot> {
        self.inner
            .lock()
            .chains
            .values()
            .map(|c| c.snapshot(&self.name))
            .collect()
    }

    // ------------------------------------------------------------------
    // Caches
    // ------------------------------------------------------------------

    /// Store a value in a cache, creating the cache if needed.
    ///
    /// Returns the effective key.
    pub fn cache_add(
        &self,
        cache: &str,
        key: Option<&str>,
        value: Arc<dyn CacheValue>,
        now: Timestamp,
    ) -> String {
        self.inner.lock().cache(&self.name, cache).add(key, value, now)
    }

    /// Value stored under an effective key, if the cache and key exist.
    pub fn cache_get(&self, cache: &str, key: &str) -> Option<Arc<dyn CacheValue>> {
        self.inner
            .lock()
            .caches
            .get(cache)
            .and_then(|c| c.get(key))
    }

    /// Every value of a cache in insertion order, creating the cache if needed.
    pub fn cache_values(&self, cache: &str) -> Vec<Arc<dyn CacheValue>> {
        self.inner.lock().cache(&self.name, cache).values()
    }

    /// Clear a cache if it exists.
    pub fn cache_reset(&self, cache: &str) {
        if let Some(cache) = self.inner.lock().caches.get_mut(cache) {
            cache.reset();
        }
    }

    /// Snapshot of one cache if it exists.
    pub fn cache(&self, cache: &str) -> Option<CacheSnapshot> {
        self.inner
            .lock()
            .caches
            .get(cache)
            .map(|c| c.snapshot(&self.name))
    }

    /// Snapshot of every cache, unordered.
    pub fn caches(&self) -> Vec<CacheSnapshot> {
        self.inner
            .lock()
            .caches
            .values()
            .map(|c| c.snapshot(&self.name))
            .collect()
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Reset every entity, keeping the entities themselves.
    pub fn reset(&self) {
        let mut inner = self.inner.lock();
        inner.reset_counters();
        inner.reset_clocks();
        inner.reset_chains();
        inner.reset_caches();
    }

    /// Zero every counter.
    pub fn reset_counters(&self) {
        self.inner.lock().reset_counters();
    }

    /// Reset every clock.
    pub fn reset_clocks(&self) {
        self.inner.lock().reset_clocks();
    }

    /// Clear every chain.
    pub fn reset_chains(&self) {
        self.inner.lock().reset_chains();
    }

    /// Clear every cache.
    pub fn reset_caches(&self) {
        self.inner.lock().reset_caches();
    }

    /// Drop every entity.
    fn destroy(&self) {
        *self.inner.lock() = ProfileInner::default();
    }
}

/// Mapping of profile name to [`Profile`].
#[derive(Debug, Default)]
pub struct ProfileRegistry {
    profiles: DashMap<String, Arc<Profile>>,
}

impl ProfileRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The profile named `name`, created empty if absent.
    pub fn get_or_create(&self, name: &str) -> Arc<Profile> {
        if let Some(profile) = self.profiles.get(name) {
            return Arc::clone(profile.value());
        }
        let entry = self.profiles.entry(name.to_string()).or_insert_with(|| {
            debug!(profile = name, "Creating profile");
            Arc::new(Profile::new(name))
        });
        Arc::clone(entry.value())
    }

    /// The profile named `name` if it exists.
    pub fn get(&self, name: &str) -> Option<Arc<Profile>> {
        self.profiles.get(name).map(|p| Arc::clone(p.value()))
    }

    /// Every profile, unordered.
    pub fn profiles(&self) -> Vec<Arc<Profile>> {
        self.profiles
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect()
    }

    /// Profile names in lexicographic order.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.profiles.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    /// Number of profiles.
    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    /// Whether no profile exists.
    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// Destroy every profile and empty the registry.
    ///
    /// Outstanding `Arc<Profile>` handles see their maps emptied. Later lookups
    /// create fresh profiles.
    pub fn close_all(&self) {
        let profiles = self.profiles();
        self.profiles.clear();
        for profile in &profiles {
            profile.destroy();
        }
        debug!(closed = profiles.len(), "Closed all profiles");
    }

    /// Reset every entity of every profile.
    pub fn reset_all(&self) {
        self.profiles().iter().for_each(|p| p.reset());
    }

    /// Zero every counter of every profile.
    pub fn reset_all_counters(&self) {
        self.profiles().iter().for_each(|p| p.reset_counters());
    }

    /// Reset every clock of every profile.
    pub fn reset_all_clocks(&self) {
        self.profiles().iter().for_each(|p| p.reset_clocks());
    }

    /// Clear every chain of every profile.
    pub fn reset_all_chains(&self) {
        self.profiles().iter().for_each(|p| p.reset_chains());
    }

    /// Clear every cache of every profile.
    pub fn reset_all_caches(&self) {
        self.profiles().iter().for_each(|p| p.reset_caches());
    }
}

//! Aligned text reports.
//!
//! The renderer turns snapshots into fixed-width tables. It never touches the
//! registry: callers snapshot under the profile lock and hand the copies over,
//! so formatting runs without holding any lock.
//!
//! # Layout
//!
//! ```text
//! Profile  Counter         Count
//! -------  -------         -----
//! orders   insert              3
//! orders   update             12
//!
//! users    login               1
//! ```
//!
//! Name columns are as wide as the longest name, with a fixed minimum.
//! Numeric columns have fixed widths. Rows are sorted by profile, then name.
//!
//! Every report returns [`DISABLED_MARKER`] while the profiler is disabled and
//! an empty string when there is nothing to show.

mod cache;
mod chain;
mod field;

pub use field::{build_field, column_width, Justify, TextTable, GAP_WIDTH};

use crate::cache::CacheSnapshot;
use crate::chain::ChainSnapshot;
use crate::clock::ClockSnapshot;
use crate::config::ReportOptions;
use crate::counter::CounterSnapshot;
use crate::host::HostRuntime;

/// Text returned by every report while the profiler is disabled.
pub const DISABLED_MARKER: &str = "DISABLED";

const MIN_PROFILE_COL: usize = 7;
const MIN_COUNTER_COL: usize = 7;
const MIN_CLOCK_COL: usize = 5;
const NUMBER_COL: usize = 12;

/// Renders snapshots as text.
pub struct Renderer<'a> {
    enabled: bool,
    options: ReportOptions,
    host: &'a dyn HostRuntime,
}

impl<'a> Renderer<'a> {
    /// Create a renderer.
    ///
    /// `host` formats the timestamps shown in chain and cache reports.
    pub fn new(enabled: bool, options: ReportOptions, host: &'a dyn HostRuntime) -> Self {
        Self {
            enabled,
            options,
            host,
        }
    }

    /// Counter table.
    pub fn counters(&self, mut counters: Vec<CounterSnapshot>) -> String {
        if !self.enabled {
            return DISABLED_MARKER.to_string();
        }
        if counters.is_empty() {
            return String::new();
        }
        counters.sort_by(|a, b| a.profile.cmp(&b.profile).then_with(|| a.name.cmp(&b.name)));

        let profile_col = column_width(counters.iter().map(|c| c.profile.as_str()), MIN_PROFILE_COL);
        let name_col = column_width(counters.iter().map(|c| c.name.as_str()), MIN_COUNTER_COL);

        let mut table = TextTable::new();
        table
            .left(profile_col, "Profile")
            .gap()
            .left(name_col, "Counter")
            .gap()
            .right(NUMBER_COL, "Count")
            .newline()
            .left(profile_col, "-------")
            .gap()
            .left(name_col, "-------")
            .gap()
            .right(NUMBER_COL, "-----");

        let mut last_profile: Option<&str> = None;
        for counter in &counters {
            self.separate_profile(&mut table, last_profile, &counter.profile);
            table
                .newline()
                .left(profile_col, &counter.profile)
                .gap()
                .left(name_col, &counter.name)
                .gap()
                .right(NUMBER_COL, &counter.value.to_string());
            last_profile = Some(counter.profile.as_str());
        }

        table.finish()
    }

    /// Clock table.
    pub fn clocks(&self, mut clocks: Vec<ClockSnapshot>) -> String {
        if !self.enabled {
            return DISABLED_MARKER.to_string();
        }
        if clocks.is_empty() {
            return String::new();
        }
        clocks.sort_by(|a, b| a.profile.cmp(&b.profile).then_with(|| a.name.cmp(&b.name)));

        let profile_col = column_width(clocks.iter().map(|c| c.profile.as_str()), MIN_PROFILE_COL);
        let name_col = column_width(clocks.iter().map(|c| c.name.as_str()), MIN_CLOCK_COL);

        let mut table = TextTable::new();
        table
            .left(profile_col, "Profile")
            .gap()
            .left(name_col, "Clock")
            .gap()
            .right(NUMBER_COL, "Elapsed")
            .right(NUMBER_COL, "Starts")
            .right(NUMBER_COL, "Stops")
            .newline()
            .left(profile_col, "-------")
            .gap()
            .left(name_col, "-----")
            .gap()
            .right(NUMBER_COL, "-------")
            .right(NUMBER_COL, "------")
            .right(NUMBER_COL, "-----");

        let mut last_profile: Option<&str> = None;
        for clock in &clocks {
            self.separate_profile(&mut table, last_profile, &clock.profile);
            table
                .newline()
                .left(profile_col, &clock.profile)
                .gap()
                .left(name_col, &clock.name)
                .gap()
                .right(NUMBER_COL, &clock.elapsed_ms.to_string())
                .right(NUMBER_COL, &clock.starts.to_string())
                .right(NUMBER_COL, &clock.stops.to_string());
            last_profile = Some(clock.profile.as_str());
        }

        table.finish()
    }

    /// Everything one profile holds: counters, clocks, chains, then caches.
    ///
    /// Empty sections are skipped; the rest are separated by a blank line.
    pub fn profile(
        &self,
        counters: Vec<CounterSnapshot>,
        clocks: Vec<ClockSnapshot>,
        chains: Vec<ChainSnapshot>,
        caches: Vec<CacheSnapshot>,
    ) -> String {
        if !self.enabled {
            return DISABLED_MARKER.to_string();
        }
        let sections = [
            self.counters(counters),
            self.clocks(clocks),
            self.chains(chains),
            self.caches(caches),
        ];
        sections
            .into_iter()
            .filter(|section| !section.is_empty())
            .map(|section| section.trim_end_matches('\n').to_string())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    fn separate_profile(&self, table: &mut TextTable, last: Option<&str>, current: &str) {
        if self.options.separate_profiles {
            if let Some(last) = last {
                if !last.is_empty() && last != current {
                    table.newline();
                }
            }
        }
    }
}

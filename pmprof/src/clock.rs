//! Elapsed-time accumulators.
//!
//! A clock sums the time between start and stop events. Calling start/stop
//! around a method that runs 100 times leaves the total of all 100 calls in
//! one clock.
//!
//! # State Machine
//!
//! ```text
//! Idle --start--> Running
//! Running --start--> Running (previous interval abandoned)
//! Running --stop--> Stopped (now - last start added to elapsed)
//! Stopped --stop--> Stopped (now - last start added again)
//! Stopped --start--> Running
//! Idle --stop--> Idle (stop count only)
//! any --reset--> Idle (all values cleared)
//! ```
//!
//! The last start survives a stop. Every stop measures from it until the
//! next start replaces it or a reset clears it.

use serde::Serialize;

use crate::host::Timestamp;

/// Whether a clock has an open interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ClockState {
    /// Never started, or reset.
    Idle,
    /// Started and not stopped since.
    Running,
    /// Stopped at least once since the last start.
    Stopped,
}

/// Accumulates elapsed milliseconds across start/stop pairs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clock {
    name: String,
    last_start: Option<Timestamp>,
    last_stop: Option<Timestamp>,
    elapsed: i64,
    starts: u64,
    stops: u64,
}

impl Clock {
    /// Create an idle clock.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            last_start: None,
            last_stop: None,
            elapsed: 0,
            starts: 0,
            stops: 0,
        }
    }

    /// Local name within the owning profile.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Record a start at `now`.
    pub fn start(&mut self, now: Timestamp) {
        self.last_start = Some(now);
        self.last_stop = None;
        self.starts += 1;
    }

    /// Record a stop at `now`.
    ///
    /// Adds the time since the last start, if there is one. The stop count
    /// grows either way, so start and stop counts can diverge.
    pub fn stop(&mut self, now: Timestamp) {
        if let Some(started) = self.last_start {
            self.last_stop = Some(now);
            self.elapsed += now - started;
        }
        self.stops += 1;
    }

    /// Clear everything and return to idle.
    pub fn reset(&mut self) {
        self.last_start = None;
        self.last_stop = None;
        self.elapsed = 0;
        self.starts = 0;
        self.stops = 0;
    }

    /// Accumulated milliseconds.
    pub fn elapsed(&self) -> i64 {
        self.elapsed
    }

    /// Number of starts since creation or reset.
    pub fn start_count(&self) -> u64 {
        self.starts
    }

    /// Number of stops since creation or reset.
    pub fn stop_count(&self) -> u64 {
        self.stops
    }

    /// Current state.
    pub fn state(&self) -> ClockState {
        match (self.last_start, self.last_stop) {
            (None, _) => ClockState::Idle,
            (Some(_), None) => ClockState::Running,
            (Some(_), Some(_)) => ClockState::Stopped,
        }
    }

    /// Point-in-time copy tagged with the owning profile.
    pub fn snapshot(&self, profile: &str) -> ClockSnapshot {
        ClockSnapshot {
            profile: profile.to_string(),
            name: self.name.clone(),
            elapsed_ms: self.elapsed,
            starts: self.starts,
            stops: self.stops,
            state: self.state(),
        }
    }
}

/// Point-in-time copy of a clock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClockSnapshot {
    /// Owning profile name.
    pub profile: String,
    /// Clock name.
    pub name: String,
    /// Accumulated milliseconds.
    pub elapsed_ms: i64,
    /// Start count.
    pub starts: u64,
    /// Stop count.
    pub stops: u64,
    /// Running or idle at capture.
    pub state: ClockState,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_initial_state() {
        let clock = Clock::new("load");
        assert_eq!(clock.name(), "load");
        assert_eq!(clock.state(), ClockState::Idle);
        assert_eq!(clock.elapsed(), 0);
        assert_eq!(clock.start_count(), 0);
        assert_eq!(clock.stop_count(), 0);
    }

    #[test]
    fn test_clock_accumulates_pairs() {
        let mut clock = Clock::new("load");
        clock.start(100);
        assert_eq!(clock.state(), ClockState::Running);
        clock.stop(150);
        assert_eq!(clock.state(), ClockState::Stopped);

        clock.start(1_000);
        clock.stop(1_025);

        assert_eq!(clock.elapsed(), 75);
        assert_eq!(clock.start_count(), 2);
        assert_eq!(clock.stop_count(), 2);
    }

    #[test]
    fn test_clock_restart_abandons_interval() {
        let mut clock = Clock::new("load");
        clock.start(0);
        clock.start(90);
        clock.stop(100);

        assert_eq!(clock.elapsed(), 10);
        assert_eq!(clock.start_count(), 2);
        assert_eq!(clock.stop_count(), 1);
    }

    #[test]
    fn test_clock_stop_without_start_only_counts() {
        let mut clock = Clock::new("load");
        clock.stop(50);
        assert_eq!(clock.elapsed(), 0);
        assert_eq!(clock.stop_count(), 1);
        assert_eq!(clock.state(), ClockState::Idle);
    }

    #[test]
    fn test_clock_repeated_stop_measures_from_last_start() {
        let mut clock = Clock::new("load");
        clock.start(0);
        clock.stop(10);
        clock.stop(410);
        assert_eq!(clock.elapsed(), 420);
        assert_eq!(clock.start_count(), 1);
        assert_eq!(clock.stop_count(), 2);
        assert_eq!(clock.state(), ClockState::Stopped);

        // A new start moves the reference point
        clock.start(1_000);
        assert_eq!(clock.state(), ClockState::Running);
        clock.stop(1_005);
        assert_eq!(clock.elapsed(), 425);
    }

    #[test]
    fn test_clock_reset() {
        let mut clock = Clock::new("load");
        clock.start(0);
        clock.stop(20);
        clock.start(30);
        clock.reset();

        assert_eq!(clock.state(), ClockState::Idle);
        assert_eq!(clock.elapsed(), 0);
        assert_eq!(clock.start_count(), 0);
        assert_eq!(clock.stop_count(), 0);

        // A stop after reset has no start to measure from
        clock.stop(40);
        assert_eq!(clock.elapsed(), 0);
        assert_eq!(clock.state(), ClockState::Idle);
    }

    #[test]
    fn test_clock_snapshot() {
        let mut clock = Clock::new("load");
        clock.start(0);
        clock.stop(7);
        clock.start(8);

        let snap = clock.snapshot("P");
        assert_eq!(snap.profile, "P");
        assert_eq!(snap.name, "load");
        assert_eq!(snap.elapsed_ms, 7);
        assert_eq!(snap.starts, 2);
        assert_eq!(snap.stops, 1);
        assert_eq!(snap.state, ClockState::Running);
    }
}

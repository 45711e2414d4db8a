//! Named integer accumulators.

use serde::Serialize;

/// Counts how many times something occurred.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Counter {
    name: String,
    value: i64,
}

impl Counter {
    /// Create a counter at zero.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: 0,
        }
    }

    /// Local name within the owning profile.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current value.
    pub fn value(&self) -> i64 {
        self.value
    }

    /// Add one.
    pub fn increment(&mut self) {
        self.value = self.value.wrapping_add(1);
    }

    /// Replace the value.
    pub fn set(&mut self, value: i64) {
        self.value = value;
    }

    /// Back to zero.
    pub fn reset(&mut self) {
        self.value = 0;
    }

    /// Point-in-time copy tagged with the owning profile.
    pub fn snapshot(&self, profile: &str) -> CounterSnapshot {
        CounterSnapshot {
            profile: profile.to_string(),
            name: self.name.clone(),
            value: self.value,
        }
    }
}

/// Point-in-time copy of a counter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CounterSnapshot {
    /// Owning profile name.
    pub profile: String,
    /// Counter name.
    pub name: String,
    /// Value at capture.
    pub value: i64,
}

//! Memory/time snapshot chains.
//!
//! A chain is an append-only list of links. Each link captures the free memory
//! and the wall-clock time at the moment it was added. Nothing is computed at
//! capture time; the chain report derives the difference between each link and
//! its predecessor.
//!
//! Links never merge: adding "end" twice yields two links.

use serde::Serialize;

use crate::host::{Bytes, Timestamp};

/// One immutable memory/time capture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Link {
    name: String,
    free_memory: Bytes,
    timestamp: Timestamp,
}

impl Link {
    /// Create a link from captured values.
    pub fn new(name: impl Into<String>, free_memory: Bytes, timestamp: Timestamp) -> Self {
        Self {
            name: name.into(),
            free_memory,
            timestamp,
        }
    }

    /// Link name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Free memory at capture.
    pub fn free_memory(&self) -> Bytes {
        self.free_memory
    }

    /// Capture time.
    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    /// Free-memory change since `previous` (negative when memory was consumed).
    pub fn memory_diff(&self, previous: &Link) -> i64 {
        self.free_memory as i64 - previous.free_memory as i64
    }

    /// Milliseconds since `previous`.
    pub fn elapsed_diff(&self, previous: &Link) -> i64 {
        self.timestamp - previous.timestamp
    }
}

/// Ordered sequence of links.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chain {
    name: String,
    links: Vec<Link>,
}

impl Chain {
    /// Create an empty chain.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            links: Vec::new(),
        }
    }

    /// Local name within the owning profile.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Append a link. Earlier links are never touched.
    pub fn append(&mut self, link: Link) {
        self.links.push(link);
    }

    /// Links in insertion order.
    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// Drop every link.
    pub fn reset(&mut self) {
        self.links.clear();
    }

    /// Point-in-time copy tagged with the owning profile.
    pub fn snapshot(&self, profile: &str) -> ChainSnapshot {
        ChainSnapshot {
            profile: profile.to_string(),
            name: self.name.clone(),
            links: self.links.clone(),
        }
    }
}

/// Point-in-time copy of a chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChainSnapshot {
    /// Owning profile name.
    pub profile: String,
    /// Chain name.
    pub name: String,
    /// Links in insertion order.
    pub links: Vec<Link>,
}

impl ChainSnapshot {
    /// Sum of the memory differences between successive links.
    pub fn total_memory_diff(&self) -> i64 {
        self.links
            .windows(2)
            .map(|pair| pair[1].memory_diff(&pair[0]))
            .sum()
    }

    /// Sum of the elapsed differences between successive links.
    pub fn total_elapsed_diff(&self) -> i64 {
        self.links
            .windows(2)
            .map(|pair| pair[1].elapsed_diff(&pair[0]))
            .sum()
    }
}

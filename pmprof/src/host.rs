//! Host runtime primitives.
//!
//! The registry never reads the wall clock or the memory counters directly.
//! Everything it needs from the surrounding process goes through the
//! [`HostRuntime`] trait so that tests can substitute a deterministic host.
//!
//! # Implementations
//!
//! - [`SystemHost`] - wall clock via `chrono`, available physical memory via
//!   `sysconf`, heap trimming via `malloc_trim` on glibc
//! - [`ManualHost`] - caller-controlled clock and memory for reproducible
//!   reports

use std::fmt;
use std::sync::atomic::{AtomicI64, AtomicU64, AtomicUsize, Ordering};

use chrono::{DateTime, Local, TimeZone, Utc};

/// Milliseconds since the Unix epoch.
pub type Timestamp = i64;

/// A memory amount in bytes.
pub type Bytes = u64;

/// Primitives the registry depends on but does not implement.
///
/// Implementations are assumed infallible. A host that cannot answer should
/// return a neutral value (for example `0` free bytes) rather than panic.
pub trait HostRuntime: Send + Sync {
    /// Current wall-clock time.
    fn now(&self) -> Timestamp;

    /// Current free-memory estimate.
    fn free_memory(&self) -> Bytes;

    /// Human-readable rendering of a timestamp for reports.
    ///
    /// The default renders local time as `MM/DD/YYYY hh:mm:ss:millis`.
    fn format_timestamp(&self, timestamp: Timestamp) -> String {
        match Local.timestamp_millis_opt(timestamp).single() {
            Some(dt) => render_timestamp(dt),
            None => timestamp.to_string(),
        }
    }

    /// Ask the host to release unused memory.
    ///
    /// Only ever invoked by an explicit caller request.
    fn collect_garbage(&self) {}
}

/// Render a date-time in the report timestamp layout.
fn render_timestamp<Tz: TimeZone>(dt: DateTime<Tz>) -> String
where
    Tz::Offset: fmt::Display,
{
    format!(
        "{}:{}",
        dt.format("%m/%d/%Y %I:%M:%S"),
        dt.timestamp_subsec_millis()
    )
}

/// Host backed by the operating system.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemHost;

impl SystemHost {
    /// Create a new system host.
    pub fn new() -> Self {
        Self
    }
}

impl HostRuntime for SystemHost {
    fn now(&self) -> Timestamp {
        Utc::now().timestamp_millis()
    }

    fn free_memory(&self) -> Bytes {
        available_memory()
    }

    fn collect_garbage(&self) {
        let released = trim_heap();
        tracing::debug!(released, "Heap trim requested");
    }
}

#[cfg(target_os = "linux")]
fn available_memory() -> Bytes {
    // SAFETY: sysconf has no preconditions and only reads system state.
    let (pages, page_size) = unsafe {
        (
            libc::sysconf(libc::_SC_AVPHYS_PAGES),
            libc::sysconf(libc::_SC_PAGESIZE),
        )
    };
    if pages < 0 || page_size < 0 {
        return 0;
    }
    (pages as u64).saturating_mul(page_size as u64)
}

#[cfg(not(target_os = "linux"))]
fn available_memory() -> Bytes {
    0
}

#[cfg(all(target_os = "linux", target_env = "gnu"))]
fn trim_heap() -> bool {
    // SAFETY: malloc_trim only walks allocator-internal state.
    unsafe { libc::malloc_trim(0) != 0 }
}

#[cfg(not(all(target_os = "linux", target_env = "gnu")))]
fn trim_heap() -> bool {
    false
}

/// Deterministic host for tests and reproducible reports.
///
/// Time and free memory only change when the caller says so. Timestamps are
/// formatted in UTC so report text does not depend on the machine timezone.
#[derive(Debug, Default)]
pub struct ManualHost {
    now: AtomicI64,
    free_memory: AtomicU64,
    gc_requests: AtomicUsize,
}

impl ManualHost {
    /// Create a host frozen at `now` with `free_memory` bytes available.
    pub fn new(now: Timestamp, free_memory: Bytes) -> Self {
        Self {
            now: AtomicI64::new(now),
            free_memory: AtomicU64::new(free_memory),
            gc_requests: AtomicUsize::new(0),
        }
    }

    /// Move the clock forward by `millis`.
    pub fn advance(&self, millis: i64) {
        self.now.fetch_add(millis, Ordering::SeqCst);
    }

    /// Set the clock to an absolute value.
    pub fn set_now(&self, now: Timestamp) {
        self.now.store(now, Ordering::SeqCst);
    }

    /// Set the reported free memory.
    pub fn set_free_memory(&self, bytes: Bytes) {
        self.free_memory.store(bytes, Ordering::SeqCst);
    }

    /// Number of times `collect_garbage` was called.
    pub fn gc_requests(&self) -> usize {
        self.gc_requests.load(Ordering::SeqCst)
    }
}

impl HostRuntime for ManualHost {
    fn now(&self) -> Timestamp {
        self.now.load(Ordering::SeqCst)
    }

    fn free_memory(&self) -> Bytes {
        self.free_memory.load(Ordering::SeqCst)
    }

    fn format_timestamp(&self, timestamp: Timestamp) -> String {
        match DateTime::<Utc>::from_timestamp_millis(timestamp) {
            Some(dt) => render_timestamp(dt),
            None => timestamp.to_string(),
        }
    }

    fn collect_garbage(&self) {
        self.gc_requests.fetch_add(1, Ordering::SeqCst);
    }
}

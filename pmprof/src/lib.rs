//! pmprof - Poor man's profiling for time and memory
//!
//! This library provides a self-contained instrumentation registry that can be
//! dropped into code under development to record how often things happen, how
//! long they take, how much memory they consume, and what objects flowed
//! through them. It is a debugging aid, not a substitute for a real profiler.
//!
//! # Architecture
//!
//! ```text
//! Caller ──► Profiler ──► ProfileRef ──► ProfileRegistry ──► Profile
//!            (facade)     (naming)       (DashMap)           (Mutex)
//!                │                                            │
//!                │                          Counter / Clock / Chain / Cache
//!                │                                            │
//!                └──────────► Renderer ◄──── snapshots ───────┘
//!                             (aligned text tables)
//! ```
//!
//! # Measurement Kinds
//!
//! - **Counter**: how many times something occurred
//! - **Clock**: elapsed milliseconds accumulated across start/stop pairs
//! - **Chain**: an append-only list of links capturing free memory and a
//!   timestamp; reports show the difference between successive links
//! - **Cache**: keyed debug objects reported in insertion order
//!
//! # Example
//!
//! ```
//! use pmprof::{Profiler, ProfileRef};
//!
//! let profiler = Profiler::new();
//!
//! profiler.counter_inc("orders", "insert");
//! profiler.clock_start(ProfileRef::Default, "load");
//! profiler.clock_stop(ProfileRef::Default, "load");
//! profiler.chain_add_link("orders", "insert", "begin");
//! profiler.chain_add_link("orders", "insert", "end");
//!
//! assert_eq!(profiler.counter_get("orders", "insert"), 1);
//! println!("{}", profiler.report_all_counters());
//! println!("{}", profiler.report_chain("orders", "insert"));
//! ```

pub mod cache;
pub mod chain;
pub mod clock;
pub mod config;
pub mod counter;
pub mod error;
pub mod host;
pub mod logging;
pub mod naming;
pub mod profiler;
pub mod registry;
pub mod report;

mod global;

pub use cache::{CacheObject, CacheSnapshot, CacheValue};
pub use chain::{ChainSnapshot, Link};
pub use clock::{ClockSnapshot, ClockState};
pub use config::{config_file_path, ConfigKey, ProfilerConfig, ReportOptions};
pub use counter::CounterSnapshot;
pub use error::{ConfigError, ProfilerError};
pub use global::global;
pub use host::{Bytes, HostRuntime, ManualHost, SystemHost, Timestamp};
pub use naming::{ProfileCategory, ProfileRef, DEFAULT_PROFILE_NAME};
pub use profiler::{Profiler, RegistrySnapshot};
pub use registry::{Profile, ProfileRegistry};
pub use report::{Renderer, DISABLED_MARKER};

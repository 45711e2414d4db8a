//! Integration tests for the profiler facade.
//!
//! These tests drive the public API end to end:
//! - counter, clock, chain and cache behaviour through every naming convention
//! - report text produced against a deterministic host
//! - lifecycle operations and the enabled flag
//! - concurrent use from several threads
//!
//! Run with: `cargo test --test profiler_integration`

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use proptest::prelude::*;

use pmprof::{
    ManualHost, ProfileCategory, ProfileRef, Profiler, ProfilerConfig, ReportOptions,
    DISABLED_MARKER,
};

// ============================================================================
// Helper Functions
// ============================================================================

const MIB: u64 = 1_048_576;

/// 2021-03-04 13:05:09.007 UTC
const BASE_TIME: i64 = 1_614_863_109_007;

/// Profiler backed by a manual host frozen at `BASE_TIME` with 64 MiB free.
fn manual_profiler() -> (Arc<ManualHost>, Profiler) {
    let host = Arc::new(ManualHost::new(BASE_TIME, 64 * MIB));
    let profiler = Profiler::new().with_host(host.clone());
    (host, profiler)
}

/// Sample type whose category name is its type name.
struct P;
impl ProfileCategory for P {}

// ============================================================================
// Counters
// ============================================================================

#[test]
fn test_counter_reset_then_get_is_zero() {
    let profiler = Profiler::new();
    profiler.counter_set("P", "hits", 41);
    profiler.counter_reset("P", "hits");
    assert_eq!(profiler.counter_get("P", "hits"), 0);
}

#[test]
fn test_counter_shared_across_naming_conventions() {
    let profiler = Profiler::new();
    profiler.set_default_profile_name("P");

    for _ in 0..3 {
        profiler.counter_inc("P", "hits");
    }
    for _ in 0..2 {
        profiler.counter_inc(ProfileRef::of(&P), "hits");
    }
    for _ in 0..2 {
        profiler.counter_inc(ProfileRef::Default, "hits");
    }

    assert_eq!(profiler.counter_get("P", "hits"), 7);
    assert_eq!(profiler.counter_get(ProfileRef::of(&P), "hits"), 7);
    assert_eq!(profiler.counter_get(ProfileRef::Default, "hits"), 7);
    assert_eq!(profiler.profile_names(), vec!["P"]);
}

proptest! {
    #[test]
    fn test_n_increments_reads_n(n in 0usize..200) {
        let profiler = Profiler::new();
        for _ in 0..n {
            profiler.counter_inc("P", "hits");
        }
        prop_assert_eq!(profiler.counter_get("P", "hits"), n as i64);
    }

    #[test]
    fn test_set_then_increment(start in -1_000_000i64..1_000_000, n in 0usize..50) {
        let profiler = Profiler::new();
        profiler.counter_set("P", "c", start);
        for _ in 0..n {
            profiler.counter_inc("P", "c");
        }
        prop_assert_eq!(profiler.counter_get("P", "c"), start + n as i64);
    }
}

// ============================================================================
// Clocks
// ============================================================================

#[test]
fn test_clock_measures_real_sleep() {
    let profiler = Profiler::new();
    profiler.clock_start("P", "sleep");
    thread::sleep(Duration::from_millis(20));
    profiler.clock_stop("P", "sleep");

    assert!(profiler.clock_elapsed("P", "sleep") >= 20);
    assert_eq!(profiler.clock_start_count("P", "sleep"), 1);
    assert_eq!(profiler.clock_stop_count("P", "sleep"), 1);
}

#[test]
fn test_clock_accumulates_and_counts_pairs() {
    let (host, profiler) = manual_profiler();
    for i in 1..=5 {
        profiler.clock_start("P", "work");
        host.advance(i * 10);
        profiler.clock_stop("P", "work");
    }
    assert_eq!(profiler.clock_elapsed("P", "work"), 150);
    assert_eq!(profiler.clock_start_count("P", "work"), 5);
    assert_eq!(profiler.clock_stop_count("P", "work"), 5);
}

#[test]
fn test_clock_second_stop_measures_from_same_start() {
    let (host, profiler) = manual_profiler();
    profiler.clock_start("P", "work");
    host.advance(10);
    profiler.clock_stop("P", "work");
    host.advance(400);
    profiler.clock_stop("P", "work");

    assert_eq!(profiler.clock_elapsed("P", "work"), 420);
    assert_eq!(profiler.clock_start_count("P", "work"), 1);
    assert_eq!(profiler.clock_stop_count("P", "work"), 2);
}

#[test]
fn test_clock_stop_after_reset_counts_only() {
    let (host, profiler) = manual_profiler();
    profiler.clock_start("P", "work");
    host.advance(10);
    profiler.clock_reset("P", "work");
    host.advance(10);
    profiler.clock_stop("P", "work");

    assert_eq!(profiler.clock_elapsed("P", "work"), 0);
    assert_eq!(profiler.clock_start_count("P", "work"), 0);
    assert_eq!(profiler.clock_stop_count("P", "work"), 1);
}

#[test]
fn test_clock_stop_on_missing_clock_is_noop() {
    let (_, profiler) = manual_profiler();
    profiler.clock_stop("P", "never-started");
    assert_eq!(profiler.clock_stop_count("P", "never-started"), 0);
    assert_eq!(profiler.report_all_clocks(), "");
}

// ============================================================================
// Chains
// ============================================================================

proptest! {
    #[test]
    fn test_chain_diffs_match_captures(
        steps in prop::collection::vec((0u64..128 * MIB, 0i64..10_000), 2..12)
    ) {
        let (host, profiler) = manual_profiler();
        for (i, (free, advance)) in steps.iter().enumerate() {
            host.set_free_memory(*free);
            host.advance(*advance);
            profiler.chain_add_link("P", "c", &format!("l{}", i));
        }

        let chain = profiler.chain("P", "c").unwrap();
        let links = &chain.links;
        prop_assert_eq!(links.len(), steps.len());

        let mut memory_sum = 0i64;
        let mut elapsed_sum = 0i64;
        for i in 1..links.len() {
            let memory = links[i].memory_diff(&links[i - 1]);
            let elapsed = links[i].elapsed_diff(&links[i - 1]);
            prop_assert_eq!(memory, steps[i].0 as i64 - steps[i - 1].0 as i64);
            prop_assert_eq!(elapsed, steps[i].1);
            memory_sum += memory;
            elapsed_sum += elapsed;
        }
        prop_assert_eq!(chain.total_memory_diff(), memory_sum);
        prop_assert_eq!(chain.total_elapsed_diff(), elapsed_sum);

        let report = profiler.report_chain("P", "c");
        let totals = report.lines().nth(links.len() + 3).unwrap();
        let expected_elapsed = elapsed_sum.to_string();
        prop_assert!(totals.ends_with(&expected_elapsed));
    }
}

#[test]
fn test_chain_report_text() {
    let (host, profiler) = manual_profiler();
    profiler.chain_add_link("orders", "insert", "begin");
    host.advance(50);
    host.set_free_memory(63 * MIB + MIB / 2);
    profiler.chain_add_link("orders", "insert", "end");

    let expected = [
        "Profile  Chain   Link   Timestamp                 Free Memory   Memory Diff  (MEGABYTES)   Elapsed Diff",
        "-------  -----   ----   ---------                 -----------   -----------  -----------   ------------",
        "orders   insert  begin  03/04/2021 01:05:09:7        67108864           ...  (...)                  ...",
        "orders   insert  end    03/04/2021 01:05:09:57       66584576       -524288  (-0.5)                  50",
        "                                                                -----------                ------------",
        "                                                                    -524288  (-0.5)                  50",
        "",
    ]
    .join("\n");
    assert_eq!(profiler.report_chain("orders", "insert"), expected);
}

#[test]
fn test_single_link_chain_shows_placeholders() {
    let (_, profiler) = manual_profiler();
    profiler.update_report_options(|o| o.chain_megabyte_column = false);
    profiler.chain_add_link("P", "c", "only");

    let report = profiler.report_chain("P", "c");
    let lines: Vec<&str> = report.lines().collect();
    assert!(lines[2].ends_with("...            ..."));
    assert!(lines[4].trim().starts_with('0'));
    assert!(lines[4].ends_with(" 0"));
}

#[test]
fn test_chain_links_with_same_name_are_distinct() {
    let (_, profiler) = manual_profiler();
    profiler.chain_add_link("P", "c", "end");
    profiler.chain_add_link("P", "c", "end");
    assert_eq!(profiler.chain("P", "c").unwrap().links.len(), 2);
}

// ============================================================================
// Caches
// ============================================================================

#[test]
fn test_cache_absent_keys_are_distinct() {
    let (_, profiler) = manual_profiler();
    let a = profiler.cache_add("P", "objs", None, "first").unwrap();
    let b = profiler.cache_add("P", "objs", None, "second").unwrap();
    assert_ne!(a, b);

    let first = profiler.get_object("P", "objs", &a).unwrap().to_string();
    let second = profiler.get_object("P", "objs", &b).unwrap().to_string();
    assert_eq!(first, "first");
    assert_eq!(second, "second");
}

#[test]
fn test_cache_equal_explicit_keys() {
    let (_, profiler) = manual_profiler();
    let a = profiler.cache_add("P", "objs", Some("k"), "one").unwrap();
    let b = profiler.cache_add("P", "objs", Some("k"), "two").unwrap();
    assert_eq!(a, "k");
    assert_ne!(b, "k");

    let values: Vec<String> = profiler
        .get_objects("P", "objs")
        .iter()
        .map(|v| v.to_string())
        .collect();
    assert_eq!(values, vec!["one", "two"]);

    let literal = profiler.get_object("P", "objs", "k").unwrap().to_string();
    assert_eq!(literal, "one");
}

#[test]
fn test_cache_report_text() {
    let (_, profiler) = manual_profiler();
    profiler.cache_add("orders", "requests", Some("first"), "GET /orders/17");

    assert_eq!(
        profiler.report_cache("orders", "requests"),
        "Cache: requests  --  Profile: orders\n\n(objectKey=first  ts=03/04/2021 01:05:09:7)\nGET /orders/17\n"
    );
}

#[test]
fn test_typed_cache_lookup() {
    #[derive(Debug, Clone, PartialEq)]
    struct Order {
        id: u32,
    }
    impl std::fmt::Display for Order {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "Order #{}", self.id)
        }
    }

    let (_, profiler) = manual_profiler();
    let key = profiler
        .cache_add("P", "orders", None, Order { id: 17 })
        .unwrap();
    assert_eq!(
        profiler.get_object_as::<Order>("P", "orders", &key),
        Some(Order { id: 17 })
    );
    assert!(profiler.report_cache("P", "orders").contains("Order #17"));
}

// ============================================================================
// Reports
// ============================================================================

#[test]
fn test_counter_report_across_profiles() {
    let profiler = Profiler::new();
    profiler.counter_set("users", "login", 1);
    profiler.counter_set("orders", "update", 12);
    profiler.counter_set("orders", "insert", 3);

    let expected = [
        "Profile  Counter         Count",
        "-------  -------         -----",
        "orders   insert              3",
        "orders   update             12",
        "",
        "users    login               1",
    ]
    .join("\n");
    assert_eq!(profiler.report_all_counters(), expected);
    assert_eq!(
        profiler.report_profile_counters("users"),
        "Profile  Counter         Count\n-------  -------         -----\nusers    login               1"
    );
}

#[test]
fn test_reports_are_idempotent() {
    let (host, profiler) = manual_profiler();
    profiler.counter_inc("P", "c");
    profiler.clock_start("P", "t");
    host.advance(3);
    profiler.clock_stop("P", "t");
    profiler.chain_add_link("P", "ch", "a");
    profiler.chain_add_link("P", "ch", "b");
    profiler.cache_add("P", "objs", None, 5);

    assert_eq!(profiler.report_all_counters(), profiler.report_all_counters());
    assert_eq!(profiler.report_all_clocks(), profiler.report_all_clocks());
    assert_eq!(profiler.report_all_chains(), profiler.report_all_chains());
    assert_eq!(profiler.report_cache("P", "objs"), profiler.report_cache("P", "objs"));
    assert_eq!(profiler.report_profile("P"), profiler.report_profile("P"));
}

#[test]
fn test_report_profile_contains_every_section() {
    let (_, profiler) = manual_profiler();
    profiler.counter_inc("P", "c");
    profiler.clock_start("P", "t");
    profiler.chain_add_link("P", "ch", "a");
    profiler.cache_add("P", "objs", Some("k"), "v");
    profiler.counter_inc("Other", "c");

    let report = profiler.report_profile("P");
    assert!(report.starts_with("Profile  Counter"));
    assert!(report.contains("Profile  Clock"));
    assert!(report.contains("Profile  Chain"));
    assert!(report.contains("Cache: objs  --  Profile: P"));
    assert!(!report.contains("Other"));
}

#[test]
fn test_report_options_from_config() {
    let config = ProfilerConfig::default().with_report_options(
        ReportOptions::default()
            .with_chain_megabyte_column(false)
            .with_chain_totals_row(false)
            .with_separate_chains(false),
    );
    let host = Arc::new(ManualHost::new(BASE_TIME, MIB));
    let profiler = Profiler::from_config(config).with_host(host);
    profiler.chain_add_link("P", "c", "a");

    let report = profiler.report_chain("P", "c");
    assert!(!report.contains("MEGABYTES"));
    assert_eq!(report.lines().count(), 3);
    assert!(!report.ends_with('\n'));
}

// ============================================================================
// Lifecycle and Enabled Flag
// ============================================================================

#[test]
fn test_disable_makes_mutations_noops() {
    let profiler = Profiler::new();
    profiler.counter_inc("P", "hits");
    profiler.disable();
    profiler.counter_inc("P", "hits");
    assert_eq!(profiler.report_all_counters(), DISABLED_MARKER);
    assert_eq!(profiler.report_all_clocks(), DISABLED_MARKER);
    assert_eq!(profiler.report_all_chains(), DISABLED_MARKER);

    profiler.enable();
    assert_eq!(profiler.counter_get("P", "hits"), 1);
}

#[test]
fn test_gc_reaches_host_only_while_disabled() {
    let (host, profiler) = manual_profiler();
    profiler.gc();
    assert_eq!(host.gc_requests(), 0);

    profiler.disable();
    profiler.gc();
    assert_eq!(host.gc_requests(), 1);
}

#[test]
fn test_close_all_recreates_empty_profiles() {
    let (_, profiler) = manual_profiler();
    profiler.counter_set("P", "hits", 3);
    profiler.chain_add_link("P", "c", "a");
    profiler.close_all();

    assert!(profiler.profile_names().is_empty());
    assert_eq!(profiler.counter_get("P", "hits"), 0);
    assert_eq!(profiler.report_chain("P", "c"), "");
    assert_eq!(profiler.profile_names(), vec!["P"]);
}

#[test]
fn test_reset_all_keeps_entities() {
    let (host, profiler) = manual_profiler();
    profiler.counter_set("A", "n", 3);
    profiler.clock_start("B", "t");
    host.advance(9);
    profiler.clock_stop("B", "t");
    profiler.chain_add_link("A", "c", "l");
    profiler.cache_add("B", "o", None, 1);

    profiler.reset_all();

    assert_eq!(profiler.counter_get("A", "n"), 0);
    assert_eq!(profiler.clock_elapsed("B", "t"), 0);
    assert!(profiler.chain("A", "c").unwrap().links.is_empty());
    assert!(profiler.get_objects("B", "o").is_empty());
    assert!(profiler.report_all_counters().contains("A        n"));
}

#[test]
fn test_selective_resets() {
    let (host, profiler) = manual_profiler();
    profiler.counter_set("P", "n", 3);
    profiler.clock_start("P", "t");
    host.advance(9);
    profiler.clock_stop("P", "t");
    profiler.chain_add_link("P", "c", "l");
    profiler.cache_add("P", "o", None, 1);

    profiler.reset_all_counters();
    assert_eq!(profiler.counter_get("P", "n"), 0);
    assert_eq!(profiler.clock_elapsed("P", "t"), 9);

    profiler.reset_all_clocks();
    assert_eq!(profiler.clock_elapsed("P", "t"), 0);
    assert_eq!(profiler.chain("P", "c").unwrap().links.len(), 1);

    profiler.reset_all_chains();
    assert!(profiler.chain("P", "c").unwrap().links.is_empty());
    assert_eq!(profiler.get_objects("P", "o").len(), 1);

    profiler.reset_all_caches();
    assert!(profiler.get_objects("P", "o").is_empty());
}

// ============================================================================
// Concurrency
// ============================================================================

#[test]
fn test_concurrent_increments() {
    let profiler = Arc::new(Profiler::new());
    let handles: Vec<_> = (0..8)
        .map(|t| {
            let profiler = Arc::clone(&profiler);
            thread::spawn(move || {
                for _ in 0..1_000 {
                    profiler.counter_inc("shared", "hits");
                    profiler.counter_inc(format!("thread-{}", t), "hits");
                }
                profiler.report_all_counters()
            })
        })
        .collect();

    for handle in handles {
        let report = handle.join().unwrap();
        assert!(report.starts_with("Profile"));
    }

    assert_eq!(profiler.counter_get("shared", "hits"), 8_000);
    assert_eq!(profiler.profile_names().len(), 9);
}

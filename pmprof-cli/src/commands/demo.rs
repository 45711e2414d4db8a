//! Demo workload.
//!
//! Simulates an order service that counts, times, tracks memory and caches
//! orders, then prints every report the profiler offers. Profiling is switched
//! off at the end and the freed heap is handed back to the host.

use std::fmt;
use std::path::Path;
use std::thread;
use std::time::Duration;

use clap::Args;
use pmprof::{ProfileCategory, ProfileRef, Profiler};
use tracing::info;

use super::common::load_config_or_default;
use crate::error::CliError;

/// Arguments for `pmprof demo`.
#[derive(Debug, Args)]
pub struct DemoArgs {
    /// Number of simulated orders
    #[arg(short, long, default_value_t = 5)]
    pub iterations: u32,

    /// Number of orders kept in the debug cache
    #[arg(short, long, default_value_t = 3)]
    pub objects: u32,

    /// Simulated work per order in milliseconds
    #[arg(long, default_value_t = 2)]
    pub work_ms: u64,

    /// Also print the JSON snapshot
    #[arg(long)]
    pub json: bool,
}

/// Instrumented component. Its type name is its profile name.
struct OrderService {
    buffers: Vec<Vec<u8>>,
}

impl ProfileCategory for OrderService {}

#[derive(Debug, Clone)]
struct Order {
    id: u32,
    items: usize,
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Order #{} ({} items)", self.id, self.items)
    }
}

impl OrderService {
    fn new() -> Self {
        Self {
            buffers: Vec::new(),
        }
    }

    fn process(&mut self, profiler: &Profiler, order: &Order, args: &DemoArgs) {
        profiler.clock_start(ProfileRef::of(self), "process");
        profiler.counter_inc(ProfileRef::of(self), "orders");

        self.buffers.push(vec![0u8; order.items * 64 * 1024]);
        thread::sleep(Duration::from_millis(args.work_ms));

        if order.id % 3 == 0 {
            profiler.counter_inc(ProfileRef::of(self), "large-orders");
        }
        if order.id < args.objects {
            profiler.cache_add(ProfileRef::of(self), "orders", None, order.clone());
        }
        profiler.chain_add_link(ProfileRef::of(self), "memory", &format!("order-{}", order.id));
        profiler.clock_stop(ProfileRef::of(self), "process");
    }
}

/// Drive the workload against `profiler`.
fn run_workload(profiler: &Profiler, args: &DemoArgs) {
    let mut service = OrderService::new();
    profiler.chain_add_link(ProfileRef::of(&service), "memory", "start");

    profiler.clock_start(ProfileRef::Default, "total");
    for id in 0..args.iterations {
        let order = Order {
            id,
            items: (id as usize % 4) + 1,
        };
        service.process(profiler, &order, args);
        profiler.counter_inc(ProfileRef::Default, "iterations");
    }
    profiler.clock_stop(ProfileRef::Default, "total");

    service.buffers.clear();
    service.buffers.shrink_to_fit();
    profiler.chain_add_link(ProfileRef::of(&service), "memory", "released");
}

/// Stop recording and hand freed memory back to the host.
fn shut_down(profiler: &Profiler) {
    profiler.disable();
    profiler.gc();
    info!("Profiling stopped");
}

fn print_section(title: &str, body: &str) {
    if body.is_empty() {
        return;
    }
    println!("== {} ==", title);
    println!("{}", body.trim_end_matches('\n'));
    println!();
}

/// Run the demo command.
pub fn run(args: DemoArgs, config_path: Option<&Path>) -> Result<(), CliError> {
    if args.iterations == 0 {
        return Err(CliError::InvalidArgument(
            "--iterations must be at least 1".to_string(),
        ));
    }

    let config = load_config_or_default(config_path);
    let profiler = Profiler::from_config(config);
    info!(
        iterations = args.iterations,
        objects = args.objects,
        enabled = profiler.is_enabled(),
        "Running demo workload"
    );

    run_workload(&profiler, &args);

    print_section("Counters", &profiler.report_all_counters());
    print_section("Clocks", &profiler.report_all_clocks());
    print_section("Chains", &profiler.report_all_chains());
    print_section("Cache", &profiler.report_cache("OrderService", "orders"));
    if args.json {
        print_section("Snapshot", &profiler.report_json()?);
    }

    shut_down(&profiler);
    Ok(())
}

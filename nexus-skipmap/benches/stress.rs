// benches/stress.rs
//! Multi-threaded insert/search stress driver for Synchronized<SkipMap>.
//!
//! Every thread inserts random keys, then searches random keys, both under
//! the coarse lock. Reports per-phase wall time and per-op latency.
//!
//! Run: cargo bench --bench stress -- <nodes> <threads> [exclusive|shared]
//! Logging: RUST_LOG=nexus_skipmap=debug cargo bench --bench stress

use std::sync::Arc;
use std::thread;
use std::time::Instant;

use hdrhistogram::Histogram;
use nexus_skipmap::{ReadPolicy, SkipMap, SkipListBuilder, Synchronized};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEFAULT_NODES: usize = 100_000;
const DEFAULT_THREADS: usize = 4;

type Shared = Arc<Synchronized<SkipMap<u64, String>>>;

fn run_phase<F>(name: &str, shared: &Shared, threads: usize, per_thread: usize, op: F)
where
    F: Fn(&Synchronized<SkipMap<u64, String>>, &mut SmallRng, u64) + Send + Sync + Copy + 'static,
{
    let start = Instant::now();

    let handles: Vec<_> = (0..threads)
        .map(|t| {
            let shared = Arc::clone(shared);
            thread::spawn(move || {
                let mut rng = SmallRng::seed_from_u64(t as u64);
                let mut hist = Histogram::<u64>::new(3).unwrap();
                for _ in 0..per_thread {
                    let key = rng.random_range(0..(per_thread * threads) as u64);
                    let op_start = Instant::now();
                    op(&*shared, &mut rng, key);
                    hist.record(op_start.elapsed().as_nanos() as u64).unwrap();
                }
                hist
            })
        })
        .collect();

    let mut combined = Histogram::<u64>::new(3).unwrap();
    for handle in handles {
        combined.add(handle.join().unwrap()).unwrap();
    }

    let elapsed = start.elapsed();
    println!(
        "{name:8} {threads} threads x {per_thread} ops: {:>8.2} ms | p50: {:5} ns | p99: {:6} ns | p999: {:7} ns | max: {:8} ns",
        elapsed.as_secs_f64() * 1e3,
        combined.value_at_quantile(0.50),
        combined.value_at_quantile(0.99),
        combined.value_at_quantile(0.999),
        combined.max(),
    );
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // cargo bench passes "--bench"; skip flags.
    let args: Vec<String> = std::env::args().skip(1).filter(|a| !a.starts_with("--")).collect();
    let nodes = args.first().and_then(|a| a.parse().ok()).unwrap_or(DEFAULT_NODES);
    let threads = args
        .get(1)
        .and_then(|a| a.parse().ok())
        .unwrap_or(DEFAULT_THREADS)
        .max(1);
    let policy = match args.get(2).map(String::as_str) {
        Some("shared") => ReadPolicy::Shared,
        _ => ReadPolicy::Exclusive,
    };
    let per_thread = (nodes / threads).max(1);

    info!(nodes, threads, ?policy, "starting skip map stress run");

    let map = SkipListBuilder::default()
        .capacity(nodes)
        .build_map(nexus_skipmap::Ascending)
        .unwrap();
    let shared: Shared = Arc::new(Synchronized::new(map, policy));

    run_phase("insert", &shared, threads, per_thread, |map, _, key| {
        map.insert(key, "a".to_string());
    });

    run_phase("search", &shared, threads, per_thread, |map, _, key| {
        std::hint::black_box(map.contains_key(&key));
    });

    run_phase("mixed", &shared, threads, per_thread, |map, rng, key| {
        if rng.random_bool(0.5) {
            map.upsert(key, "b".to_string());
        } else {
            map.remove(&key);
        }
    });

    let len = shared.len();
    shared.read(|map| map.as_list().check_invariants());
    info!(len, "stress run finished, structure verified");
}

//! Benchmarks for skip map operations.
//!
//! Compares SkipMap against std's BTreeMap at a few sizes.

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use nexus_skipmap::{Ascending, SkipMap};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;

const SIZES: [usize; 3] = [1_000, 10_000, 100_000];

fn random_keys(count: usize, seed: u64) -> Vec<u64> {
    let mut rng = SmallRng::seed_from_u64(seed);
    (0..count).map(|_| rng.random_range(0..count as u64 * 4)).collect()
}

fn seeded_map() -> SkipMap<u64, u64> {
    SkipMap::with_rng(18, Ascending, SmallRng::seed_from_u64(12345))
}

// ============================================================================
// Insert
// ============================================================================

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert_random");

    for size in SIZES {
        let keys = random_keys(size, 1);
        group.throughput(Throughput::Elements(size as u64));

        group.bench_with_input(BenchmarkId::new("skipmap", size), &keys, |b, keys| {
            b.iter(|| {
                let mut map = seeded_map();
                for key in keys {
                    map.insert(*key, *key);
                }
                black_box(map.len())
            });
        });

        group.bench_with_input(BenchmarkId::new("btreemap", size), &keys, |b, keys| {
            b.iter(|| {
                let mut map = BTreeMap::new();
                for key in keys {
                    map.entry(*key).or_insert(*key);
                }
                black_box(map.len())
            });
        });
    }

    group.finish();
}

// ============================================================================
// Lookup
// ============================================================================

fn bench_get(c: &mut Criterion) {
    let mut group = c.benchmark_group("get_random");

    for size in SIZES {
        let keys = random_keys(size, 2);
        let lookups = random_keys(size, 3);

        let mut skip = seeded_map();
        let mut btree = BTreeMap::new();
        for key in &keys {
            skip.insert(*key, *key);
            btree.insert(*key, *key);
        }

        group.throughput(Throughput::Elements(size as u64));

        group.bench_with_input(BenchmarkId::new("skipmap", size), &lookups, |b, lookups| {
            b.iter(|| {
                let mut hits = 0u64;
                for key in lookups {
                    if let Some(v) = skip.get(key) {
                        hits += v;
                    }
                }
                black_box(hits)
            });
        });

        group.bench_with_input(BenchmarkId::new("btreemap", size), &lookups, |b, lookups| {
            b.iter(|| {
                let mut hits = 0u64;
                for key in lookups {
                    if let Some(v) = btree.get(key) {
                        hits += v;
                    }
                }
                black_box(hits)
            });
        });
    }

    group.finish();
}

// ============================================================================
// Insert/remove churn on a steady-state map
// ============================================================================

fn bench_churn(c: &mut Criterion) {
    let mut group = c.benchmark_group("churn");

    for size in SIZES {
        let mut map = seeded_map();
        for key in 0..size as u64 {
            map.insert(key * 2, key);
        }
        let mut next = size as u64 * 2;

        group.bench_function(BenchmarkId::new("skipmap/pop_insert", size), |b| {
            b.iter(|| {
                let (key, value) = map.pop_first().unwrap();
                map.insert(black_box(next), value);
                next += 2;
                black_box(key)
            });
        });
    }

    group.finish();
}

fn bench_iterate(c: &mut Criterion) {
    let mut group = c.benchmark_group("iterate");

    for size in SIZES {
        let map: SkipMap<u64, u64> = (0..size as u64).map(|k| (k, k)).collect();
        group.throughput(Throughput::Elements(size as u64));

        group.bench_function(BenchmarkId::new("skipmap", size), |b| {
            b.iter(|| black_box(map.values().sum::<u64>()));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_insert, bench_get, bench_churn, bench_iterate);
criterion_main!(benches);

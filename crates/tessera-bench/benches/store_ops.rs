//! Criterion micro-benchmarks for agent store operations.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tessera_core::{AgentId, Vec3};
use tessera_store::AgentStore;
use tessera_test_utils::TestAgent;

fn populated(n: u64, partitions: usize) -> AgentStore<TestAgent> {
    let mut store = AgentStore::new(partitions).unwrap();
    store.reserve(n as usize);
    for i in 0..n {
        let p = tessera_core::PartitionId((i % partitions as u64) as u16);
        store
            .insert(TestAgent::tagged(Vec3::new(i as f64, 0.0, 0.0), i), p)
            .unwrap();
    }
    store
}

/// Benchmark: push 10K agents into a fresh store.
fn bench_push_10k(c: &mut Criterion) {
    c.bench_function("push_10k", |b| {
        b.iter(|| {
            let mut store = AgentStore::new(1).unwrap();
            for i in 0..10_000u64 {
                store.push(TestAgent::tagged(Vec3::ZERO, i));
            }
            black_box(&store);
        });
    });
}

/// Benchmark: remove every other agent of a 10K store (swap-remove path).
fn bench_remove_half_10k(c: &mut Criterion) {
    c.bench_function("remove_half_10k", |b| {
        b.iter_batched(
            || populated(10_000, 4),
            |mut store| {
                for i in (0..10_000u64).step_by(2) {
                    store.remove(AgentId(i)).unwrap();
                }
                black_box(store)
            },
            criterion::BatchSize::LargeInput,
        );
    });
}

/// Benchmark: id lookups over a 100K store.
fn bench_get_100k(c: &mut Criterion) {
    let store = populated(100_000, 4);
    c.bench_function("get_100k", |b| {
        b.iter(|| {
            let mut sum = 0u64;
            for i in 0..100_000u64 {
                sum += store.get(AgentId(i)).unwrap().tag;
            }
            black_box(sum)
        });
    });
}

/// Benchmark: chunked parallel map over 100K agents.
fn bench_map_parallel_100k(c: &mut Criterion) {
    let store = populated(100_000, 4);
    c.bench_function("map_parallel_100k", |b| {
        b.iter(|| {
            let sums = store.map_parallel(1000, |chunk| {
                chunk.iter().map(|(_, _, a)| a.tag).sum::<u64>()
            });
            black_box(sums)
        });
    });
}

/// Benchmark: Morton-order rebalance of 100K agents over 4 partitions.
fn bench_rebalance_100k(c: &mut Criterion) {
    c.bench_function("rebalance_100k", |b| {
        b.iter_batched(
            || populated(100_000, 4),
            |mut store| black_box(store.rebalance_partitions(1.0)),
            criterion::BatchSize::LargeInput,
        );
    });
}

criterion_group!(
    benches,
    bench_push_10k,
    bench_remove_half_10k,
    bench_get_100k,
    bench_map_parallel_100k,
    bench_rebalance_100k
);
criterion_main!(benches);

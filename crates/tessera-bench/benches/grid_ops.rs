//! Criterion micro-benchmarks for the uniform grid.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tessera_bench::{cell_population, CELL_DIAMETER};
use tessera_core::AgentId;
use tessera_space::{GridConfig, UniformGrid};
use tessera_store::AgentStore;

fn store_of(n: usize) -> AgentStore<tessera_behaviors::SphericalCell> {
    let mut store = AgentStore::new(4).unwrap();
    for cell in cell_population(n, 42) {
        store.push(cell);
    }
    store.rebalance_partitions(CELL_DIAMETER);
    store
}

/// Benchmark: rebuild the index over 100K cells.
fn bench_rebuild_100k(c: &mut Criterion) {
    let store = store_of(100_000);
    let mut grid = UniformGrid::new(GridConfig::default()).unwrap();
    c.bench_function("grid_rebuild_100k", |b| {
        b.iter(|| {
            grid.rebuild(&store).unwrap();
            black_box(grid.len())
        });
    });
}

/// Benchmark: one interaction-radius query per agent over 10K cells.
fn bench_neighbors_10k(c: &mut Criterion) {
    let store = store_of(10_000);
    let mut grid = UniformGrid::new(GridConfig::default()).unwrap();
    grid.rebuild(&store).unwrap();
    c.bench_function("grid_neighbors_10k", |b| {
        b.iter(|| {
            let mut total = 0usize;
            for i in 0..10_000u64 {
                grid.for_each_neighbor(AgentId(i), CELL_DIAMETER, |_, _, _| total += 1)
                    .unwrap();
            }
            black_box(total)
        });
    });
}

criterion_group!(benches, bench_rebuild_100k, bench_neighbors_10k);
criterion_main!(benches);

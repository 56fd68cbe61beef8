//! Benchmark profiles and utilities for the Tessera simulation framework.
//!
//! - [`cell_population`]: deterministic cell placement via seed
//! - [`reference_config`]: bounded, mechanics-on configuration
//! - [`reference_simulation`]: a populated simulation ready to step
//! - [`reference_scheduler`]: the standard growth and mechanics pipeline

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use rand::Rng;
use rand_chacha::rand_core::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tessera_behavior::PipelineError;
use tessera_behaviors::{standard_pipeline, GrowDivide, SphericalCell};
use tessera_core::{Aabb, Vec3};
use tessera_engine::{ConfigError, Scheduler, Simulation, SimulationConfig};

/// Cell diameter used by every profile.
pub const CELL_DIAMETER: f64 = 10.0;

/// Side of a cube holding `n` cells at roughly one diameter spacing.
pub fn domain_side(n: usize) -> f64 {
    (n.max(1) as f64).cbrt() * CELL_DIAMETER
}

/// `n` cells placed uniformly at random in the cube of [`domain_side`].
///
/// Same `(n, seed)`, same cells.
pub fn cell_population(n: usize, seed: u64) -> Vec<SphericalCell> {
    let side = domain_side(n);
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..n)
        .map(|_| {
            let p = Vec3::new(
                rng.random_range(0.0..side),
                rng.random_range(0.0..side),
                rng.random_range(0.0..side),
            );
            SphericalCell::new(p, CELL_DIAMETER)
        })
        .collect()
}

/// Bounded configuration sized for `n` cells.
pub fn reference_config(n: usize, threads: Option<usize>, seed: u64) -> SimulationConfig {
    SimulationConfig {
        threads,
        partitions: threads.unwrap_or(4),
        seed,
        bound_space: true,
        bounds: Some(Aabb::cube(0.0, domain_side(n))),
        rebalance_interval: 10,
        ..SimulationConfig::default()
    }
}

/// A simulation holding [`cell_population`]`(n, seed)`, spread across
/// partitions by spatial locality.
pub fn reference_simulation(
    n: usize,
    threads: Option<usize>,
    seed: u64,
) -> Result<Simulation<SphericalCell>, ConfigError> {
    let mut sim = Simulation::new(reference_config(n, threads, seed))?;
    sim.store_mut().reserve(n);
    for cell in cell_population(n, seed) {
        sim.push(cell);
    }
    sim.store_mut().rebalance_partitions(CELL_DIAMETER);
    Ok(sim)
}

/// Bound space, grow/divide and mechanical displacement.
pub fn reference_scheduler() -> Result<Scheduler<SphericalCell>, PipelineError> {
    Scheduler::new(standard_pipeline(vec![Box::new(GrowDivide::default())]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_core::Agent;

    #[test]
    fn reference_config_validates() {
        reference_config(10_000, Some(2), 42).validate().unwrap();
    }

    #[test]
    fn population_is_deterministic_and_in_bounds() {
        let a = cell_population(500, 7);
        let b = cell_population(500, 7);
        assert_eq!(a, b);
        let bounds = Aabb::cube(0.0, domain_side(500));
        assert!(a.iter().all(|c| bounds.contains(c.position())));
    }

    #[test]
    fn reference_simulation_steps() {
        let mut sim = reference_simulation(200, Some(2), 3).unwrap();
        assert_eq!(sim.agent_count(), 200);
        assert!(sim.store().count(Some(tessera_core::PartitionId(1))) > 0);
        let mut scheduler = reference_scheduler().unwrap();
        let report = scheduler.simulate(&mut sim, 2).unwrap();
        assert_eq!(report.steps, 2);
        assert!(sim.agent_count() >= 200);
    }
}

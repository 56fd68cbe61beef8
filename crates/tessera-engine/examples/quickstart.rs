//! Tessera Quickstart: a growing tumour spheroid from a single cell.
//!
//! Demonstrates:
//!   1. Building and validating a SimulationConfig
//!   2. Seeding a Simulation with a cell that carries its own grow/divide
//!   3. Composing the standard pipeline (bound space, attached biology, mechanics)
//!   4. Registering a field collaborator that samples positions each step
//!   5. Stepping, reading metrics, and checkpoint/restore
//!
//! Run with:
//!   RUST_LOG=info cargo run --example quickstart

use std::process;

use tessera_behavior::{AttachedBehavior, Behavior, RunAttached};
use tessera_behaviors::{standard_pipeline, GrowDivide, SphericalCell};
use tessera_core::{Aabb, SubstanceId, Vec3};
use tessera_engine::{AgentPositions, FieldCollaborator, Scheduler, SimulationConfig, StepError};

// ─── Model parameters ───────────────────────────────────────────

const DOMAIN: f64 = 200.0;
const CELL_DIAMETER: f64 = 30.0;
const DIVISION_THRESHOLD: f64 = 40.0;
const GROWTH_RATE: f64 = 100_000.0;
const STEPS: u64 = 100;

// ─── Field collaborator: spheroid extent ────────────────────────
//
// Stands in for a diffusion grid: it only observes where cells are.

#[derive(Default)]
struct Extent {
    radius: f64,
    cells: usize,
}

impl FieldCollaborator for Extent {
    fn name(&self) -> &str {
        "extent"
    }

    fn sample(&mut self, positions: &AgentPositions<'_>) {
        let centre = Vec3::new(DOMAIN / 2.0, DOMAIN / 2.0, DOMAIN / 2.0);
        self.cells = positions.len();
        self.radius = positions
            .iter()
            .map(|(_, p)| (p - centre).norm())
            .fold(0.0, f64::max);
    }
}

const EXTENT: SubstanceId = SubstanceId(0);

// ─── Main ───────────────────────────────────────────────────────

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    if let Err(e) = run() {
        eprintln!("quickstart failed: {e}");
        let fatal = e
            .downcast_ref::<StepError>()
            .is_some_and(StepError::is_fatal);
        process::exit(if fatal { 2 } else { 1 });
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Tessera Quickstart ===\n");

    // 1. Configure a bounded domain.
    let config = SimulationConfig {
        bound_space: true,
        bounds: Some(Aabb::cube(0.0, DOMAIN)),
        partitions: 4,
        rebalance_interval: 50,
        ..SimulationConfig::default()
    };

    // 2. Simulation and pipeline. Biology lives on the cells themselves.
    let biology: Vec<Box<dyn Behavior<SphericalCell>>> = vec![Box::new(RunAttached)];
    let (mut sim, mut scheduler) = Scheduler::build(config, standard_pipeline(biology))?;
    println!(
        "Simulation created: {} threads, seed {}",
        sim.threads(),
        sim.random().seed()
    );
    println!(
        "Pipeline: {}",
        scheduler.pipeline().names().collect::<Vec<_>>().join(" -> ")
    );

    // 3. One cell in the middle of the domain. Daughters inherit grow/divide.
    let centre = Vec3::new(DOMAIN / 2.0, DOMAIN / 2.0, DOMAIN / 2.0);
    sim.push(
        SphericalCell::new(centre, CELL_DIAMETER)
            .with_adherence(0.01)
            .with_behavior(AttachedBehavior::new(GrowDivide::new(
                DIVISION_THRESHOLD,
                GROWTH_RATE,
            ))),
    );
    println!();

    // 4. Field collaborator.
    sim.fields_mut().register(EXTENT, Box::new(Extent::default()))?;

    // 5. Run, printing progress.
    for _ in 0..STEPS / 20 {
        let report = scheduler.simulate(&mut sim, 20)?;
        let metrics = scheduler.last_metrics();
        let extent = sim.fields().get_as::<Extent>(EXTENT)?;
        println!(
            "  step {:>4}: cells={:>5} (+{:<4}) extent={:>6.1} step_time={}μs",
            report.step,
            metrics.agent_count,
            report.agents_created,
            extent.radius,
            metrics.total_us,
        );
    }

    // 6. Checkpoint, run on, then restore and check we get the same count.
    let checkpoint = sim.checkpoint();
    let at = sim.agent_count();
    scheduler.simulate(&mut sim, 10)?;
    println!("\nAfter 10 more steps: {} cells", sim.agent_count());
    let restored = sim.restore(checkpoint)?;
    println!(
        "Restored to step {}: {} cells (lossy: {})",
        sim.step(),
        sim.agent_count(),
        restored.is_lossy()
    );
    assert_eq!(sim.agent_count(), at);

    Ok(())
}

//! Integration test: checkpoint and restore of a whole simulation.
//!
//! Same-shape restores resume bit-for-bit; restores into a different
//! partition or worker count are lossy but keep every agent; an
//! inconsistent checkpoint is rejected without touching the target.

use rand_chacha::rand_core::RngCore;
use tessera_behavior::{Behavior, ExecutionContext};
use tessera_core::{AgentId, BehaviorError, PartitionId, Vec3};
use tessera_engine::{Scheduler, Simulation, SimulationConfig, StepError};
use tessera_store::StoreError;
use tessera_test_utils::TestAgent;

/// Moves each agent by a random offset drawn from the worker generator.
struct RandomWalk;

impl Behavior<TestAgent> for RandomWalk {
    fn name(&self) -> &str {
        "random-walk"
    }

    fn run(
        &self,
        agent: &mut TestAgent,
        ctx: &mut ExecutionContext<'_, TestAgent>,
    ) -> Result<(), BehaviorError> {
        let step = (ctx.rng().next_u32() % 100) as f64 / 100.0;
        agent.position = agent.position + Vec3::new(step, 0.0, 0.0);
        Ok(())
    }
}

fn config(threads: usize, partitions: usize) -> SimulationConfig {
    SimulationConfig {
        threads: Some(threads),
        partitions,
        chunk_size: 4,
        seed: 11,
        ..SimulationConfig::default()
    }
}

fn populated(threads: usize, partitions: usize, n: u64) -> Simulation<TestAgent> {
    let mut sim = Simulation::new(config(threads, partitions)).unwrap();
    for i in 0..n {
        let p = PartitionId((i % partitions as u64) as u16);
        sim.insert(TestAgent::tagged(Vec3::new(i as f64 * 2.0, 0.0, 0.0), i), p)
            .unwrap();
    }
    sim
}

fn positions(sim: &Simulation<TestAgent>) -> Vec<(AgentId, Vec3)> {
    let mut out: Vec<_> = sim.store().iter().map(|(id, a)| (id, a.position)).collect();
    out.sort_by_key(|(id, _)| *id);
    out
}

#[test]
fn same_shape_restore_resumes_identically() {
    let mut original = populated(1, 1, 10);
    let mut scheduler = Scheduler::new(vec![Box::new(RandomWalk) as Box<dyn Behavior<TestAgent>>]).unwrap();
    scheduler.simulate(&mut original, 2).unwrap();
    let cp = original.checkpoint();
    scheduler.simulate(&mut original, 3).unwrap();

    let mut resumed = Simulation::new(config(1, 1)).unwrap();
    let report = resumed.restore(cp).unwrap();
    assert!(!report.is_lossy());
    scheduler.simulate(&mut resumed, 3).unwrap();

    assert_eq!(resumed.step(), original.step());
    assert_eq!(positions(&resumed), positions(&original));
}

#[test]
fn restore_into_fewer_partitions_is_lossy_but_complete() {
    let source = populated(2, 4, 13);
    let cp = source.checkpoint();

    let mut target = Simulation::new(config(2, 2)).unwrap();
    let report = target.restore(cp).unwrap();

    assert!(report.store.lossy);
    assert_eq!(report.store.source_partitions, 4);
    assert_eq!(report.store.target_partitions, 2);
    assert_eq!(target.agent_count(), 13);
    for i in 0..13 {
        assert_eq!(target.store().get(AgentId(i)).unwrap().tag, i);
    }
    // Fresh ids continue past the restored ones.
    let next = target.push(TestAgent::default());
    assert_eq!(next, AgentId(13));
}

#[test]
fn restore_with_more_workers_copies_common_prefix() {
    let source = populated(2, 1, 3);
    let cp = source.checkpoint();
    assert_eq!(cp.rng_states.len(), 3);

    let mut target = Simulation::new(config(4, 1)).unwrap();
    let report = target.restore(cp).unwrap();

    assert!(report.rng.lossy);
    assert_eq!(report.rng.copied, 3);
    assert!(!report.store.lossy);
    assert!(report.is_lossy());
}

#[test]
fn inconsistent_checkpoint_is_fatal_and_leaves_target_untouched() {
    let source = populated(1, 1, 4);
    let mut cp = source.checkpoint();
    cp.store.identity.pop();

    let mut target = populated(1, 1, 2);
    let err = target.restore(cp).unwrap_err();

    assert!(err.is_fatal());
    assert!(matches!(
        err,
        StepError::Store(StoreError::InvariantViolation { .. })
    ));
    assert_eq!(target.agent_count(), 2);
}

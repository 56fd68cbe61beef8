//! Integration test: end-to-end step scenarios.
//!
//! Runs small populations through `Scheduler::simulate` and checks the
//! store after commit: removals, births, per-agent failure rollback,
//! same-step visibility and field sampling.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tessera_behavior::Behavior;
use tessera_core::{AgentId, StepId, SubstanceId, Vec3};
use tessera_engine::{
    AgentPositions, FieldCollaborator, Scheduler, SchedulerState, Simulation, SimulationConfig,
};
use tessera_test_utils::{
    Drift, FailingBehavior, NeighborCounter, NoopBehavior, RemoveEvenTagged, SpawnOnce, TestAgent,
};

fn sim(threads: usize, chunk_size: usize) -> Simulation<TestAgent> {
    Simulation::new(SimulationConfig {
        threads: Some(threads),
        chunk_size,
        ..SimulationConfig::default()
    })
    .unwrap()
}

fn boxed<B: Behavior<TestAgent>>(b: B) -> Box<dyn Behavior<TestAgent>> {
    Box::new(b)
}

// ── Removal ──────────────────────────────────────────────────────────

#[test]
fn ten_agents_remove_even_tagged_leaves_five_odd() {
    let mut sim = sim(4, 3);
    let ids: Vec<AgentId> = (0..10)
        .map(|i| sim.push(TestAgent::tagged(Vec3::new(i as f64, 0.0, 0.0), i)))
        .collect();
    let mut scheduler = Scheduler::new(vec![boxed(RemoveEvenTagged)]).unwrap();

    let report = scheduler.simulate(&mut sim, 1).unwrap();

    assert_eq!(report.agents_removed, 5);
    assert_eq!(sim.agent_count(), 5);
    let mut survivors: Vec<AgentId> = sim.store().ids().collect();
    survivors.sort_unstable();
    let odd: Vec<AgentId> = ids.iter().copied().skip(1).step_by(2).collect();
    assert_eq!(survivors, odd);
    for (i, &id) in ids.iter().enumerate() {
        match sim.store().get(id) {
            Ok(agent) => {
                assert_eq!(i % 2, 1);
                assert_eq!(agent.tag, i as u64);
            }
            Err(_) => assert_eq!(i % 2, 0),
        }
    }
}

// ── Births ───────────────────────────────────────────────────────────

#[test]
fn one_birth_per_step_for_five_steps_gives_six_agents() {
    let mut sim = sim(2, 1000);
    sim.push(TestAgent::tagged(Vec3::ZERO, 0));
    let mut scheduler = Scheduler::new(vec![boxed(SpawnOnce::new(0, 1))]).unwrap();

    let report = scheduler.simulate(&mut sim, 5).unwrap();

    assert_eq!(sim.agent_count(), 6);
    assert_eq!(sim.step(), StepId(5));
    assert_eq!(report.agents_created, 5);
    assert_eq!(report.step, StepId(5));
}

#[test]
fn new_agents_get_fresh_ids() {
    let mut sim = sim(2, 1);
    for i in 0..4 {
        sim.push(TestAgent::tagged(Vec3::new(i as f64 * 3.0, 0.0, 0.0), 0));
    }
    let mut scheduler = Scheduler::new(vec![boxed(SpawnOnce::new(0, 1))]).unwrap();
    scheduler.simulate(&mut sim, 1).unwrap();

    let mut ids: Vec<AgentId> = sim.store().ids().collect();
    ids.sort_unstable();
    assert_eq!(ids, (0..8).map(AgentId).collect::<Vec<_>>());
}

#[test]
fn staged_births_are_invisible_until_commit() {
    let mut sim = sim(1, 1000);
    sim.push(TestAgent::tagged(Vec3::ZERO, 0));
    let mut scheduler = Scheduler::new(vec![
        boxed(SpawnOnce::new(0, 1)),
        boxed(NeighborCounter { radius: 1.0 }),
    ])
    .unwrap();

    scheduler.simulate(&mut sim, 1).unwrap();
    assert_eq!(sim.store().get(AgentId(0)).unwrap().counter, 0);

    scheduler.simulate(&mut sim, 1).unwrap();
    assert_eq!(sim.store().get(AgentId(0)).unwrap().counter, 1);
}

// ── Failure atomicity ────────────────────────────────────────────────

#[test]
fn failing_agent_commits_nothing_and_others_proceed() {
    let mut sim = sim(2, 2);
    for i in 0..5 {
        sim.push(TestAgent::tagged(Vec3::new(i as f64 * 5.0, 0.0, 0.0), i));
    }
    let before = sim.store().get(AgentId(3)).unwrap().clone();
    let mut scheduler = Scheduler::new(vec![
        boxed(Drift {
            delta: Vec3::new(0.0, 1.0, 0.0),
        }),
        boxed(FailingBehavior::new(3)),
    ])
    .unwrap();

    let report = scheduler.simulate(&mut sim, 1).unwrap();

    assert_eq!(report.behavior_failures, 1);
    assert_eq!(report.agents_created, 0);
    assert_eq!(report.agents_removed, 0);
    assert_eq!(sim.agent_count(), 5);
    // The failing agent keeps its tick-start state; the drift applied by
    // the earlier behavior is discarded with the rest of its work.
    assert_eq!(sim.store().get(AgentId(3)).unwrap(), &before);
    for id in [0, 1, 2, 4] {
        assert_eq!(sim.store().get(AgentId(id)).unwrap().position.y, 1.0);
    }
    assert_eq!(scheduler.state(), SchedulerState::Idle);
}

// ── Field collaborators ──────────────────────────────────────────────

struct PositionCounter {
    samples: Arc<AtomicUsize>,
    steps: Vec<StepId>,
}

impl FieldCollaborator for PositionCounter {
    fn name(&self) -> &str {
        "position-counter"
    }

    fn sample(&mut self, positions: &AgentPositions<'_>) {
        self.samples.fetch_add(positions.len(), Ordering::Relaxed);
        self.steps.push(positions.step());
    }
}

#[test]
fn fields_sample_every_step_before_behaviors() {
    let mut sim = sim(2, 1000);
    sim.push(TestAgent::tagged(Vec3::ZERO, 0));
    let samples = Arc::new(AtomicUsize::new(0));
    sim.fields_mut()
        .register(
            SubstanceId(0),
            Box::new(PositionCounter {
                samples: Arc::clone(&samples),
                steps: Vec::new(),
            }),
        )
        .unwrap();
    let mut scheduler = Scheduler::new(vec![boxed(SpawnOnce::new(0, 1))]).unwrap();

    scheduler.simulate(&mut sim, 3).unwrap();

    // Populations seen: 1, 2, 3.
    assert_eq!(samples.load(Ordering::Relaxed), 6);
    let field = sim
        .fields()
        .get_as::<PositionCounter>(SubstanceId(0))
        .unwrap();
    assert_eq!(field.steps, vec![StepId(0), StepId(1), StepId(2)]);
}

// ── Rebalancing ──────────────────────────────────────────────────────

#[test]
fn periodic_rebalance_keeps_every_agent() {
    let mut sim = Simulation::new(SimulationConfig {
        threads: Some(2),
        partitions: 3,
        rebalance_interval: 2,
        ..SimulationConfig::default()
    })
    .unwrap();
    for i in 0..31 {
        sim.push(TestAgent::tagged(Vec3::new(i as f64, (i % 5) as f64, 0.0), i));
    }
    let mut scheduler = Scheduler::new(vec![boxed(NoopBehavior::new("noop"))]).unwrap();

    scheduler.simulate(&mut sim, 3).unwrap();

    assert_eq!(sim.agent_count(), 31);
    let counts: Vec<usize> = (0..3)
        .map(|p| sim.store().count(Some(tessera_core::PartitionId(p))))
        .collect();
    let max = counts.iter().max().unwrap();
    let min = counts.iter().min().unwrap();
    assert!(max - min <= 1, "unbalanced partitions: {counts:?}");
    for i in 0..31 {
        assert_eq!(sim.store().get(AgentId(i)).unwrap().tag, i);
    }
}

//! Reusable behavior test fixtures.
//!
//! - [`NoopBehavior`] does nothing.
//! - [`RemoveEvenTagged`] removes every agent with an even tag.
//! - [`SpawnOnce`] makes agents with a given tag spawn one child per step.
//! - [`FailingBehavior`] stages work, then fails for one tag.
//! - [`NeighborCounter`] stores the neighbour count in the agent's counter.
//! - [`Drift`] moves every agent by a fixed offset.
//! - [`PanicOnStep`] panics on a chosen step.

use std::sync::atomic::{AtomicUsize, Ordering};

use tessera_behavior::{Behavior, ExecutionContext};
use tessera_core::{Agent, BehaviorError, StepId, Vec3};

use crate::TestAgent;

/// Does nothing. Useful to fill a pipeline.
pub struct NoopBehavior {
    pub name: String,
}

impl NoopBehavior {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Behavior<TestAgent> for NoopBehavior {
    fn name(&self) -> &str {
        &self.name
    }

    fn run(
        &self,
        _agent: &mut TestAgent,
        _ctx: &mut ExecutionContext<'_, TestAgent>,
    ) -> Result<(), BehaviorError> {
        Ok(())
    }
}

/// Marks every agent whose tag is even for removal.
pub struct RemoveEvenTagged;

impl Behavior<TestAgent> for RemoveEvenTagged {
    fn name(&self) -> &str {
        "remove-even-tagged"
    }

    fn run(
        &self,
        agent: &mut TestAgent,
        ctx: &mut ExecutionContext<'_, TestAgent>,
    ) -> Result<(), BehaviorError> {
        if agent.tag % 2 == 0 {
            ctx.remove_self();
        }
        Ok(())
    }
}

/// Agents tagged `spawner_tag` create one child per step, tagged
/// `child_tag`, next to themselves. Children do not spawn.
pub struct SpawnOnce {
    pub spawner_tag: u64,
    pub child_tag: u64,
}

impl SpawnOnce {
    pub fn new(spawner_tag: u64, child_tag: u64) -> Self {
        Self {
            spawner_tag,
            child_tag,
        }
    }
}

impl Behavior<TestAgent> for SpawnOnce {
    fn name(&self) -> &str {
        "spawn-once"
    }

    fn run(
        &self,
        agent: &mut TestAgent,
        ctx: &mut ExecutionContext<'_, TestAgent>,
    ) -> Result<(), BehaviorError> {
        if agent.tag == self.spawner_tag {
            let offset = Vec3::new(0.5, 0.0, 0.0);
            ctx.new_agent(TestAgent::tagged(agent.position + offset, self.child_tag));
        }
        Ok(())
    }
}

/// Stages a child, a self-removal and a move for every agent, then fails
/// for agents tagged `fail_tag`.
///
/// Useful for checking that a failure rolls back exactly one agent's work.
/// Uses `AtomicUsize` for the call counter so it satisfies `Sync`.
pub struct FailingBehavior {
    pub fail_tag: u64,
    call_count: AtomicUsize,
}

impl FailingBehavior {
    pub fn new(fail_tag: u64) -> Self {
        Self {
            fail_tag,
            call_count: AtomicUsize::new(0),
        }
    }

    /// How many times `run()` has been called.
    pub fn calls(&self) -> usize {
        self.call_count.load(Ordering::Relaxed)
    }
}

impl Behavior<TestAgent> for FailingBehavior {
    fn name(&self) -> &str {
        "failing"
    }

    fn run(
        &self,
        agent: &mut TestAgent,
        ctx: &mut ExecutionContext<'_, TestAgent>,
    ) -> Result<(), BehaviorError> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        if agent.tag != self.fail_tag {
            return Ok(());
        }
        ctx.new_agent(TestAgent::tagged(agent.position, u64::MAX));
        ctx.remove_self();
        agent.set_position(agent.position + Vec3::new(1.0, 0.0, 0.0));
        Err(BehaviorError::failed(format!(
            "deliberate failure for tag {}",
            self.fail_tag
        )))
    }
}

/// Writes the number of neighbours within `radius` into `counter`.
pub struct NeighborCounter {
    pub radius: f64,
}

impl Behavior<TestAgent> for NeighborCounter {
    fn name(&self) -> &str {
        "neighbor-counter"
    }

    fn run(
        &self,
        agent: &mut TestAgent,
        ctx: &mut ExecutionContext<'_, TestAgent>,
    ) -> Result<(), BehaviorError> {
        let mut n = 0;
        ctx.for_each_neighbor(self.radius, |_, _, _| n += 1)?;
        agent.counter = n;
        Ok(())
    }
}

/// Moves every agent by `delta`.
pub struct Drift {
    pub delta: Vec3,
}

impl Behavior<TestAgent> for Drift {
    fn name(&self) -> &str {
        "drift"
    }

    fn run(
        &self,
        agent: &mut TestAgent,
        _ctx: &mut ExecutionContext<'_, TestAgent>,
    ) -> Result<(), BehaviorError> {
        agent.set_position(agent.position() + self.delta);
        Ok(())
    }
}

/// Panics when `step` is reached. Used to poison a scheduler.
pub struct PanicOnStep {
    pub step: StepId,
}

impl Behavior<TestAgent> for PanicOnStep {
    fn name(&self) -> &str {
        "panic-on-step"
    }

    fn run(
        &self,
        _agent: &mut TestAgent,
        ctx: &mut ExecutionContext<'_, TestAgent>,
    ) -> Result<(), BehaviorError> {
        if ctx.step() == self.step {
            panic!("deliberate panic on step {}", self.step.0);
        }
        Ok(())
    }
}

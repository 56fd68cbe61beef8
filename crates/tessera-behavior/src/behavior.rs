//! The [`Behavior`] trait.

use tessera_core::{Agent, BehaviorError};

use crate::context::ExecutionContext;

/// A per-agent operation run once per agent per step.
///
/// Behaviors are `&self`: any per-behavior state lives in the agent or is
/// immutable configuration. `run` receives a private copy of the agent
/// (changes are written back at commit) and an [`ExecutionContext`]
/// through which it reads other agents, queries neighbours, draws random
/// numbers and stages births and deaths.
///
/// # Contract
///
/// - Do not depend on another agent's same-step changes. Every read
///   through the context sees the tick-start state.
/// - Return `Err` instead of panicking on bad input. An error rolls back
///   everything this agent staged during the step; a panic poisons the
///   scheduler.
///
/// # Examples
///
/// ```
/// use tessera_behavior::{Behavior, ExecutionContext};
/// use tessera_core::{Agent, BehaviorError, Vec3};
///
/// struct Drift(Vec3);
///
/// impl<A: Agent> Behavior<A> for Drift {
///     fn name(&self) -> &str {
///         "drift"
///     }
///
///     fn run(&self, agent: &mut A, _ctx: &mut ExecutionContext<'_, A>) -> Result<(), BehaviorError> {
///         agent.set_position(agent.position() + self.0);
///         Ok(())
///     }
/// }
/// ```
pub trait Behavior<A: Agent>: Send + Sync + 'static {
    /// Unique name within a pipeline.
    fn name(&self) -> &str;

    /// Update `agent` for the current step.
    fn run(&self, agent: &mut A, ctx: &mut ExecutionContext<'_, A>) -> Result<(), BehaviorError>;
}

//! Keeps agents inside the simulation domain.

use tessera_behavior::{Behavior, ExecutionContext};
use tessera_core::{Agent, BehaviorError};

/// Clamps the agent's position into the configured bounds.
///
/// Active only when the step parameters enable `bound_space`; a no-op
/// otherwise. Validation guarantees bounds are present when enabled.
#[derive(Clone, Copy, Debug, Default)]
pub struct BoundSpace;

impl<A: Agent> Behavior<A> for BoundSpace {
    fn name(&self) -> &str {
        "bound-space"
    }

    fn run(&self, agent: &mut A, ctx: &mut ExecutionContext<'_, A>) -> Result<(), BehaviorError> {
        let params = ctx.params();
        if !params.bound_space {
            return Ok(());
        }
        let bounds = params
            .bounds
            .ok_or_else(|| BehaviorError::invalid_state("bound_space enabled without bounds"))?;
        let p = agent.position();
        if !bounds.contains(p) {
            agent.set_position(bounds.clamp(p));
        }
        Ok(())
    }
}

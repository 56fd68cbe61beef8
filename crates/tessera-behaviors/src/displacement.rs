//! Mechanical displacement from sphere-sphere repulsion.

use tessera_behavior::{Behavior, ExecutionContext};
use tessera_core::{AgentId, BehaviorError, Vec3};

use crate::cell::Mechanical;

/// Repulsion between two overlapping spheres, acting on the first.
///
/// With overlap `δ = r1 + r2 − |c1 − c2|` and effective radius
/// `r = r1·r2 / (r1 + r2)`, the magnitude is `2δ − √(rδ)`, directed from
/// the second centre to the first. Non-overlapping spheres exert no
/// force. Coincident centres are pushed apart along x, the lower id in
/// the negative direction.
pub fn sphere_force(
    (id1, c1, r1): (AgentId, Vec3, f64),
    (id2, c2, r2): (AgentId, Vec3, f64),
) -> Vec3 {
    let delta_c = c1 - c2;
    let distance = delta_c.norm();
    let overlap = r1 + r2 - distance;
    if overlap <= 0.0 || r1 + r2 <= 0.0 {
        return Vec3::ZERO;
    }
    let r = r1 * r2 / (r1 + r2);
    let magnitude = 2.0 * overlap - (r * overlap).sqrt();
    let direction = delta_c.normalized().unwrap_or_else(|| {
        if id1 < id2 {
            Vec3::new(-1.0, 0.0, 0.0)
        } else {
            Vec3::new(1.0, 0.0, 0.0)
        }
    });
    direction * magnitude
}

/// Moves an agent by its tractor force plus the repulsion of every
/// overlapping neighbour.
///
/// Neighbour forces only count when their sum exceeds the agent's
/// adherence; they are then scaled by `time_step / mass`. If that
/// contribution exceeds `max_displacement`, the whole movement is rescaled
/// to `max_displacement`. Skipped entirely when mechanical interactions
/// are disabled.
#[derive(Clone, Copy, Debug, Default)]
pub struct MechanicalDisplacement;

impl<A: Mechanical> Behavior<A> for MechanicalDisplacement {
    fn name(&self) -> &str {
        "mechanical-displacement"
    }

    fn run(&self, agent: &mut A, ctx: &mut ExecutionContext<'_, A>) -> Result<(), BehaviorError> {
        let params = ctx.params();
        if !params.run_mechanical_interactions {
            return Ok(());
        }
        let h = params.time_step;
        let max_displacement = params.max_displacement;

        let mut movement = agent.tractor_force() * h;

        // Earlier behaviors may have moved the agent this step; search around
        // where it is now, not where the index saw it.
        let me = (ctx.id(), agent.position(), agent.diameter() / 2.0);
        let radius = ctx.view().grid.largest_diameter().max(agent.diameter());
        let mut force = Vec3::ZERO;
        ctx.for_each_neighbor_of_point(me.1, radius, Some(me.0), |id, neighbor, _| {
            force += sphere_force(me, (id, neighbor.position(), neighbor.diameter() / 2.0));
        });

        let norm = force.norm();
        if norm > agent.adherence() {
            let mass = agent.mass();
            if mass.is_nan() || mass <= 0.0 {
                return Err(BehaviorError::invalid_state(format!(
                    "agent {} has non-positive mass {mass}",
                    ctx.id()
                )));
            }
            let mh = h / mass;
            movement += force * mh;
            if norm * mh > max_displacement {
                movement = movement
                    .normalized()
                    .map_or(Vec3::ZERO, |dir| dir * max_displacement);
            }
        }

        if movement != Vec3::ZERO {
            agent.set_position(agent.position() + movement);
        }
        Ok(())
    }
}

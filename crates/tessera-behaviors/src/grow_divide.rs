//! Growth followed by division.

use std::f64::consts::PI;

use rand::Rng;
use tessera_behavior::{Behavior, ExecutionContext};
use tessera_core::{BehaviorError, Vec3};

use crate::cell::Divisible;

/// Grows an agent until its diameter exceeds `threshold`, then divides it.
///
/// Growth adds `growth_rate · time_step` volume per step. Division picks a
/// volume ratio uniformly in `[0.9, 1.1)` and a uniformly random axis from
/// the worker's generator; the daughter is staged as a new agent.
#[derive(Clone, Debug, PartialEq)]
pub struct GrowDivide {
    /// Diameter above which the agent divides.
    pub threshold: f64,
    /// Volume added per unit of simulated time.
    pub growth_rate: f64,
}

impl GrowDivide {
    /// Create with the given threshold and growth rate.
    pub fn new(threshold: f64, growth_rate: f64) -> Self {
        Self {
            threshold,
            growth_rate,
        }
    }
}

impl Default for GrowDivide {
    fn default() -> Self {
        Self::new(40.0, 300.0)
    }
}

/// A point on the unit sphere from two uniform draws.
pub fn random_axis<R: Rng + ?Sized>(rng: &mut R) -> Vec3 {
    let theta = 2.0 * PI * rng.random::<f64>();
    let phi = (2.0 * rng.random::<f64>() - 1.0).acos();
    Vec3::new(phi.sin() * theta.cos(), phi.sin() * theta.sin(), phi.cos())
}

impl<A: Divisible> Behavior<A> for GrowDivide {
    fn name(&self) -> &str {
        "grow-divide"
    }

    fn run(&self, agent: &mut A, ctx: &mut ExecutionContext<'_, A>) -> Result<(), BehaviorError> {
        if agent.diameter() <= self.threshold {
            agent.change_volume(self.growth_rate * ctx.params().time_step);
            return Ok(());
        }
        let rng = ctx.rng();
        let ratio = rng.random_range(0.9..1.1);
        let axis = random_axis(rng);
        let daughter = agent.divide(ratio, axis);
        ctx.new_agent(daughter);
        Ok(())
    }
}

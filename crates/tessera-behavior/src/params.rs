//! Model parameters visible to behaviors.

use tessera_core::Aabb;

/// Read-only physical parameters of a step.
///
/// The engine derives this from its configuration; behaviors never
/// modify it.
#[derive(Clone, Debug, PartialEq)]
pub struct StepParams {
    /// Simulated time per step.
    pub time_step: f64,
    /// Upper bound on the distance an agent may move in one step.
    pub max_displacement: f64,
    /// Whether mechanical interactions between agents are resolved.
    pub run_mechanical_interactions: bool,
    /// Whether agents are kept inside `bounds`.
    pub bound_space: bool,
    /// Simulation domain, if bounded.
    pub bounds: Option<Aabb>,
}

impl Default for StepParams {
    fn default() -> Self {
        Self {
            time_step: 0.01,
            max_displacement: 3.0,
            run_mechanical_interactions: true,
            bound_space: false,
            bounds: None,
        }
    }
}

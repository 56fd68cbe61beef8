//! Tessera: a concurrent agent-based simulation engine with partitioned
//! storage and spatial indexing.
//!
//! This is the top-level facade crate that re-exports the public API from
//! all Tessera sub-crates. For most users, adding `tessera` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use tessera::prelude::*;
//!
//! #[derive(Clone)]
//! struct Walker {
//!     position: Vec3,
//!     spawned: bool,
//! }
//!
//! impl Agent for Walker {
//!     fn position(&self) -> Vec3 { self.position }
//!     fn set_position(&mut self, p: Vec3) { self.position = p; }
//!     fn diameter(&self) -> f64 { 1.0 }
//! }
//!
//! // Each walker with x < 2 spawns one neighbour a unit further along.
//! struct Spawn;
//! impl Behavior<Walker> for Spawn {
//!     fn name(&self) -> &str { "spawn" }
//!     fn run(&self, agent: &mut Walker, ctx: &mut ExecutionContext<'_, Walker>)
//!         -> Result<(), BehaviorError>
//!     {
//!         if !agent.spawned && agent.position.x < 2.0 {
//!             agent.spawned = true;
//!             let next = agent.position + Vec3::new(1.0, 0.0, 0.0);
//!             ctx.new_agent(Walker { position: next, spawned: false });
//!         }
//!         Ok(())
//!     }
//! }
//!
//! let mut sim = Simulation::new(SimulationConfig {
//!     threads: Some(2),
//!     ..SimulationConfig::default()
//! })
//! .unwrap();
//! sim.push(Walker { position: Vec3::ZERO, spawned: false });
//!
//! let mut scheduler = Scheduler::new(vec![Box::new(Spawn) as Box<dyn Behavior<Walker>>]).unwrap();
//! let report = scheduler.simulate(&mut sim, 3).unwrap();
//! assert_eq!(report.agents_created, 2);
//! assert_eq!(sim.agent_count(), 3);
//! assert_eq!(sim.step(), StepId(3));
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `tessera-core` | IDs, `Agent`, vector math, shared errors |
//! | [`store`] | `tessera-store` | Partitioned agent store, rebalancing, checkpoints |
//! | [`space`] | `tessera-space` | Uniform-grid neighbour index |
//! | [`behavior`] | `tessera-behavior` | `Behavior` trait, execution context, pipeline |
//! | [`behaviors`] | `tessera-behaviors` | Reference cell model behaviors |
//! | [`engine`] | `tessera-engine` | `Simulation`, `Scheduler`, config, metrics |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types, traits, and IDs (`tessera-core`).
pub use tessera_core as types;

/// Partitioned agent storage (`tessera-store`).
///
/// [`store::AgentStore`] owns agents in per-partition vectors with stable
/// [`types::AgentId`]s.
pub use tessera_store as store;

/// Spatial neighbour index (`tessera-space`).
pub use tessera_space as space;

/// Behaviors and the per-task execution context (`tessera-behavior`).
///
/// The [`behavior::Behavior`] trait is the main extension point for
/// user-defined simulation logic.
pub use tessera_behavior as behavior;

/// Reference behaviors (`tessera-behaviors`).
///
/// [`behaviors::SphericalCell`] with [`behaviors::BoundSpace`],
/// [`behaviors::GrowDivide`] and [`behaviors::MechanicalDisplacement`].
pub use tessera_behaviors as behaviors;

/// Simulation context and scheduler (`tessera-engine`).
pub use tessera_engine as engine;

/// Common imports for typical Tessera usage.
///
/// ```rust
/// use tessera::prelude::*;
/// ```
pub mod prelude {
    // Core types and traits
    pub use tessera_core::{Aabb, Agent, AgentHandle, AgentId, PartitionId, StepId, Vec3};

    // Errors
    pub use tessera_core::{BehaviorError, RegistryError};
    pub use tessera_engine::{ConfigError, StepError};
    pub use tessera_space::SpaceError;
    pub use tessera_store::StoreError;

    // Behaviors
    pub use tessera_behavior::{
        AgentEvent, AttachedBehavior, Behavior, ExecutionContext, HasBehaviors, RunAttached,
        StepParams,
    };

    // Engine
    pub use tessera_engine::{
        FieldCollaborator, Scheduler, SimulateReport, Simulation, SimulationConfig, StepMetrics,
    };
}

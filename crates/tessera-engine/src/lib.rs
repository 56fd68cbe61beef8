//! Simulation context and step scheduler for Tessera.
//!
//! [`Simulation`] owns everything one run needs: the agent store, the
//! spatial index, registered field collaborators, the worker pool and the
//! per-worker random generators. [`Scheduler`] owns the validated
//! behavior pipeline and advances a simulation step by step.
//!
//! ```text
//! Scheduler<A> ──simulate(&mut sim, n)──► Simulation<A>
//!   └── Pipeline<A>                         ├── AgentStore<A>
//!                                           ├── UniformGrid
//!                                           ├── FieldRegistry
//!                                           ├── rayon::ThreadPool
//!                                           └── RandomPool
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod checkpoint;
pub mod commit;
pub mod config;
pub mod error;
pub mod metrics;
pub mod registry;
pub mod scheduler;
pub mod simulation;

pub use checkpoint::{SimulationCheckpoint, SimulationRestoreReport};
pub use commit::{commit, CommitReport};
pub use config::{ConfigError, SimulationConfig};
pub use error::StepError;
pub use metrics::{SimulateReport, StepMetrics};
pub use registry::{AgentPositions, FieldCollaborator, FieldRegistry};
pub use scheduler::{Scheduler, SchedulerState};
pub use simulation::Simulation;

//! Behaviors, execution contexts and staging for Tessera simulations.
//!
//! A [`Behavior`] is a per-agent operation. During a step the scheduler
//! splits the store into `(partition, chunk)` tasks; each task gets one
//! [`ExecutionContext`] that gives behaviors read access to the tick-start
//! state and stages births and deaths for the single-threaded commit.
//!
//! Agents may also carry their own behaviors ([`AttachedBehaviors`]);
//! the [`RunAttached`] pipeline entry runs them.
//!
//! ```text
//! Pipeline<A>                     (validated behavior order)
//! └── run_chunk(view, chunk, rng) per task
//!     ├── ExecutionContext<'_, A>
//!     │   ├── StepView { store, grid, params, step }   shared, read-only
//!     │   ├── &mut ChaCha8Rng                           from RandomPool
//!     │   └── Staging<A> { new, removed }
//!     └── ChunkOutcome<A> { agents, staging, failures }
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod attached;
pub mod behavior;
pub mod context;
pub mod params;
pub mod pipeline;
pub mod random;
pub mod staging;

pub use attached::{
    AgentEvent, AttachedBehavior, AttachedBehaviors, EventMask, HasBehaviors, RunAttached,
};
pub use behavior::Behavior;
pub use context::{ExecutionContext, StepView};
pub use params::StepParams;
pub use pipeline::{BehaviorFailure, ChunkOutcome, Pipeline, PipelineError};
pub use random::{RandomPool, RngRestoreReport};
pub use staging::{StagedAgent, Staging, StagingMark};

//! Core types and traits for the Tessera agent simulation framework.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the fundamental abstractions used throughout the Tessera workspace:
//! identifiers, the [`Agent`] capability trait, 3D vector math and the
//! shared error types.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod agent;
pub mod error;
pub mod id;
pub mod math;

pub use agent::Agent;
pub use error::{BehaviorError, RegistryError};
pub use id::{AgentHandle, AgentId, IdAllocator, PartitionId, StepId, SubstanceId};
pub use math::{Aabb, Vec3};

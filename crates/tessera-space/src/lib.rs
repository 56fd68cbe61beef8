//! Spatial indexing for Tessera simulations.
//!
//! [`UniformGrid`] buckets agents into cubic cells and answers "which
//! agents lie within radius r of p" without scanning the whole
//! population. It is rebuilt from the
//! [`AgentStore`](tessera_store::AgentStore) at the start of every step
//! and never patched incrementally, so it always reflects the store as of
//! the last rebuild.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod grid;

pub use config::GridConfig;
pub use error::SpaceError;
pub use grid::{CellKey, GridEntry, UniformGrid};

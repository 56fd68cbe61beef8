//! Partitioned, identity-addressed agent storage for Tessera simulations.
//!
//! [`AgentStore`] owns every live agent. Agents are stored contiguously in
//! one `Vec` per partition (a locality domain) and addressed by permanent
//! [`AgentId`](tessera_core::AgentId)s through an identity map.
//!
//! # Architecture
//!
//! ```text
//! AgentStore<A>
//! ├── Partition × N
//! │   ├── agents: Vec<A>        (slot order)
//! │   └── ids:    Vec<AgentId>  (slot owners, parallel to agents)
//! ├── identity: IndexMap<AgentId, AgentHandle>
//! └── Arc<IdAllocator>          (shared with execution contexts)
//! ```
//!
//! # Phases
//!
//! Traversal (`for_each`, `for_each_parallel`, `map_parallel`) borrows the
//! store shared; structural mutation borrows it exclusively. During a
//! simulation step the store is only read, and staged mutations are
//! applied afterwards in a single-threaded commit.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod checkpoint;
pub mod error;
pub mod rebalance;
pub mod store;

pub use checkpoint::{RestoreReport, StoreCheckpoint};
pub use error::StoreError;
pub use rebalance::{morton_key, RebalanceReport};
pub use store::{AgentStore, ChunkView};

//! Strongly-typed identifiers and the [`IdAllocator`].

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Permanent logical identity of an agent.
///
/// Assigned once from an [`IdAllocator`] and never reused within a
/// simulation, even after the agent is removed. Survives every storage
/// relocation, unlike [`AgentHandle`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AgentId(pub u64);

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for AgentId {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

/// Index of a storage partition (one locality domain).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PartitionId(pub u16);

impl PartitionId {
    /// The partition used when the caller does not choose one.
    pub const DEFAULT: PartitionId = PartitionId(0);

    /// The partition index as a `usize`, for indexing partition vectors.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for PartitionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u16> for PartitionId {
    fn from(v: u16) -> Self {
        Self(v)
    }
}

/// Current storage location of an agent: `{partition, slot}`.
///
/// Handles are transient. Removing *another* agent from the same partition
/// may move the partition's last agent into the freed slot, so a handle
/// must always be re-resolved from an [`AgentId`] after any removal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[must_use]
pub struct AgentHandle {
    /// Partition holding the agent.
    pub partition: PartitionId,
    /// Slot index within the partition.
    pub slot: u32,
}

impl AgentHandle {
    /// Create a handle.
    pub fn new(partition: PartitionId, slot: u32) -> Self {
        Self { partition, slot }
    }

    /// The slot as a `usize`.
    pub fn slot_index(self) -> usize {
        self.slot as usize
    }
}

impl fmt::Display for AgentHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AgentHandle(partition={}, slot={})", self.partition, self.slot)
    }
}

/// Monotonically increasing step counter.
///
/// Incremented each time the simulation completes one step.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StepId(pub u64);

impl StepId {
    /// The step following this one.
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for StepId {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

/// Identifies a registered field collaborator (e.g. a diffusion grid for
/// one substance).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubstanceId(pub u32);

impl fmt::Display for SubstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for SubstanceId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Issues [`AgentId`]s for one simulation.
///
/// Shared (via `Arc`) between the agent store and every execution context
/// of a step, so ids handed out during the parallel phase are final.
/// Thread-safe; ids are unique and strictly increasing per allocator.
#[derive(Debug)]
pub struct IdAllocator {
    next: AtomicU64,
}

impl IdAllocator {
    /// Create an allocator whose first id is `AgentId(0)`.
    pub fn new() -> Self {
        Self::starting_at(0)
    }

    /// Create an allocator whose first id is `AgentId(first)`.
    pub fn starting_at(first: u64) -> Self {
        Self {
            next: AtomicU64::new(first),
        }
    }

    /// Allocate a fresh id that has never been returned by this allocator.
    pub fn allocate(&self) -> AgentId {
        AgentId(self.next.fetch_add(1, Ordering::Relaxed))
    }

    /// The id the next call to [`allocate`](Self::allocate) will return.
    pub fn peek(&self) -> u64 {
        self.next.load(Ordering::Relaxed)
    }

    /// Ensure no id below `floor` is ever issued again.
    ///
    /// Used after restoring agents whose ids were issued by another
    /// allocator. Never moves the counter backwards.
    pub fn advance_to(&self, floor: u64) {
        self.next.fetch_max(floor, Ordering::Relaxed);
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

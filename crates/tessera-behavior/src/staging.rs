//! Per-context staging of births and deaths.

use indexmap::IndexSet;
use tessera_core::{AgentId, PartitionId};

/// An agent created during a step, awaiting commit.
#[derive(Clone, Debug)]
pub struct StagedAgent<A> {
    /// Final id, allocated when the agent was staged.
    pub id: AgentId,
    /// Partition the agent will be inserted into.
    pub partition: PartitionId,
    /// The new agent.
    pub agent: A,
}

/// Position in a [`Staging`] to roll back to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StagingMark {
    new_len: usize,
    removed_len: usize,
}

/// Structural mutations staged by one execution context.
///
/// Removals are a set in first-marked order, so marking an id twice is
/// harmless. New agents keep their creation order.
#[derive(Clone, Debug)]
pub struct Staging<A> {
    new: Vec<StagedAgent<A>>,
    removed: IndexSet<AgentId>,
}

impl<A> Default for Staging<A> {
    fn default() -> Self {
        Self {
            new: Vec::new(),
            removed: IndexSet::new(),
        }
    }
}

impl<A> Staging<A> {
    /// Stage a new agent.
    pub fn push_new(&mut self, staged: StagedAgent<A>) {
        self.new.push(staged);
    }

    /// Stage a removal. Returns `false` if `id` was already staged.
    pub fn mark_removed(&mut self, id: AgentId) -> bool {
        self.removed.insert(id)
    }

    /// Whether `id` is staged for removal.
    pub fn is_removed(&self, id: AgentId) -> bool {
        self.removed.contains(&id)
    }

    /// Staged new agents in creation order.
    pub fn new_agents(&self) -> &[StagedAgent<A>] {
        &self.new
    }

    /// Staged removals in first-marked order.
    pub fn removals(&self) -> impl Iterator<Item = AgentId> + '_ {
        self.removed.iter().copied()
    }

    /// Whether nothing is staged.
    pub fn is_empty(&self) -> bool {
        self.new.is_empty() && self.removed.is_empty()
    }

    /// Current position, for a later [`rollback`](Self::rollback).
    pub fn mark(&self) -> StagingMark {
        StagingMark {
            new_len: self.new.len(),
            removed_len: self.removed.len(),
        }
    }

    /// Discard everything staged after `mark`.
    pub fn rollback(&mut self, mark: StagingMark) {
        self.new.truncate(mark.new_len);
        self.removed.truncate(mark.removed_len);
    }

    /// Split into `(new agents, removals)`.
    pub fn into_parts(self) -> (Vec<StagedAgent<A>>, IndexSet<AgentId>) {
        (self.new, self.removed)
    }
}

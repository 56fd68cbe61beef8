//! The partitioned, identity-addressed [`AgentStore`].

use std::sync::Arc;

use indexmap::IndexMap;
use rayon::prelude::*;
use tessera_core::{Agent, AgentHandle, AgentId, IdAllocator, PartitionId};

use crate::error::StoreError;

/// One storage shard. `agents[i]` is owned by `ids[i]`.
#[derive(Clone, Debug)]
pub(crate) struct Partition<A> {
    pub(crate) agents: Vec<A>,
    pub(crate) ids: Vec<AgentId>,
}

impl<A> Partition<A> {
    pub(crate) fn new() -> Self {
        Self {
            agents: Vec::new(),
            ids: Vec::new(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.agents.len()
    }
}

/// A read-only view of one chunk of one partition, handed to the closure
/// of [`AgentStore::map_parallel`].
#[derive(Debug)]
pub struct ChunkView<'a, A> {
    /// Partition the chunk belongs to.
    pub partition: PartitionId,
    /// Index of the chunk within its partition.
    pub chunk: usize,
    /// Slot of `agents[0]` within the partition.
    pub first_slot: usize,
    /// The agents of this chunk, in slot order.
    pub agents: &'a [A],
    /// Owner ids, parallel to `agents`.
    pub ids: &'a [AgentId],
}

impl<'a, A> ChunkView<'a, A> {
    /// Iterate `(id, handle, agent)` over the chunk in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (AgentId, AgentHandle, &'a A)> + '_ {
        let partition = self.partition;
        let first = self.first_slot;
        self.ids
            .iter()
            .zip(self.agents.iter())
            .enumerate()
            .map(move |(i, (&id, agent))| {
                (id, AgentHandle::new(partition, (first + i) as u32), agent)
            })
    }
}

/// Authoritative owner of every live agent.
///
/// Agents live contiguously in one `Vec` per partition. Each agent is
/// addressed by a permanent [`AgentId`]; the identity map translates ids
/// to their current [`AgentHandle`]. Removal is swap-with-last, so the
/// partition's last agent moves into the freed slot and its identity entry
/// is re-pointed. Handles must therefore be re-resolved after any removal.
///
/// Structural mutation (`insert`, `remove`, `rebalance_partitions`, ...)
/// takes `&mut self`; traversal takes `&self`. A callback can never change
/// the store's shape mid-traversal.
///
/// ```
/// use tessera_core::{Agent, PartitionId, Vec3};
/// use tessera_store::AgentStore;
///
/// #[derive(Clone)]
/// struct Dot(Vec3);
/// impl Agent for Dot {
///     fn position(&self) -> Vec3 { self.0 }
///     fn set_position(&mut self, p: Vec3) { self.0 = p; }
///     fn diameter(&self) -> f64 { 1.0 }
/// }
///
/// let mut store = AgentStore::new(2).unwrap();
/// let a = store.push(Dot(Vec3::ZERO));
/// let b = store.insert(Dot(Vec3::new(1.0, 0.0, 0.0)), PartitionId(1)).unwrap();
/// assert_eq!(store.count(None), 2);
/// store.remove(a).unwrap();
/// assert!(store.get(a).is_err());
/// assert!(store.get(b).is_ok());
/// ```
#[derive(Debug)]
pub struct AgentStore<A> {
    pub(crate) partitions: Vec<Partition<A>>,
    pub(crate) identity: IndexMap<AgentId, AgentHandle>,
    pub(crate) allocator: Arc<IdAllocator>,
}

impl<A: Agent> AgentStore<A> {
    /// Create an empty store with `partition_count` partitions.
    ///
    /// # Errors
    ///
    /// `InvariantViolation` if `partition_count` is zero or does not fit
    /// a [`PartitionId`].
    pub fn new(partition_count: usize) -> Result<Self, StoreError> {
        Self::with_allocator(partition_count, Arc::new(IdAllocator::new()))
    }

    /// Create an empty store drawing ids from an existing allocator.
    pub fn with_allocator(
        partition_count: usize,
        allocator: Arc<IdAllocator>,
    ) -> Result<Self, StoreError> {
        check_partition_count(partition_count)?;
        Ok(Self {
            partitions: (0..partition_count).map(|_| Partition::new()).collect(),
            identity: IndexMap::new(),
            allocator,
        })
    }

    /// The id allocator shared with every execution context of this store.
    pub fn allocator(&self) -> &Arc<IdAllocator> {
        &self.allocator
    }

    // ── Structural mutation ─────────────────────────────────────

    /// Append `agent` to `partition` under a fresh id.
    pub fn insert(&mut self, agent: A, partition: PartitionId) -> Result<AgentId, StoreError> {
        self.check_partition(partition)?;
        let id = self.allocator.allocate();
        self.append(id, agent, partition);
        Ok(id)
    }

    /// Append `agent` to the default partition.
    pub fn push(&mut self, agent: A) -> AgentId {
        let id = self.allocator.allocate();
        self.append(id, agent, PartitionId::DEFAULT);
        id
    }

    /// Append `agent` under an id allocated elsewhere (by an execution
    /// context during a step).
    ///
    /// # Errors
    ///
    /// `PartitionOutOfRange` for an unknown partition; `InvariantViolation`
    /// if `id` is already live.
    pub fn insert_with_id(
        &mut self,
        id: AgentId,
        agent: A,
        partition: PartitionId,
    ) -> Result<(), StoreError> {
        self.check_partition(partition)?;
        if self.identity.contains_key(&id) {
            return Err(StoreError::invariant(format!(
                "agent {id} inserted twice"
            )));
        }
        self.allocator.advance_to(id.0 + 1);
        self.append(id, agent, partition);
        Ok(())
    }

    fn append(&mut self, id: AgentId, agent: A, partition: PartitionId) {
        let part = &mut self.partitions[partition.index()];
        let slot = part.len() as u32;
        part.agents.push(agent);
        part.ids.push(id);
        self.identity.insert(id, AgentHandle::new(partition, slot));
    }

    /// Remove the agent with `id`, returning it.
    ///
    /// The partition's last agent is swapped into the freed slot and its
    /// identity entry updated.
    ///
    /// # Errors
    ///
    /// `NotFound` if no live agent has this id.
    pub fn remove(&mut self, id: AgentId) -> Result<A, StoreError> {
        let handle = self
            .identity
            .swap_remove(&id)
            .ok_or(StoreError::NotFound { id })?;
        let slot = handle.slot_index();
        let part = &mut self.partitions[handle.partition.index()];
        let agent = part.agents.swap_remove(slot);
        part.ids.swap_remove(slot);
        if let Some(&moved) = part.ids.get(slot) {
            if let Some(h) = self.identity.get_mut(&moved) {
                h.slot = slot as u32;
            }
        }
        Ok(agent)
    }

    /// Replace the agents of `partition` in slot order.
    ///
    /// Ids and identity entries are untouched; only agent state changes.
    ///
    /// # Errors
    ///
    /// `InvariantViolation` if `agents.len()` differs from the partition's
    /// current length.
    pub fn replace_partition_agents(
        &mut self,
        partition: PartitionId,
        agents: Vec<A>,
    ) -> Result<(), StoreError> {
        self.check_partition(partition)?;
        let part = &mut self.partitions[partition.index()];
        if agents.len() != part.len() {
            return Err(StoreError::invariant(format!(
                "partition {partition} holds {} agents, replacement has {}",
                part.len(),
                agents.len()
            )));
        }
        part.agents = agents;
        Ok(())
    }

    /// Pre-size every partition and the identity map for `capacity` agents.
    pub fn reserve(&mut self, capacity: usize) {
        self.identity.reserve(capacity);
        for part in &mut self.partitions {
            part.agents.reserve(capacity);
            part.ids.reserve(capacity);
        }
    }

    /// Remove every agent. The allocator is not reset, so ids are never
    /// reissued.
    pub fn clear(&mut self) {
        for part in &mut self.partitions {
            part.agents.clear();
            part.ids.clear();
        }
        self.identity.clear();
    }

    // ── Lookup ──────────────────────────────────────────────────

    /// The agent with `id`.
    pub fn get(&self, id: AgentId) -> Result<&A, StoreError> {
        let h = self.handle_of(id)?;
        Ok(&self.partitions[h.partition.index()].agents[h.slot_index()])
    }

    /// Mutable access to the agent with `id`.
    pub fn get_mut(&mut self, id: AgentId) -> Result<&mut A, StoreError> {
        let h = self.handle_of(id)?;
        Ok(&mut self.partitions[h.partition.index()].agents[h.slot_index()])
    }

    /// The agent currently at `handle`, if the slot is occupied.
    pub fn get_by_handle(&self, handle: AgentHandle) -> Option<&A> {
        self.partitions
            .get(handle.partition.index())?
            .agents
            .get(handle.slot_index())
    }

    /// Current location of `id`.
    pub fn handle_of(&self, id: AgentId) -> Result<AgentHandle, StoreError> {
        self.identity
            .get(&id)
            .copied()
            .ok_or(StoreError::NotFound { id })
    }

    /// Whether `id` is live.
    pub fn contains(&self, id: AgentId) -> bool {
        self.identity.contains_key(&id)
    }

    /// Number of agents in `partition`, or in the whole store for `None`.
    /// An out-of-range partition holds no agents.
    pub fn count(&self, partition: Option<PartitionId>) -> usize {
        match partition {
            Some(p) => self.partitions.get(p.index()).map_or(0, Partition::len),
            None => self.identity.len(),
        }
    }

    /// Number of partitions.
    pub fn partition_count(&self) -> usize {
        self.partitions.len()
    }

    /// Whether the store holds no agents.
    pub fn is_empty(&self) -> bool {
        self.identity.is_empty()
    }

    /// The agents of `partition` in slot order.
    pub fn partition_agents(&self, partition: PartitionId) -> Option<&[A]> {
        self.partitions
            .get(partition.index())
            .map(|p| p.agents.as_slice())
    }

    /// The owner ids of `partition` in slot order.
    pub fn partition_ids(&self, partition: PartitionId) -> Option<&[AgentId]> {
        self.partitions
            .get(partition.index())
            .map(|p| p.ids.as_slice())
    }

    /// Live ids, partition by partition in slot order.
    pub fn ids(&self) -> impl Iterator<Item = AgentId> + '_ {
        self.partitions.iter().flat_map(|p| p.ids.iter().copied())
    }

    /// `(id, agent)` pairs, partition by partition in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (AgentId, &A)> + '_ {
        self.partitions
            .iter()
            .flat_map(|p| p.ids.iter().copied().zip(p.agents.iter()))
    }

    // ── Traversal ───────────────────────────────────────────────

    /// Visit every agent exactly once, sequentially.
    pub fn for_each(&self, mut f: impl FnMut(AgentId, &A)) {
        for (id, agent) in self.iter() {
            f(id, agent);
        }
    }

    /// Visit every agent exactly once on the current rayon pool.
    ///
    /// Work is split first by partition, then into chunks of `chunk_size`
    /// agents consumed by work stealing. A `chunk_size` of zero is treated
    /// as one.
    pub fn for_each_parallel<F>(&self, chunk_size: usize, f: F)
    where
        F: Fn(AgentId, &A) + Sync,
    {
        let chunk = chunk_size.max(1);
        self.partitions.par_iter().for_each(|part| {
            part.ids
                .par_chunks(chunk)
                .zip(part.agents.par_chunks(chunk))
                .for_each(|(ids, agents)| {
                    for (&id, agent) in ids.iter().zip(agents) {
                        f(id, agent);
                    }
                });
        });
    }

    /// Map every `(partition, chunk)` of the store in parallel.
    ///
    /// Returns one `Vec` per partition holding each chunk's output in chunk
    /// order, independent of scheduling. Empty partitions yield an empty
    /// `Vec`.
    pub fn map_parallel<T, F>(&self, chunk_size: usize, f: F) -> Vec<Vec<T>>
    where
        T: Send,
        F: Fn(ChunkView<'_, A>) -> T + Sync,
    {
        let chunk = chunk_size.max(1);
        self.partitions
            .par_iter()
            .enumerate()
            .map(|(pi, part)| {
                let partition = PartitionId(pi as u16);
                part.ids
                    .par_chunks(chunk)
                    .zip(part.agents.par_chunks(chunk))
                    .enumerate()
                    .map(|(ci, (ids, agents))| {
                        f(ChunkView {
                            partition,
                            chunk: ci,
                            first_slot: ci * chunk,
                            agents,
                            ids,
                        })
                    })
                    .collect::<Vec<T>>()
            })
            .collect()
    }

    pub(crate) fn check_partition(&self, partition: PartitionId) -> Result<(), StoreError> {
        if partition.index() < self.partitions.len() {
            Ok(())
        } else {
            Err(StoreError::PartitionOutOfRange {
                partition,
                partition_count: self.partitions.len(),
            })
        }
    }

    /// Rebuild the identity map from the partitions' owner ids.
    pub(crate) fn rebuild_identity(&mut self) {
        self.identity.clear();
        for (pi, part) in self.partitions.iter().enumerate() {
            for (slot, &id) in part.ids.iter().enumerate() {
                self.identity
                    .insert(id, AgentHandle::new(PartitionId(pi as u16), slot as u32));
            }
        }
    }
}

pub(crate) fn check_partition_count(count: usize) -> Result<(), StoreError> {
    if count == 0 || count > u16::MAX as usize + 1 {
        return Err(StoreError::invariant(format!(
            "partition count {count} outside 1..={}",
            u16::MAX as usize + 1
        )));
    }
    Ok(())
}

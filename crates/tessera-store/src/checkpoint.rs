//! Store snapshots and restore, including restore into a different
//! partition count.

use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};
use tessera_core::{Agent, AgentHandle, AgentId, IdAllocator, PartitionId};

use crate::error::StoreError;
use crate::store::{check_partition_count, AgentStore, Partition};

/// Serialized form of an [`AgentStore`]: partition count, per-partition
/// agent sequence, identity map and the allocator's next id.
#[derive(Clone, Debug)]
pub struct StoreCheckpoint<A> {
    /// Number of partitions at capture time.
    pub partition_count: usize,
    /// Agents of each partition in slot order.
    pub partitions: Vec<Vec<A>>,
    /// Identity map at capture time.
    pub identity: Vec<(AgentId, AgentHandle)>,
    /// Next id the allocator would have issued.
    pub next_id: u64,
}

/// Outcome of [`AgentStore::restore`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RestoreReport {
    /// Partition count recorded in the checkpoint.
    pub source_partitions: usize,
    /// Partition count of the restored store.
    pub target_partitions: usize,
    /// Agents restored.
    pub agents: usize,
    /// `true` when the partition counts differed and agents were
    /// redistributed, so slot positions and locality were not preserved.
    pub lossy: bool,
}

impl<A: Agent> AgentStore<A> {
    /// Capture the store's full state.
    pub fn checkpoint(&self) -> StoreCheckpoint<A> {
        StoreCheckpoint {
            partition_count: self.partitions.len(),
            partitions: self.partitions.iter().map(|p| p.agents.clone()).collect(),
            identity: self.identity.iter().map(|(&id, &h)| (id, h)).collect(),
            next_id: self.allocator.peek(),
        }
    }

    /// Rebuild a store from `checkpoint` with `target_partitions`
    /// partitions.
    ///
    /// With the same partition count the store is restored verbatim. With
    /// a different count, source partition `i` is appended to target
    /// partition `i % target_partitions`; this is lossy but not an error.
    ///
    /// # Errors
    ///
    /// `InvariantViolation` if the checkpoint is internally inconsistent:
    /// its partition count disagrees with its partition sequence, its
    /// identity map does not cover every slot exactly once, or its next id
    /// would reissue a live id. Also if `target_partitions` is invalid.
    pub fn restore(
        checkpoint: StoreCheckpoint<A>,
        target_partitions: usize,
    ) -> Result<(Self, RestoreReport), StoreError> {
        check_partition_count(target_partitions)?;
        let owners = match validate(&checkpoint) {
            Ok(owners) => owners,
            Err(e) => {
                tracing::error!(error = %e, "rejecting inconsistent store checkpoint");
                return Err(e);
            }
        };

        let source_partitions = checkpoint.partition_count;
        let agents: usize = checkpoint.partitions.iter().map(Vec::len).sum();
        let lossy = source_partitions != target_partitions;

        let mut partitions: Vec<Partition<A>> =
            (0..target_partitions).map(|_| Partition::new()).collect();
        for (pi, (seq, ids)) in checkpoint.partitions.into_iter().zip(owners).enumerate() {
            let target = &mut partitions[pi % target_partitions];
            target.agents.extend(seq);
            target.ids.extend(ids);
        }

        let mut store = Self {
            partitions,
            identity: IndexMap::with_capacity(agents),
            allocator: Arc::new(IdAllocator::starting_at(checkpoint.next_id)),
        };
        if lossy {
            store.rebuild_identity();
            tracing::warn!(
                source_partitions,
                target_partitions,
                agents,
                "restored store into a different partition count; slot layout not preserved"
            );
        } else {
            store.identity = checkpoint.identity.into_iter().collect();
        }
        tracing::info!(agents, partitions = target_partitions, "restored agent store");

        Ok((
            store,
            RestoreReport {
                source_partitions,
                target_partitions,
                agents,
                lossy,
            },
        ))
    }
}

/// Check internal consistency; returns slot owners per partition.
fn validate<A>(cp: &StoreCheckpoint<A>) -> Result<Vec<Vec<AgentId>>, StoreError> {
    if cp.partition_count != cp.partitions.len() {
        return Err(StoreError::invariant(format!(
            "checkpoint declares {} partitions but carries {}",
            cp.partition_count,
            cp.partitions.len()
        )));
    }
    check_partition_count(cp.partition_count)?;

    let mut owners: Vec<Vec<Option<AgentId>>> =
        cp.partitions.iter().map(|p| vec![None; p.len()]).collect();
    let mut seen = IndexSet::with_capacity(cp.identity.len());
    let mut max_id = None;
    for &(id, handle) in &cp.identity {
        if !seen.insert(id) {
            return Err(StoreError::invariant(format!(
                "checkpoint lists agent {id} twice"
            )));
        }
        let slot = owners
            .get_mut(handle.partition.index())
            .and_then(|p| p.get_mut(handle.slot_index()))
            .ok_or_else(|| {
                StoreError::invariant(format!("checkpoint maps agent {id} to missing {handle}"))
            })?;
        if let Some(other) = slot.replace(id) {
            return Err(StoreError::invariant(format!(
                "agents {other} and {id} share {handle}"
            )));
        }
        max_id = max_id.max(Some(id.0));
    }
    if let Some(max) = max_id {
        if cp.next_id <= max {
            return Err(StoreError::invariant(format!(
                "checkpoint next id {} would reissue agent {max}",
                cp.next_id
            )));
        }
    }

    owners
        .into_iter()
        .enumerate()
        .map(|(pi, slots)| {
            slots
                .into_iter()
                .enumerate()
                .map(|(slot, owner)| {
                    owner.ok_or_else(|| {
                        StoreError::invariant(format!(
                            "slot {slot} of partition {} has no identity entry",
                            PartitionId(pi as u16)
                        ))
                    })
                })
                .collect::<Result<Vec<_>, _>>()
        })
        .collect()
}

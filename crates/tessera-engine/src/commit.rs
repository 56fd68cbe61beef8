//! Single-threaded commit of everything the compute phase produced.

use indexmap::IndexSet;
use tessera_behavior::ChunkOutcome;
use tessera_core::{Agent, AgentId, PartitionId};
use tessera_store::AgentStore;

use crate::error::StepError;

/// What one commit applied.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CommitReport {
    /// Staged agents inserted.
    pub created: u64,
    /// Agents removed.
    pub removed: u64,
    /// Removal requests for ids that were not live.
    pub duplicate_removals: u64,
    /// Agents whose update was skipped.
    pub failures: u64,
}

/// Apply the outcomes of one step to `store`.
///
/// `outcomes` holds one `Vec` per partition with each chunk's outcome in
/// chunk order, as returned by
/// [`AgentStore::map_parallel`](tessera_store::AgentStore::map_parallel).
///
/// Three passes, each in `(partition, chunk)` order:
///
/// 1. write back every partition's next agent states;
/// 2. apply all staged removals (ids that are no longer live are counted
///    as duplicates and skipped);
/// 3. insert all staged new agents under their pre-allocated ids.
///
/// A new agent that was itself marked removed in the same step is dropped
/// without being inserted.
///
/// # Errors
///
/// `Store(InvariantViolation)` if a partition's write-back does not match
/// its length or a staged id is already live. Both are fatal.
pub fn commit<A: Agent>(
    store: &mut AgentStore<A>,
    outcomes: Vec<Vec<ChunkOutcome<A>>>,
) -> Result<CommitReport, StepError> {
    let mut report = CommitReport::default();
    let mut removals: IndexSet<AgentId> = IndexSet::new();
    let mut births = Vec::new();

    // 1. Write back agent state.
    for (pi, chunks) in outcomes.into_iter().enumerate() {
        let partition = PartitionId(pi as u16);
        let mut agents = Vec::with_capacity(store.count(Some(partition)));
        for outcome in chunks {
            for failure in &outcome.failures {
                tracing::warn!(
                    agent = %failure.agent,
                    behavior = %failure.behavior,
                    error = %failure.error,
                    "behavior failed, agent skipped for this step"
                );
            }
            report.failures += outcome.failures.len() as u64;
            agents.extend(outcome.agents);
            let (new, removed) = outcome.staging.into_parts();
            births.extend(new);
            // Ids marked by two contexts collapse here and count once.
            removals.extend(removed);
        }
        if let Err(e) = store.replace_partition_agents(partition, agents) {
            tracing::error!(error = %e, "commit write-back failed");
            return Err(e.into());
        }
    }

    // 2. Removals.
    let born: IndexSet<AgentId> = births.iter().map(|b| b.id).collect();
    let mut stillborn = IndexSet::new();
    for &id in &removals {
        match store.remove(id) {
            Ok(_) => report.removed += 1,
            Err(_) if born.contains(&id) => {
                stillborn.insert(id);
            }
            Err(_) => report.duplicate_removals += 1,
        }
    }
    if report.duplicate_removals > 0 {
        tracing::warn!(
            count = report.duplicate_removals,
            "removal requested for agents that were not live"
        );
    }

    // 3. Insertions.
    for staged in births {
        if stillborn.contains(&staged.id) {
            continue;
        }
        if let Err(e) = store.insert_with_id(staged.id, staged.agent, staged.partition) {
            tracing::error!(error = %e, agent = %staged.id, "commit insertion failed");
            return Err(e.into());
        }
        report.created += 1;
    }

    Ok(report)
}

//! Whole-simulation snapshots.

use rand_chacha::ChaCha8Rng;
use tessera_behavior::RngRestoreReport;
use tessera_core::StepId;
use tessera_store::{RestoreReport, StoreCheckpoint};

/// Everything needed to resume a simulation: the step counter, the agent
/// store and every worker's random generator state.
#[derive(Clone, Debug)]
pub struct SimulationCheckpoint<A> {
    /// Step counter at capture time.
    pub step: StepId,
    /// The agent store.
    pub store: StoreCheckpoint<A>,
    /// Generator states in slot order (workers, then the outside slot).
    pub rng_states: Vec<ChaCha8Rng>,
}

/// Outcome of [`Simulation::restore`](crate::Simulation::restore).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SimulationRestoreReport {
    /// Store restore outcome.
    pub store: RestoreReport,
    /// Generator restore outcome.
    pub rng: RngRestoreReport,
}

impl SimulationRestoreReport {
    /// Whether any part of the restore could not be reproduced exactly.
    pub fn is_lossy(&self) -> bool {
        self.store.lossy || self.rng.lossy
    }
}

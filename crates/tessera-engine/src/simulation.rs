//! The [`Simulation`] context value.

use std::fmt;

use tessera_behavior::{RandomPool, StepParams, StepView};
use tessera_core::{Agent, AgentId, PartitionId, StepId};
use tessera_space::UniformGrid;
use tessera_store::{AgentStore, StoreError};

use crate::checkpoint::{SimulationCheckpoint, SimulationRestoreReport};
use crate::config::{ConfigError, SimulationConfig};
use crate::error::StepError;
use crate::registry::FieldRegistry;

/// Owns all state of one simulation: configuration, agent store, spatial
/// index, field collaborators, worker pool, random generators and the
/// step counter.
///
/// There is no global "active" simulation; this value is passed
/// explicitly to the [`Scheduler`](crate::Scheduler), which hands
/// read-only views of it to behaviors.
pub struct Simulation<A> {
    config: SimulationConfig,
    params: StepParams,
    pub(crate) store: AgentStore<A>,
    pub(crate) grid: UniformGrid,
    pub(crate) fields: FieldRegistry,
    pub(crate) pool: rayon::ThreadPool,
    pub(crate) random: RandomPool,
    pub(crate) step: StepId,
}

impl<A: Agent> Simulation<A> {
    /// Validate `config` and build an empty simulation.
    ///
    /// # Errors
    ///
    /// Any [`ConfigError`] from validation, or `ThreadPool` if the worker
    /// pool cannot be spawned.
    pub fn new(config: SimulationConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let threads = config.resolved_threads();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("tessera-worker-{i}"))
            .build()
            .map_err(|e| ConfigError::ThreadPool {
                reason: e.to_string(),
            })?;
        let store = AgentStore::new(config.partitions).map_err(|_| {
            ConfigError::InvalidPartitions {
                value: config.partitions,
            }
        })?;
        let grid = UniformGrid::new(config.grid_config()).map_err(|_| {
            ConfigError::InvalidCellSize {
                setting: "min_cell_size",
                value: config.min_cell_size,
            }
        })?;

        tracing::info!(
            threads,
            partitions = config.partitions,
            chunk_size = config.chunk_size,
            seed = config.seed,
            "simulation created"
        );

        Ok(Self {
            params: config.step_params(),
            random: RandomPool::new(config.seed, threads),
            config,
            store,
            grid,
            fields: FieldRegistry::new(),
            pool,
            step: StepId::default(),
        })
    }

    // ── Accessors ───────────────────────────────────────────────

    /// The validated configuration.
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Physical parameters handed to behaviors.
    pub fn params(&self) -> &StepParams {
        &self.params
    }

    /// Number of completed steps.
    pub fn step(&self) -> StepId {
        self.step
    }

    /// Worker threads in the pool.
    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// The agent store.
    pub fn store(&self) -> &AgentStore<A> {
        &self.store
    }

    /// Mutable store access between steps.
    pub fn store_mut(&mut self) -> &mut AgentStore<A> {
        &mut self.store
    }

    /// The spatial index as of the last rebuild.
    pub fn grid(&self) -> &UniformGrid {
        &self.grid
    }

    /// Registered field collaborators.
    pub fn fields(&self) -> &FieldRegistry {
        &self.fields
    }

    /// Mutable access to the field registry.
    pub fn fields_mut(&mut self) -> &mut FieldRegistry {
        &mut self.fields
    }

    /// The per-worker random generators.
    pub fn random(&self) -> &RandomPool {
        &self.random
    }

    /// Live agent count.
    pub fn agent_count(&self) -> usize {
        self.store.count(None)
    }

    /// Read-only view with the current index, for queries between steps.
    pub fn view(&self) -> StepView<'_, A> {
        StepView {
            store: &self.store,
            grid: &self.grid,
            params: &self.params,
            step: self.step,
        }
    }

    // ── Population ──────────────────────────────────────────────

    /// Add an agent to the default partition.
    pub fn push(&mut self, agent: A) -> AgentId {
        self.store.push(agent)
    }

    /// Add an agent to `partition`.
    pub fn insert(&mut self, agent: A, partition: PartitionId) -> Result<AgentId, StoreError> {
        self.store.insert(agent, partition)
    }

    // ── Index ───────────────────────────────────────────────────

    /// Rebuild the spatial index from the current store on the worker pool.
    pub fn rebuild_index(&mut self) -> Result<(), StepError> {
        let Self {
            pool, grid, store, ..
        } = self;
        pool.install(|| grid.rebuild(store))?;
        Ok(())
    }

    /// Ids within `radius` of `id`, sorted, using the last-built index.
    pub fn neighbors(&self, id: AgentId, radius: f64) -> Result<Vec<AgentId>, StepError> {
        Ok(self.grid.neighbors(id, radius)?)
    }

    // ── Checkpoint ──────────────────────────────────────────────

    /// Capture the step counter, store and generator states.
    pub fn checkpoint(&self) -> SimulationCheckpoint<A> {
        SimulationCheckpoint {
            step: self.step,
            store: self.store.checkpoint(),
            rng_states: self.random.states(),
        }
    }

    /// Replace this simulation's state with `checkpoint`.
    ///
    /// The store is restored into this simulation's configured partition
    /// count and the generators into its worker count. A mismatch on
    /// either is lossy and logged, not an error. Field collaborators are
    /// not part of the checkpoint and stay registered.
    ///
    /// # Errors
    ///
    /// `Store(InvariantViolation)` for an inconsistent checkpoint, or
    /// `Space` if the restored agents cannot be indexed. In both cases the
    /// simulation is left unchanged.
    pub fn restore(
        &mut self,
        checkpoint: SimulationCheckpoint<A>,
    ) -> Result<SimulationRestoreReport, StepError> {
        let (store, store_report) =
            AgentStore::restore(checkpoint.store, self.config.partitions)?;
        let mut grid = UniformGrid::new(*self.grid.config())?;
        self.pool.install(|| grid.rebuild(&store))?;

        let rng_report = self.random.restore(&checkpoint.rng_states);
        if rng_report.lossy {
            tracing::warn!(
                checkpoint = checkpoint.rng_states.len(),
                current = self.random.workers() + 1,
                "generator count differs, draws will not match the original run"
            );
        }
        self.store = store;
        self.grid = grid;
        self.step = checkpoint.step;

        tracing::info!(
            step = %self.step,
            agents = store_report.agents,
            lossy = store_report.lossy || rng_report.lossy,
            "simulation restored"
        );
        Ok(SimulationRestoreReport {
            store: store_report,
            rng: rng_report,
        })
    }
}

impl<A> fmt::Debug for Simulation<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Simulation")
            .field("step", &self.step)
            .field("partitions", &self.config.partitions)
            .field("threads", &self.pool.current_num_threads())
            .field("fields", &self.fields)
            .finish_non_exhaustive()
    }
}

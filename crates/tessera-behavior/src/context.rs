//! The per-task [`ExecutionContext`] handed to behaviors.

use rand_chacha::ChaCha8Rng;
use tessera_core::{Agent, AgentHandle, AgentId, PartitionId, StepId, Vec3};
use tessera_space::{SpaceError, UniformGrid};
use tessera_store::{AgentStore, StoreError};

use crate::params::StepParams;
use crate::staging::{StagedAgent, Staging, StagingMark};

/// Shared, read-only state of the simulation during the compute phase.
#[derive(Debug)]
pub struct StepView<'a, A> {
    /// Agents as of the start of the step.
    pub store: &'a AgentStore<A>,
    /// Spatial index rebuilt at the start of the step.
    pub grid: &'a UniformGrid,
    /// Physical parameters.
    pub params: &'a StepParams,
    /// The step being computed.
    pub step: StepId,
}

impl<A> Clone for StepView<'_, A> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<A> Copy for StepView<'_, A> {}

/// The only channel through which a behavior creates agents, removes
/// agents or looks at other agents.
///
/// One context serves one `(partition, chunk)` task and is reused for
/// every agent of that chunk. Births and deaths are staged and applied
/// by the scheduler's single-threaded commit after every task finishes.
///
/// # Visibility
///
/// All reads see the tick-start state. A staged removal leaves the agent
/// discoverable until commit, and a staged new agent is invisible to every
/// query in the same step, including queries from this context.
pub struct ExecutionContext<'a, A> {
    view: StepView<'a, A>,
    rng: &'a mut ChaCha8Rng,
    partition: PartitionId,
    current: Option<(AgentId, AgentHandle)>,
    staging: Staging<A>,
}

impl<'a, A: Agent> ExecutionContext<'a, A> {
    /// Create a context for a task over `partition`.
    pub(crate) fn new(view: StepView<'a, A>, rng: &'a mut ChaCha8Rng, partition: PartitionId) -> Self {
        Self {
            view,
            rng,
            partition,
            current: None,
            staging: Staging::default(),
        }
    }

    // ── Driver hooks ────────────────────────────────────────────

    /// Make `id` at `handle` the agent being processed and return a mark
    /// for rolling back its staged work.
    pub(crate) fn begin_agent(&mut self, id: AgentId, handle: AgentHandle) -> StagingMark {
        self.current = Some((id, handle));
        self.staging.mark()
    }

    /// Discard everything staged since `mark`.
    pub(crate) fn rollback_to(&mut self, mark: StagingMark) {
        self.staging.rollback(mark);
    }

    /// Consume the context, returning what it staged.
    pub(crate) fn into_staging(self) -> Staging<A> {
        self.staging
    }

    // ── Step information ────────────────────────────────────────

    /// The agent being processed.
    ///
    /// Contexts are only handed out by [`Pipeline::run_chunk`](crate::Pipeline::run_chunk),
    /// which sets the current agent before any behavior runs.
    pub fn id(&self) -> AgentId {
        self.current_entry().0
    }

    /// Tick-start location of the agent being processed.
    pub fn handle(&self) -> AgentHandle {
        self.current_entry().1
    }

    fn current_entry(&self) -> (AgentId, AgentHandle) {
        match self.current {
            Some(entry) => entry,
            None => panic!("ExecutionContext used outside of an agent"),
        }
    }

    /// Partition this context's task covers.
    pub fn partition(&self) -> PartitionId {
        self.partition
    }

    /// The step being computed.
    pub fn step(&self) -> StepId {
        self.view.step
    }

    /// Physical parameters of the step.
    pub fn params(&self) -> &StepParams {
        self.view.params
    }

    /// This worker's random generator.
    pub fn rng(&mut self) -> &mut ChaCha8Rng {
        &mut *self.rng
    }

    /// Read-only view of the whole simulation.
    pub fn view(&self) -> StepView<'a, A> {
        self.view
    }

    // ── Reads ───────────────────────────────────────────────────

    /// Tick-start state of any live agent.
    pub fn agent(&self, id: AgentId) -> Result<&'a A, StoreError> {
        self.view.store.get(id)
    }

    /// Visit every agent within `radius` of the current agent.
    ///
    /// `f` receives `(id, tick-start agent, squared distance)`.
    pub fn for_each_neighbor<F>(&self, radius: f64, f: F) -> Result<(), SpaceError>
    where
        F: FnMut(AgentId, &'a A, f64),
    {
        self.for_each_neighbor_of(self.id(), radius, f)
    }

    /// Visit every agent within `radius` of agent `id`, excluding `id`.
    pub fn for_each_neighbor_of<F>(&self, id: AgentId, radius: f64, mut f: F) -> Result<(), SpaceError>
    where
        F: FnMut(AgentId, &'a A, f64),
    {
        let store = self.view.store;
        self.view.grid.for_each_neighbor(id, radius, |n, handle, d_sq| {
            if let Some(agent) = store.get_by_handle(handle) {
                f(n, agent, d_sq);
            }
        })
    }

    /// Visit every agent whose tick-start position lies within `radius` of
    /// `point`, skipping `exclude`.
    ///
    /// Use this with the agent's current position once an earlier behavior
    /// has moved it this step.
    pub fn for_each_neighbor_of_point<F>(
        &self,
        point: Vec3,
        radius: f64,
        exclude: Option<AgentId>,
        mut f: F,
    ) where
        F: FnMut(AgentId, &'a A, f64),
    {
        let store = self.view.store;
        self.view
            .grid
            .for_each_neighbor_of_point(point, radius, exclude, |n, handle, d_sq| {
                if let Some(agent) = store.get_by_handle(handle) {
                    f(n, agent, d_sq);
                }
            });
    }

    // ── Staged mutation ─────────────────────────────────────────

    /// Stage a new agent in this context's partition and return its
    /// final id. The agent becomes visible after commit.
    pub fn new_agent(&mut self, agent: A) -> AgentId {
        let partition = self.partition;
        self.stage(agent, partition)
    }

    /// Stage a new agent in an explicit partition.
    ///
    /// # Errors
    ///
    /// `PartitionOutOfRange` if the store has no such partition.
    pub fn new_agent_in(&mut self, agent: A, partition: PartitionId) -> Result<AgentId, StoreError> {
        let partition_count = self.view.store.partition_count();
        if partition.index() >= partition_count {
            return Err(StoreError::PartitionOutOfRange {
                partition,
                partition_count,
            });
        }
        Ok(self.stage(agent, partition))
    }

    fn stage(&mut self, agent: A, partition: PartitionId) -> AgentId {
        let id = self.view.store.allocator().allocate();
        self.staging.push_new(StagedAgent {
            id,
            partition,
            agent,
        });
        id
    }

    /// Stage `id` for removal. Marking an id twice is harmless; returns
    /// `false` if this context had already marked it.
    pub fn mark_removed(&mut self, id: AgentId) -> bool {
        self.staging.mark_removed(id)
    }

    /// Stage the current agent for removal.
    pub fn remove_self(&mut self) -> bool {
        let id = self.id();
        self.mark_removed(id)
    }

    /// Whether this context has staged `id` for removal.
    pub fn is_marked_removed(&self, id: AgentId) -> bool {
        self.staging.is_removed(id)
    }

    /// Number of agents staged for creation so far.
    pub fn staged_new(&self) -> usize {
        self.staging.new_agents().len()
    }
}

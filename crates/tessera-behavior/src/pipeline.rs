//! Pipeline validation and per-chunk execution.
//!
//! [`Pipeline::new`] validates the caller-declared behavior sequence once,
//! at scheduler construction. [`Pipeline::run_chunk`] is the per-task hot
//! path: it runs every behavior, in declaration order, on a private copy
//! of each agent of one chunk.

use std::error::Error;
use std::fmt;

use indexmap::IndexSet;
use rand_chacha::ChaCha8Rng;
use tessera_core::{Agent, AgentId, BehaviorError, PartitionId};
use tessera_store::ChunkView;

use crate::behavior::Behavior;
use crate::context::{ExecutionContext, StepView};
use crate::staging::Staging;

// ── Errors ─────────────────────────────────────────────────────────

/// Errors from pipeline validation (startup-time, not per-step).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    /// No behaviors registered.
    EmptyPipeline,
    /// Two behaviors share a name.
    DuplicateBehavior {
        /// The repeated name.
        name: String,
    },
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyPipeline => write!(f, "pipeline has no behaviors"),
            Self::DuplicateBehavior { name } => {
                write!(f, "behavior '{name}' registered more than once")
            }
        }
    }
}

impl Error for PipelineError {}

// ── Outcomes ───────────────────────────────────────────────────────

/// A behavior error caught at the per-agent boundary.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BehaviorFailure {
    /// Agent whose update was skipped.
    pub agent: AgentId,
    /// Name of the failing behavior.
    pub behavior: String,
    /// The error it returned.
    pub error: BehaviorError,
}

/// Everything one `(partition, chunk)` task produced.
#[derive(Debug)]
pub struct ChunkOutcome<A> {
    /// Partition the chunk belongs to.
    pub partition: PartitionId,
    /// Chunk index within the partition.
    pub chunk: usize,
    /// Next state of each agent of the chunk, in slot order. Failed agents
    /// carry their tick-start state.
    pub agents: Vec<A>,
    /// Births and deaths staged by the chunk's context.
    pub staging: Staging<A>,
    /// Agents skipped this step.
    pub failures: Vec<BehaviorFailure>,
}

// ── Pipeline ───────────────────────────────────────────────────────

/// A validated, ordered sequence of behaviors.
///
/// Order is the declaration order and is never changed: later behaviors
/// see the agent as modified by earlier ones.
pub struct Pipeline<A> {
    behaviors: Vec<Box<dyn Behavior<A>>>,
}

impl<A: Agent> Pipeline<A> {
    /// Validate and wrap `behaviors`.
    ///
    /// # Errors
    ///
    /// `EmptyPipeline` for an empty list, `DuplicateBehavior` if two
    /// behaviors share a name.
    pub fn new(behaviors: Vec<Box<dyn Behavior<A>>>) -> Result<Self, PipelineError> {
        if behaviors.is_empty() {
            return Err(PipelineError::EmptyPipeline);
        }
        let mut names = IndexSet::with_capacity(behaviors.len());
        for b in &behaviors {
            if !names.insert(b.name()) {
                return Err(PipelineError::DuplicateBehavior {
                    name: b.name().to_string(),
                });
            }
        }
        Ok(Self { behaviors })
    }

    /// Number of behaviors.
    pub fn len(&self) -> usize {
        self.behaviors.len()
    }

    /// Always `false` for a validated pipeline.
    pub fn is_empty(&self) -> bool {
        self.behaviors.is_empty()
    }

    /// Behavior names in execution order.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.behaviors.iter().map(|b| b.name())
    }

    /// Run every behavior on every agent of `chunk`.
    ///
    /// Each agent is processed on a clone of its tick-start state. If any
    /// behavior fails, the agent's staged births and deaths are rolled
    /// back, its tick-start state is kept, and the failure is recorded in
    /// the outcome; the remaining behaviors for that agent are skipped.
    pub fn run_chunk(
        &self,
        view: StepView<'_, A>,
        chunk: ChunkView<'_, A>,
        rng: &mut ChaCha8Rng,
    ) -> ChunkOutcome<A> {
        let mut ctx = ExecutionContext::new(view, rng, chunk.partition);
        let mut agents = Vec::with_capacity(chunk.agents.len());
        let mut failures = Vec::new();

        for (id, handle, original) in chunk.iter() {
            let mark = ctx.begin_agent(id, handle);
            let mut next = original.clone();
            match self.run_agent(&mut next, &mut ctx) {
                Ok(()) => agents.push(next),
                Err((behavior, error)) => {
                    ctx.rollback_to(mark);
                    agents.push(original.clone());
                    failures.push(BehaviorFailure {
                        agent: id,
                        behavior: behavior.to_string(),
                        error,
                    });
                }
            }
        }

        ChunkOutcome {
            partition: chunk.partition,
            chunk: chunk.chunk,
            agents,
            staging: ctx.into_staging(),
            failures,
        }
    }

    fn run_agent(
        &self,
        agent: &mut A,
        ctx: &mut ExecutionContext<'_, A>,
    ) -> Result<(), (&str, BehaviorError)> {
        for b in &self.behaviors {
            b.run(agent, ctx).map_err(|e| (b.name(), e))?;
        }
        Ok(())
    }
}

impl<A: Agent> fmt::Debug for Pipeline<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.behaviors.iter().map(|b| b.name()))
            .finish()
    }
}

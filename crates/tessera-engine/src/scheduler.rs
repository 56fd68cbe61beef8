//! Scheduler: drives a [`Simulation`] through its step loop.
//!
//! [`Scheduler`] owns the validated behavior [`Pipeline`] and runs it over
//! a simulation passed in by `&mut`. Every step goes through the same
//! phases:
//!
//! ```text
//! Idle ──► Running(k) ─ rebalance? ─ rebuild index ─ sample fields ─ behaviors
//!                                                                      │
//! Idle ◄── advance to k+1 ◄── commit ◄── CommitPending(k) ◄────────────┘
//! ```
//!
//! A behavior panic unwinds out of [`Scheduler::simulate`] and leaves the
//! state at `Running` or `CommitPending`. Any later call reports
//! [`StepError::Poisoned`].

use std::time::Instant;

use tessera_behavior::{Behavior, Pipeline, PipelineError, StepView};
use tessera_core::{Agent, StepId};
use tessera_space::SpaceError;

use crate::commit::commit;
use crate::config::{ConfigError, SimulationConfig};
use crate::error::StepError;
use crate::metrics::{SimulateReport, StepMetrics};
use crate::registry::AgentPositions;
use crate::simulation::Simulation;

/// Where the scheduler is within a step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchedulerState {
    /// Between steps.
    Idle,
    /// Rebuilding, sampling or running behaviors for a step.
    Running {
        /// The step being computed.
        step: StepId,
    },
    /// All behaviors finished; staged changes are being applied.
    CommitPending {
        /// The step being committed.
        step: StepId,
    },
}

/// Runs a fixed behavior pipeline over a [`Simulation`].
pub struct Scheduler<A> {
    pipeline: Pipeline<A>,
    state: SchedulerState,
    last_metrics: StepMetrics,
}

impl<A: Agent> Scheduler<A> {
    /// Validate `behaviors` and build a scheduler. Behaviors run in the
    /// given order and are never reordered.
    ///
    /// # Errors
    ///
    /// `EmptyPipeline` or `DuplicateBehavior`.
    pub fn new(behaviors: Vec<Box<dyn Behavior<A>>>) -> Result<Self, PipelineError> {
        Ok(Self {
            pipeline: Pipeline::new(behaviors)?,
            state: SchedulerState::Idle,
            last_metrics: StepMetrics::default(),
        })
    }

    /// Build a simulation from `config` together with a scheduler for
    /// `behaviors`.
    ///
    /// # Errors
    ///
    /// Any error of [`Simulation::new`], or `Pipeline` if the behaviors
    /// fail validation.
    pub fn build(
        config: SimulationConfig,
        behaviors: Vec<Box<dyn Behavior<A>>>,
    ) -> Result<(Simulation<A>, Self), ConfigError> {
        let scheduler = Self::new(behaviors)?;
        let sim = Simulation::new(config)?;
        Ok((sim, scheduler))
    }

    /// Current state. `Idle` unless a step was interrupted.
    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// Whether a step was interrupted and the scheduler must not be reused.
    pub fn is_poisoned(&self) -> bool {
        self.state != SchedulerState::Idle
    }

    /// Metrics of the most recently completed step.
    pub fn last_metrics(&self) -> &StepMetrics {
        &self.last_metrics
    }

    /// The validated pipeline.
    pub fn pipeline(&self) -> &Pipeline<A> {
        &self.pipeline
    }

    /// Run `steps` steps of `sim`.
    ///
    /// # Errors
    ///
    /// - `Poisoned` if an earlier step was interrupted.
    /// - `Space` if the spatial index cannot be rebuilt; nothing of the
    ///   step was applied and the scheduler stays usable.
    /// - `InvariantViolation` if the rebuilt index does not cover the
    ///   store, or `Store(InvariantViolation)` if commit finds inconsistent
    ///   bookkeeping. The simulation must be discarded and the scheduler
    ///   stays poisoned.
    pub fn simulate(
        &mut self,
        sim: &mut Simulation<A>,
        steps: u64,
    ) -> Result<SimulateReport, StepError> {
        let mut report = SimulateReport {
            step: sim.step,
            ..SimulateReport::default()
        };
        for _ in 0..steps {
            let metrics = self.step(sim)?;
            report.absorb(sim.step, &metrics);
        }
        Ok(report)
    }

    fn step(&mut self, sim: &mut Simulation<A>) -> Result<StepMetrics, StepError> {
        if let SchedulerState::Running { step } | SchedulerState::CommitPending { step } =
            self.state
        {
            tracing::error!(step = %step, "scheduler reused after an interrupted step");
            return Err(StepError::Poisoned { step });
        }

        let step = sim.step;
        let step_start = Instant::now();
        let mut metrics = StepMetrics::default();
        self.state = SchedulerState::Running { step };

        // 1. Rebalance partitions for locality.
        let interval = sim.config().rebalance_interval;
        if interval > 0 && step.0 > 0 && step.0 % interval == 0 {
            let start = Instant::now();
            let cell_size = sim.grid.cell_size();
            sim.store.rebalance_partitions(cell_size);
            metrics.rebalance_us = start.elapsed().as_micros() as u64;
        }

        // 2. Rebuild the spatial index.
        let start = Instant::now();
        if let Err(e) = rebuild(sim) {
            self.state = SchedulerState::Idle;
            tracing::warn!(step = %step, error = %e, "index rebuild failed, step skipped");
            return Err(e.into());
        }
        check_index(sim)?;
        metrics.index_rebuild_us = start.elapsed().as_micros() as u64;

        // 3. Field collaborators sample positions.
        let start = Instant::now();
        sim.fields
            .sample_all(&AgentPositions::new(sim.grid.entries(), step));
        metrics.field_sample_us = start.elapsed().as_micros() as u64;

        // 4. Behaviors, one task per (partition, chunk).
        let start = Instant::now();
        let view = StepView {
            store: &sim.store,
            grid: &sim.grid,
            params: sim.params(),
            step,
        };
        let chunk_size = sim.config().chunk_size;
        let pipeline = &self.pipeline;
        let random = &sim.random;
        let outcomes = sim.pool.install(|| {
            view.store.map_parallel(chunk_size, |chunk| {
                let mut rng = random.lock_current();
                pipeline.run_chunk(view, chunk, &mut rng)
            })
        });
        metrics.behavior_us = start.elapsed().as_micros() as u64;

        // 5. Commit.
        self.state = SchedulerState::CommitPending { step };
        let start = Instant::now();
        let committed = commit(&mut sim.store, outcomes)?;
        metrics.commit_us = start.elapsed().as_micros() as u64;

        // 6. Advance.
        sim.step = step.next();
        self.state = SchedulerState::Idle;
        metrics.agents_created = committed.created;
        metrics.agents_removed = committed.removed;
        metrics.duplicate_removals = committed.duplicate_removals;
        metrics.behavior_failures = committed.failures;
        metrics.agent_count = sim.store.count(None) as u64;
        metrics.total_us = step_start.elapsed().as_micros() as u64;

        tracing::debug!(
            step = %step,
            agents = metrics.agent_count,
            created = metrics.agents_created,
            removed = metrics.agents_removed,
            failures = metrics.behavior_failures,
            total_us = metrics.total_us,
            "step complete"
        );
        self.last_metrics = metrics.clone();
        Ok(metrics)
    }
}

fn rebuild<A: Agent>(sim: &mut Simulation<A>) -> Result<(), SpaceError> {
    let Simulation {
        pool, grid, store, ..
    } = sim;
    pool.install(|| grid.rebuild(store))
}

fn check_index<A: Agent>(sim: &Simulation<A>) -> Result<(), StepError> {
    let indexed = sim.grid.len();
    let live = sim.store.count(None);
    if indexed != live {
        tracing::error!(indexed, live, "spatial index out of step with the store");
        return Err(StepError::InvariantViolation {
            reason: format!("index holds {indexed} agents, store holds {live}"),
        });
    }
    Ok(())
}

impl<A: Agent> std::fmt::Debug for Scheduler<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("pipeline", &self.pipeline)
            .field("state", &self.state)
            .finish()
    }
}

//! Per-step metrics for the scheduler.
//!
//! [`StepMetrics`] captures timing and population data for a single step.
//! [`SimulateReport`] aggregates them over one
//! [`simulate`](crate::Scheduler::simulate) call.

use tessera_core::StepId;

/// Timing and population metrics collected during a single step.
///
/// All durations are in microseconds.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StepMetrics {
    /// Wall-clock time for the entire step.
    pub total_us: u64,
    /// Time spent rebalancing partitions (zero on steps without one).
    pub rebalance_us: u64,
    /// Time spent rebuilding the spatial index.
    pub index_rebuild_us: u64,
    /// Time spent in field collaborators.
    pub field_sample_us: u64,
    /// Time spent running behaviors across all workers.
    pub behavior_us: u64,
    /// Time spent in the single-threaded commit.
    pub commit_us: u64,
    /// Agents inserted at commit.
    pub agents_created: u64,
    /// Agents removed at commit.
    pub agents_removed: u64,
    /// Removal requests for agents already gone.
    pub duplicate_removals: u64,
    /// Agents skipped because a behavior failed.
    pub behavior_failures: u64,
    /// Live agents after commit.
    pub agent_count: u64,
}

/// Totals over a [`simulate`](crate::Scheduler::simulate) call.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SimulateReport {
    /// Steps completed by this call.
    pub steps: u64,
    /// Step counter after the call.
    pub step: StepId,
    /// Agents inserted over all steps.
    pub agents_created: u64,
    /// Agents removed over all steps.
    pub agents_removed: u64,
    /// Duplicate removal requests over all steps.
    pub duplicate_removals: u64,
    /// Skipped agent updates over all steps.
    pub behavior_failures: u64,
    /// Sum of per-step wall-clock times.
    pub total_us: u64,
}

impl SimulateReport {
    pub(crate) fn absorb(&mut self, step: StepId, m: &StepMetrics) {
        self.steps += 1;
        self.step = step;
        self.agents_created += m.agents_created;
        self.agents_removed += m.agents_removed;
        self.duplicate_removals += m.duplicate_removals;
        self.behavior_failures += m.behavior_failures;
        self.total_us += m.total_us;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_metrics_are_zero() {
        let m = StepMetrics::default();
        assert_eq!(m.total_us, 0);
        assert_eq!(m.agents_created, 0);
        assert_eq!(m.behavior_failures, 0);
        assert_eq!(m.agent_count, 0);
    }

    #[test]
    fn report_accumulates() {
        let mut r = SimulateReport::default();
        let m = StepMetrics {
            total_us: 10,
            agents_created: 2,
            agents_removed: 1,
            duplicate_removals: 1,
            behavior_failures: 3,
            ..StepMetrics::default()
        };
        r.absorb(StepId(1), &m);
        r.absorb(StepId(2), &m);
        assert_eq!(r.steps, 2);
        assert_eq!(r.step, StepId(2));
        assert_eq!(r.agents_created, 4);
        assert_eq!(r.agents_removed, 2);
        assert_eq!(r.duplicate_removals, 2);
        assert_eq!(r.behavior_failures, 6);
        assert_eq!(r.total_us, 20);
    }
}

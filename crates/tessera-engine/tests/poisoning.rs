//! Integration test: a panicking behavior poisons the scheduler.

use std::panic::{catch_unwind, AssertUnwindSafe};

use tessera_core::{StepId, Vec3};
use tessera_engine::{Scheduler, SchedulerState, Simulation, SimulationConfig, StepError};
use tessera_test_utils::{PanicOnStep, TestAgent};

#[test]
fn reuse_after_panic_is_poisoned() {
    let mut sim = Simulation::new(SimulationConfig {
        threads: Some(2),
        ..SimulationConfig::default()
    })
    .unwrap();
    sim.push(TestAgent::at(Vec3::ZERO));
    let mut scheduler = Scheduler::new(vec![Box::new(PanicOnStep { step: StepId(1) })
        as Box<dyn tessera_behavior::Behavior<TestAgent>>])
    .unwrap();

    let outcome = catch_unwind(AssertUnwindSafe(|| scheduler.simulate(&mut sim, 3)));
    assert!(outcome.is_err());
    assert_eq!(
        scheduler.state(),
        SchedulerState::Running { step: StepId(1) }
    );
    assert!(scheduler.is_poisoned());
    // Step 0 committed; step 1 did not.
    assert_eq!(sim.step(), StepId(1));

    let err = scheduler.simulate(&mut sim, 1).unwrap_err();
    assert_eq!(err, StepError::Poisoned { step: StepId(1) });
    assert!(err.is_fatal());
}

//! Stop criteria for search termination.

pub(crate) mod checker;
mod max_runtime;
mod max_steps;
mod min_delta;
mod target_value;
mod unimproved;

use strider_core::solution::Solution;

use crate::search::SearchHandle;

pub use max_runtime::MaxRuntime;
pub use max_steps::MaxSteps;
pub use min_delta::MinDelta;
pub use target_value::TargetValue;
pub use unimproved::{MaxStepsWithoutImprovement, MaxTimeWithoutImprovement};

/// Predicate deciding when a search should terminate.
///
/// Criteria are polled periodically by a cooperative checker owned by
/// the search. Checks must be cheap: they read counters from the given
/// handle and never invoke the objective.
pub trait StopCriterion<S: Solution>: Send {
    /// Returns true if the search should stop.
    fn should_stop(&self, search: &SearchHandle<'_, S>) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::SharedState;
    use std::fmt;
    use std::sync::Arc;
    use std::time::Duration;

    #[derive(Clone, PartialEq, Eq, Hash, Debug)]
    struct TestSol;

    impl fmt::Display for TestSol {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "sol")
        }
    }

    impl strider_core::solution::Solution for TestSol {}

    fn shared(minimizing: bool) -> Arc<SharedState<TestSol>> {
        Arc::new(SharedState::new("test".to_string(), minimizing))
    }

    fn step(shared: &Arc<SharedState<TestSol>>, times: u64) {
        for _ in 0..times {
            shared.counters.record_step(Duration::from_micros(1));
        }
    }

    #[test]
    fn max_steps_fires_at_the_limit() {
        let shared = shared(false);
        shared.counters.reset_for_run();
        let criterion = MaxSteps::new(3);
        let handle = SearchHandle { shared: &shared };
        assert!(!StopCriterion::should_stop(&criterion, &handle));
        step(&shared, 3);
        assert!(StopCriterion::should_stop(&criterion, &handle));
    }

    #[test]
    fn max_runtime_requires_a_started_run() {
        let shared = shared(false);
        let criterion = MaxRuntime::millis(0);
        let handle = SearchHandle { shared: &shared };
        assert!(!StopCriterion::should_stop(&criterion, &handle));
        shared.counters.reset_for_run();
        assert!(StopCriterion::should_stop(&criterion, &handle));
    }

    #[test]
    fn unimproved_steps_count_from_the_last_improvement() {
        let shared = shared(false);
        shared.counters.reset_for_run();
        let criterion = MaxStepsWithoutImprovement::new(2);
        let handle = SearchHandle { shared: &shared };
        step(&shared, 2);
        assert!(StopCriterion::should_stop(&criterion, &handle));
        shared.counters.record_improvement(1.0, 5.0);
        assert!(!StopCriterion::should_stop(&criterion, &handle));
        step(&shared, 2);
        assert!(StopCriterion::should_stop(&criterion, &handle));
    }

    #[test]
    fn min_delta_fires_on_small_improvements_only() {
        let shared = shared(false);
        shared.counters.reset_for_run();
        let criterion = MinDelta::new(0.5);
        let handle = SearchHandle { shared: &shared };
        assert!(!StopCriterion::should_stop(&criterion, &handle));
        shared.counters.record_improvement(2.0, 10.0);
        assert!(!StopCriterion::should_stop(&criterion, &handle));
        shared.counters.record_improvement(0.1, 10.1);
        assert!(StopCriterion::should_stop(&criterion, &handle));
    }

    #[test]
    fn target_value_respects_the_orientation() {
        let maximizing = shared(false);
        maximizing.counters.reset_for_run();
        let criterion = TargetValue::new(10.0);
        let handle = SearchHandle {
            shared: &maximizing,
        };
        maximizing.counters.record_improvement(1.0, 9.0);
        assert!(!StopCriterion::should_stop(&criterion, &handle));
        maximizing.counters.record_improvement(1.0, 10.0);
        assert!(StopCriterion::should_stop(&criterion, &handle));

        let minimizing = shared(true);
        minimizing.counters.reset_for_run();
        let handle = SearchHandle {
            shared: &minimizing,
        };
        minimizing.counters.record_improvement(1.0, 12.0);
        assert!(!StopCriterion::should_stop(&criterion, &handle));
        minimizing.counters.record_improvement(1.0, 10.0);
        assert!(StopCriterion::should_stop(&criterion, &handle));
    }
}

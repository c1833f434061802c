//! Stop criteria based on lack of improvement.

use std::time::Duration;

use strider_core::solution::Solution;

use super::StopCriterion;
use crate::search::SearchHandle;

/// Stops the search once a maximum number of steps has passed without
/// a new best solution.
#[derive(Debug, Clone)]
pub struct MaxStepsWithoutImprovement {
    limit: u64,
}

impl MaxStepsWithoutImprovement {
    pub fn new(limit: u64) -> Self {
        Self { limit }
    }
}

impl<S: Solution> StopCriterion<S> for MaxStepsWithoutImprovement {
    fn should_stop(&self, search: &SearchHandle<'_, S>) -> bool {
        search
            .steps_without_improvement()
            .is_some_and(|steps| steps >= self.limit)
    }
}

/// Stops the search once a maximum amount of time has passed without a
/// new best solution.
#[derive(Debug, Clone)]
pub struct MaxTimeWithoutImprovement {
    limit: Duration,
}

impl MaxTimeWithoutImprovement {
    pub fn new(limit: Duration) -> Self {
        Self { limit }
    }

    pub fn seconds(secs: u64) -> Self {
        Self::new(Duration::from_secs(secs))
    }
}

impl<S: Solution> StopCriterion<S> for MaxTimeWithoutImprovement {
    fn should_stop(&self, search: &SearchHandle<'_, S>) -> bool {
        search
            .time_without_improvement()
            .is_some_and(|time| time >= self.limit)
    }
}

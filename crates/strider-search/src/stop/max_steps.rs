//! Step-count stop criterion.

use strider_core::solution::Solution;

use super::StopCriterion;
use crate::search::SearchHandle;

/// Stops the search after a maximum number of steps.
#[derive(Debug, Clone)]
pub struct MaxSteps {
    limit: u64,
}

impl MaxSteps {
    pub fn new(limit: u64) -> Self {
        Self { limit }
    }
}

impl<S: Solution> StopCriterion<S> for MaxSteps {
    fn should_stop(&self, search: &SearchHandle<'_, S>) -> bool {
        search.steps() >= self.limit
    }
}

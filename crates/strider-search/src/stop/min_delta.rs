//! Minimum-improvement stop criterion.

use strider_core::solution::Solution;

use super::StopCriterion;
use crate::search::SearchHandle;

/// Stops the search when the improvement of the last best-solution
/// update drops below a minimum delta.
#[derive(Debug, Clone)]
pub struct MinDelta {
    minimum: f64,
}

impl MinDelta {
    pub fn new(minimum: f64) -> Self {
        Self { minimum }
    }
}

impl<S: Solution> StopCriterion<S> for MinDelta {
    fn should_stop(&self, search: &SearchHandle<'_, S>) -> bool {
        search
            .last_improvement_delta()
            .is_some_and(|delta| delta < self.minimum)
    }
}

//! Runtime-based stop criterion.

use std::time::Duration;

use strider_core::solution::Solution;

use super::StopCriterion;
use crate::search::SearchHandle;

/// Stops the search after a maximum wall-clock runtime.
#[derive(Debug, Clone)]
pub struct MaxRuntime {
    limit: Duration,
}

impl MaxRuntime {
    pub fn new(limit: Duration) -> Self {
        Self { limit }
    }

    pub fn seconds(secs: u64) -> Self {
        Self::new(Duration::from_secs(secs))
    }

    pub fn millis(ms: u64) -> Self {
        Self::new(Duration::from_millis(ms))
    }
}

impl<S: Solution> StopCriterion<S> for MaxRuntime {
    fn should_stop(&self, search: &SearchHandle<'_, S>) -> bool {
        search.runtime().is_some_and(|runtime| runtime >= self.limit)
    }
}

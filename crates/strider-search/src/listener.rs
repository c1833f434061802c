//! Search lifecycle observers.

use std::sync::Arc;

use strider_core::eval::Evaluation;
use strider_core::solution::Solution;
use strider_core::validation::Validation;

use crate::search::SearchHandle;

/// Observer of search lifecycle events. All callbacks have no-op
/// defaults.
///
/// Callbacks are invoked synchronously from the thread that triggered
/// the event; in parallel algorithms `new_best_solution` fires while
/// the best-solution lock is held, so the received triple is always
/// consistent. Callbacks should not call back into the search's best
/// accessors; the event arguments carry everything they need.
pub trait SearchListener<S: Solution>: Send + Sync {
    /// Fired when the search enters its step loop, after
    /// initialisation.
    fn search_started(&self, _search: &SearchHandle<'_, S>) {}

    /// Fired when a run terminates.
    fn search_stopped(&self, _search: &SearchHandle<'_, S>) {}

    /// Fired whenever a new best solution is installed.
    fn new_best_solution(
        &self,
        _search: &SearchHandle<'_, S>,
        _solution: &S,
        _evaluation: &Arc<dyn Evaluation>,
        _validation: &Arc<dyn Validation>,
    ) {
    }

    /// Fired whenever the current solution of a local search changes.
    fn new_current_solution(
        &self,
        _search: &SearchHandle<'_, S>,
        _solution: &S,
        _evaluation: &Arc<dyn Evaluation>,
        _validation: &Arc<dyn Validation>,
    ) {
    }

    /// Fired after every completed search step.
    fn step_completed(&self, _search: &SearchHandle<'_, S>, _steps: u64) {}

    /// Fired every time the stop-criterion checker has polled the
    /// registered criteria.
    fn stop_criterion_checked(&self, _search: &SearchHandle<'_, S>) {}
}

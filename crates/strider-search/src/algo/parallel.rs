//! Basic parallel search.

use std::sync::{Arc, Mutex};
use std::thread;

use strider_core::error::{Result, StriderError};
use strider_core::eval::Evaluation;
use strider_core::problem::Problem;
use strider_core::solution::Solution;
use strider_core::validation::Validation;

use crate::listener::SearchListener;
use crate::local::{LocalSearch, LocalSearchCore};
use crate::search::{EvaluatedSolution, Search, SearchCore, SearchHandle, SharedState};

/// Listener attached to a sub-search or replica that reports its best
/// solutions into the parent: the parent's current and best solution
/// are updated together under the parent's best lock, so parent
/// listeners always observe a consistent triple.
pub(crate) struct BestMergeListener<S: Solution> {
    pub(crate) parent: Arc<SharedState<S>>,
    pub(crate) parent_current: Arc<Mutex<Option<EvaluatedSolution<S>>>>,
}

impl<S: Solution> SearchListener<S> for BestMergeListener<S> {
    fn new_best_solution(
        &self,
        _search: &SearchHandle<'_, S>,
        solution: &S,
        evaluation: &Arc<dyn Evaluation>,
        validation: &Arc<dyn Validation>,
    ) {
        let candidate =
            EvaluatedSolution::new(solution.clone(), evaluation.clone(), validation.clone());
        let mut best = self.parent.best_lock().lock().unwrap();
        *self.parent_current.lock().unwrap() = Some(candidate.clone());
        self.parent.fire_new_current(&candidate);
        self.parent.install_best(&mut best, &candidate);
    }
}

/// Listener that propagates the parent's stop request into a
/// sub-search, checked after every completed sub-search step.
struct CascadeStopListener<S: Solution> {
    parent: Arc<SharedState<S>>,
}

impl<S: Solution> SearchListener<S> for CascadeStopListener<S> {
    fn step_completed(&self, search: &SearchHandle<'_, S>, _steps: u64) {
        if self.parent.stop_requested() {
            search.request_stop();
        }
    }
}

/// Runs a bag of heterogeneous local searches concurrently, one worker
/// thread per search, and tracks the best solution across all of them.
///
/// Every sub-search keeps its own stop criteria; stopping the parallel
/// search additionally cascades into all sub-searches. Setting a
/// custom current solution seeds every sub-search with its own copy.
/// The whole bag executes within a single search step, after which the
/// search stops.
pub struct BasicParallelSearch<S: Solution> {
    local: LocalSearchCore<S>,
    searches: Vec<Box<dyn LocalSearch<S>>>,
}

impl<S: Solution> BasicParallelSearch<S> {
    pub fn new(problem: Arc<dyn Problem<S>>) -> Self {
        Self {
            local: LocalSearchCore::new("BasicParallelSearch", problem),
            searches: Vec::new(),
        }
    }

    /// Adds a sub-search to the bag. Only allowed while the parallel
    /// search is idle; the sub-search must be idle as well so its
    /// merge listeners can be registered.
    pub fn add_search(&mut self, search: Box<dyn LocalSearch<S>>) -> Result<()> {
        self.local.core().ensure_idle("adding a sub-search")?;
        let shared = self.local.core().shared().clone();
        search.add_listener(Box::new(BestMergeListener {
            parent: shared.clone(),
            parent_current: self.local.current_cell().clone(),
        }))?;
        search.add_listener(Box::new(CascadeStopListener { parent: shared }))?;
        self.searches.push(search);
        Ok(())
    }

    pub fn search_count(&self) -> usize {
        self.searches.len()
    }
}

impl<S: Solution> Search<S> for BasicParallelSearch<S> {
    fn core(&self) -> &SearchCore<S> {
        self.local.core()
    }

    fn core_mut(&mut self) -> &mut SearchCore<S> {
        self.local.core_mut()
    }

    // The parent never generates its own solution: its current and
    // best come from the sub-searches, or from a custom current
    // solution set before starting.
    fn init(&mut self) -> Result<()> {
        if self.searches.is_empty() {
            return Err(StriderError::Configuration(
                "a basic parallel search requires at least one sub-search".to_string(),
            ));
        }
        Ok(())
    }

    fn search_step(&mut self) -> Result<()> {
        let results: Vec<Result<()>> = thread::scope(|scope| {
            let handles: Vec<_> = self
                .searches
                .iter_mut()
                .map(|search| scope.spawn(move || search.start()))
                .collect();
            handles
                .into_iter()
                .map(|handle| {
                    handle.join().unwrap_or_else(|_| {
                        Err(StriderError::Search(
                            "parallel sub-search thread panicked".to_string(),
                        ))
                    })
                })
                .collect()
        });
        {
            let shared = self.local.core().shared();
            for search in &self.searches {
                shared.counters.add_accepted(search.accepted_moves());
                shared.counters.add_rejected(search.rejected_moves());
            }
            shared.request_stop();
        }
        for result in results {
            result.map_err(|err| {
                StriderError::Search(format!("parallel sub-search failed: {err}"))
            })?;
        }
        Ok(())
    }

    fn stop(&self) {
        self.core().shared().request_stop();
        for search in &self.searches {
            search.stop();
        }
    }

    fn on_dispose(&mut self) {
        for search in &mut self.searches {
            let _ = search.dispose();
        }
    }
}

impl<S: Solution> LocalSearch<S> for BasicParallelSearch<S> {
    fn local(&self) -> &LocalSearchCore<S> {
        &self.local
    }

    fn local_mut(&mut self) -> &mut LocalSearchCore<S> {
        &mut self.local
    }

    fn set_current_solution(&mut self, solution: S) -> Result<()> {
        self.local.core().ensure_idle("setting the current solution")?;
        for search in &mut self.searches {
            search.set_current_solution(solution.clone())?;
        }
        self.local.set_current_solution(solution)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algo::{RandomDescent, SteepestDescent};
    use crate::stop::MaxSteps;
    use crate::test_util::{selected_ids, sum_problem};
    use std::collections::BTreeSet;
    use std::time::Duration;
    use strider_core::subset::neigh::SingleSwapNeighbourhood;

    #[test]
    fn tracks_the_best_across_all_sub_searches() {
        let problem = sum_problem(8, 3, 3);
        let mut search = BasicParallelSearch::new(problem.clone());
        for _ in 0..2 {
            search
                .add_search(Box::new(SteepestDescent::new(
                    problem.clone(),
                    Arc::new(SingleSwapNeighbourhood::new()),
                )))
                .unwrap();
        }
        let mut descent = RandomDescent::new(
            problem.clone(),
            Arc::new(SingleSwapNeighbourhood::new()),
        );
        descent
            .add_stop_criterion(Box::new(MaxSteps::new(200)))
            .unwrap();
        descent
            .set_checker_period(Duration::from_millis(1))
            .unwrap();
        search.add_search(Box::new(descent)).unwrap();

        search.start().unwrap();

        assert_eq!(search.steps(), 1);
        let best = search.best_solution().unwrap();
        assert_eq!(selected_ids(&best), BTreeSet::from([5, 6, 7]));
        assert_eq!(search.best_evaluation().unwrap().value(), 18.0);
    }

    #[test]
    fn an_empty_bag_fails_to_start() {
        let problem = sum_problem(4, 1, 1);
        let mut search = BasicParallelSearch::new(problem);
        assert!(matches!(
            search.start(),
            Err(StriderError::Configuration(_))
        ));
        assert_eq!(search.status(), crate::status::SearchStatus::Idle);
    }
}

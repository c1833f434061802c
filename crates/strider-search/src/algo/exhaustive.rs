//! Exhaustive search.

use std::sync::Arc;

use strider_core::error::Result;
use strider_core::problem::Problem;
use strider_core::solution::Solution;

use crate::search::{EvaluatedSolution, Search, SearchCore};

/// Exhaustively evaluates every solution produced by a
/// problem-supplied iterator and returns the best valid one. Stops
/// when the iterator is exhausted; each step consumes one solution.
///
/// Only feasible for small solution spaces, but guaranteed to find the
/// global optimum when it completes.
pub struct ExhaustiveSearch<S, I>
where
    S: Solution,
    I: Iterator<Item = S> + Send,
{
    core: SearchCore<S>,
    problem: Arc<dyn Problem<S>>,
    solutions: I,
}

impl<S, I> ExhaustiveSearch<S, I>
where
    S: Solution,
    I: Iterator<Item = S> + Send,
{
    pub fn new(problem: Arc<dyn Problem<S>>, solutions: I) -> Self {
        let minimizing = problem.is_minimizing();
        Self {
            core: SearchCore::new("ExhaustiveSearch", minimizing),
            problem,
            solutions,
        }
    }
}

impl<S, I> Search<S> for ExhaustiveSearch<S, I>
where
    S: Solution,
    I: Iterator<Item = S> + Send,
{
    fn core(&self) -> &SearchCore<S> {
        &self.core
    }

    fn core_mut(&mut self) -> &mut SearchCore<S> {
        &mut self.core
    }

    fn init(&mut self) -> Result<()> {
        Ok(())
    }

    fn search_step(&mut self) -> Result<()> {
        match self.solutions.next() {
            Some(solution) => {
                let evaluation = self.problem.evaluate(&solution);
                let validation = self.problem.validate(&solution);
                self.core
                    .shared()
                    .update_best(&EvaluatedSolution::new(solution, evaluation, validation));
                Ok(())
            }
            None => {
                self.core.shared().request_stop();
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{selected_ids, sum_problem};
    use std::collections::BTreeSet;
    use strider_core::subset::SubsetSolutionIterator;

    #[test]
    fn finds_the_global_optimum_over_the_enumerated_space() {
        let problem = sum_problem(6, 2, 3);
        let solutions = SubsetSolutionIterator::new(0..6, 2, 3).unwrap();
        let mut search = ExhaustiveSearch::new(problem, solutions);
        search.start().unwrap();

        // C(6,2) + C(6,3) solutions, plus the step that exhausts the
        // iterator.
        assert_eq!(search.steps(), 36);
        let best = search.best_solution().unwrap();
        assert_eq!(selected_ids(&best), BTreeSet::from([3, 4, 5]));
        assert_eq!(search.best_evaluation().unwrap().value(), 12.0);
    }

    #[test]
    fn an_empty_iterator_yields_no_best() {
        let problem = sum_problem(4, 1, 2);
        let mut search = ExhaustiveSearch::new(problem, std::iter::empty());
        search.start().unwrap();
        assert!(search.best_solution().is_none());
    }
}

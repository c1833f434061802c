//! Variable neighbourhood search.

use std::sync::Arc;

use tracing::debug;

use strider_core::error::{Result, StriderError};
use strider_core::eval::improvement_delta;
use strider_core::neigh::Neighbourhood;
use strider_core::problem::Problem;
use strider_core::solution::Solution;

use crate::algo::SteepestDescent;
use crate::factory::LocalSearchFactory;
use crate::local::{LocalSearch, LocalSearchCore};
use crate::neigh_search::NeighbourhoodSearchCore;
use crate::search::{EvaluatedSolution, Search, SearchCore};

/// Variable neighbourhood search over a prioritised list of shaking
/// neighbourhoods.
///
/// Each step shakes the current solution with a random move from the
/// neighbourhood at the current level and runs an embedded local
/// search from the shaken point. If its result strictly improves the
/// pre-shake current solution, it is accepted and the level resets to
/// zero; otherwise the level advances, wrapping around at the end of
/// the list. Shaking neighbourhoods are typically ordered by
/// increasing perturbation size, so level `ℓ` applies a shake of size
/// `ℓ + 1`.
///
/// The embedded local search must terminate on its own, like the
/// default steepest descent does in a local optimum.
pub struct VariableNeighbourhoodSearch<S: Solution> {
    ns: NeighbourhoodSearchCore<S>,
    local_search_factory: Box<dyn LocalSearchFactory<S>>,
    level: usize,
}

impl<S: Solution> VariableNeighbourhoodSearch<S> {
    /// Creates a variable neighbourhood search whose embedded local
    /// search is a steepest descent over the given descent
    /// neighbourhood.
    pub fn new(
        problem: Arc<dyn Problem<S>>,
        shaking_neighbourhoods: Vec<Arc<dyn Neighbourhood<S>>>,
        descent_neighbourhood: Arc<dyn Neighbourhood<S>>,
    ) -> Result<Self> {
        let factory = move |problem: Arc<dyn Problem<S>>| {
            Box::new(SteepestDescent::new(problem, descent_neighbourhood.clone()))
                as Box<dyn LocalSearch<S>>
        };
        Self::with_local_search_factory(problem, shaking_neighbourhoods, Box::new(factory))
    }

    /// Creates a variable neighbourhood search with a custom embedded
    /// local search factory.
    pub fn with_local_search_factory(
        problem: Arc<dyn Problem<S>>,
        shaking_neighbourhoods: Vec<Arc<dyn Neighbourhood<S>>>,
        local_search_factory: Box<dyn LocalSearchFactory<S>>,
    ) -> Result<Self> {
        Ok(Self {
            ns: NeighbourhoodSearchCore::multi(
                "VariableNeighbourhoodSearch",
                problem,
                shaking_neighbourhoods,
            )?,
            local_search_factory,
            level: 0,
        })
    }

    fn advance_level(&mut self) {
        self.level = (self.level + 1) % self.ns.neighbourhoods().len();
    }
}

impl<S: Solution> Search<S> for VariableNeighbourhoodSearch<S> {
    fn core(&self) -> &SearchCore<S> {
        self.ns.local().core()
    }

    fn core_mut(&mut self) -> &mut SearchCore<S> {
        self.ns.local_mut().core_mut()
    }

    fn init(&mut self) -> Result<()> {
        self.level = 0;
        self.ns.local_mut().init_current()
    }

    fn search_step(&mut self) -> Result<()> {
        let problem = self.ns.local().problem().clone();
        let minimizing = self.core().is_minimizing();
        let before = self
            .ns
            .local()
            .current()
            .ok_or_else(|| StriderError::Search("no current solution".to_string()))?;

        // Shake: perturb a copy of the current solution with a random
        // move from the level's neighbourhood, carrying the delta
        // evaluation and validation along.
        let level = self.level;
        let mv = match self.ns.random_move_from(level) {
            Some(mv) => mv,
            None => {
                debug!(event = "vns_shake_exhausted", level);
                self.advance_level();
                return Ok(());
            }
        };
        let mut shaken = before.clone();
        let (solution, current_evaluation, current_validation) = shaken.parts_mut();
        let validation = problem.validate_delta(mv.as_ref(), solution, current_validation)?;
        let evaluation = problem.evaluate_delta(mv.as_ref(), solution, current_evaluation)?;
        mv.apply(solution)?;
        shaken.set_evaluation(evaluation);
        shaken.set_validation(validation);

        // Refine the shaken solution with the embedded local search.
        let mut embedded = self.local_search_factory.create(problem);
        embedded.set_current_solution(shaken.solution().clone())?;
        embedded.start()?;
        let refined = match (
            embedded.best_solution(),
            embedded.best_evaluation(),
            embedded.best_validation(),
        ) {
            (Some(solution), Some(evaluation), Some(validation)) => {
                Some(EvaluatedSolution::new(solution, evaluation, validation))
            }
            _ => None,
        };
        embedded.dispose()?;

        let improved = refined.as_ref().is_some_and(|refined| {
            refined.validation().passed()
                && (!before.validation().passed()
                    || improvement_delta(
                        refined.evaluation().value(),
                        before.evaluation().value(),
                        minimizing,
                    ) > 0.0)
        });
        if let (true, Some(refined)) = (improved, refined) {
            debug!(event = "vns_accept", level, value = refined.evaluation().value());
            self.ns.local().install_triple(refined);
            self.level = 0;
        } else {
            self.advance_level();
        }
        Ok(())
    }
}

impl<S: Solution> LocalSearch<S> for VariableNeighbourhoodSearch<S> {
    fn local(&self) -> &LocalSearchCore<S> {
        self.ns.local()
    }

    fn local_mut(&mut self) -> &mut LocalSearchCore<S> {
        self.ns.local_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stop::MaxSteps;
    use crate::test_util::{selected_ids, subset, sum_problem};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::BTreeSet;
    use std::time::Duration;
    use strider_core::subset::neigh::{MultiSwapNeighbourhood, SingleSwapNeighbourhood};

    #[test]
    fn shaking_plus_descent_finds_the_optimum() {
        let problem = sum_problem(10, 3, 3);
        let shaking: Vec<Arc<dyn Neighbourhood<_>>> = (1..=3)
            .map(|swaps| Arc::new(MultiSwapNeighbourhood::new(swaps)) as _)
            .collect();
        let mut search = VariableNeighbourhoodSearch::new(
            problem,
            shaking,
            Arc::new(SingleSwapNeighbourhood::new()),
        )
        .unwrap();
        search.set_rng(StdRng::seed_from_u64(11)).unwrap();
        search.set_current_solution(subset(10, [0, 1, 2])).unwrap();
        search
            .add_stop_criterion(Box::new(MaxSteps::new(5)))
            .unwrap();
        search.set_checker_period(Duration::from_millis(1)).unwrap();
        search.start().unwrap();

        let best = search.best_solution().unwrap();
        assert_eq!(selected_ids(&best), BTreeSet::from([7, 8, 9]));
        assert_eq!(search.best_evaluation().unwrap().value(), 24.0);
    }

    #[test]
    fn requires_at_least_one_shaking_neighbourhood() {
        let problem = sum_problem(6, 2, 2);
        assert!(VariableNeighbourhoodSearch::new(
            problem,
            Vec::new(),
            Arc::new(SingleSwapNeighbourhood::new()),
        )
        .is_err());
    }
}

//! Fixed-temperature Metropolis search.

use std::sync::Arc;

use rand::Rng;

use strider_core::error::{Result, StriderError};
use strider_core::eval::improvement_delta;
use strider_core::neigh::Neighbourhood;
use strider_core::problem::Problem;
use strider_core::solution::Solution;

use crate::local::{LocalSearch, LocalSearchCore};
use crate::neigh_search::NeighbourhoodSearchCore;
use crate::search::{Search, SearchCore};

/// Metropolis search at a fixed temperature `T > 0`.
///
/// Every step samples a random neighbour. A valid improving neighbour
/// is always accepted; a valid non-improving one is accepted with
/// probability `exp(Δ/T)` where `Δ` is the (negative) signed
/// improvement. Higher temperatures accept more freely.
///
/// The temperature must be calibrated to the scale of the evaluations:
/// too high impedes convergence, too low gets stuck in local optima.
/// The search terminates internally only when no random neighbour can
/// be sampled.
pub struct MetropolisSearch<S: Solution> {
    ns: NeighbourhoodSearchCore<S>,
    temperature: f64,
}

impl<S: Solution> MetropolisSearch<S> {
    pub fn new(
        problem: Arc<dyn Problem<S>>,
        neighbourhood: Arc<dyn Neighbourhood<S>>,
        temperature: f64,
    ) -> Result<Self> {
        if temperature <= 0.0 {
            return Err(StriderError::Configuration(format!(
                "metropolis temperature must be strictly positive, got {temperature}"
            )));
        }
        Ok(Self {
            ns: NeighbourhoodSearchCore::single("MetropolisSearch", problem, neighbourhood),
            temperature,
        })
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    pub fn set_temperature(&mut self, temperature: f64) -> Result<()> {
        if temperature <= 0.0 {
            return Err(StriderError::Configuration(format!(
                "metropolis temperature must be strictly positive, got {temperature}"
            )));
        }
        self.temperature = temperature;
        Ok(())
    }

    /// Replaces the neighbourhood. Only allowed while the search is
    /// idle.
    pub fn set_neighbourhood(&mut self, neighbourhood: Arc<dyn Neighbourhood<S>>) -> Result<()> {
        self.ns.set_neighbourhood(neighbourhood)
    }

    pub(crate) fn ns(&self) -> &NeighbourhoodSearchCore<S> {
        &self.ns
    }
}

impl<S: Solution> Search<S> for MetropolisSearch<S> {
    fn core(&self) -> &SearchCore<S> {
        self.ns.local().core()
    }

    fn core_mut(&mut self) -> &mut SearchCore<S> {
        self.ns.local_mut().core_mut()
    }

    fn init(&mut self) -> Result<()> {
        self.ns.local_mut().init_current()
    }

    fn search_step(&mut self) -> Result<()> {
        let mv = match self.ns.random_move() {
            Some(mv) => mv,
            None => {
                self.core().shared().request_stop();
                return Ok(());
            }
        };
        if !self.ns.validate_move(mv.as_ref())?.passed() {
            self.ns.reject();
            return Ok(());
        }
        if self.ns.is_improvement(mv.as_ref())? {
            self.ns.accept(mv.as_ref())?;
            return Ok(());
        }
        let evaluation = self.ns.evaluate_move(mv.as_ref())?;
        let current_value = self
            .ns
            .local()
            .current_value()
            .ok_or_else(|| StriderError::Search("no current solution".to_string()))?;
        let minimizing = self.core().is_minimizing();
        let delta = improvement_delta(evaluation.value(), current_value, minimizing);
        let roll: f64 = self.core_mut().rng_mut().random();
        if (delta / self.temperature).exp() > roll {
            self.ns.accept(mv.as_ref())?;
        } else {
            self.ns.reject();
        }
        Ok(())
    }
}

impl<S: Solution> LocalSearch<S> for MetropolisSearch<S> {
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
    use crate::test_util::{subset, sum_problem};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::time::Duration;
    use strider_core::subset::neigh::SingleSwapNeighbourhood;

    #[test]
    fn rejects_non_positive_temperatures() {
        let problem = sum_problem(10, 3, 3);
        assert!(MetropolisSearch::new(
            problem.clone(),
            Arc::new(SingleSwapNeighbourhood::new()),
            0.0
        )
        .is_err());
        let mut search =
            MetropolisSearch::new(problem, Arc::new(SingleSwapNeighbourhood::new()), 1.0).unwrap();
        assert!(search.set_temperature(-1.0).is_err());
        search.set_temperature(2.5).unwrap();
        assert_eq!(search.temperature(), 2.5);
    }

    #[test]
    fn a_hot_system_accepts_most_moves() {
        let problem = sum_problem(10, 3, 3);
        let mut search =
            MetropolisSearch::new(problem, Arc::new(SingleSwapNeighbourhood::new()), 1000.0)
                .unwrap();
        search.set_rng(StdRng::seed_from_u64(7)).unwrap();
        search.set_current_solution(subset(10, [7, 8, 9])).unwrap();
        search
            .add_stop_criterion(Box::new(MaxSteps::new(1_000)))
            .unwrap();
        search.set_checker_period(Duration::from_millis(1)).unwrap();
        search.start().unwrap();

        let accepted = search.accepted_moves() as f64;
        let considered = (search.accepted_moves() + search.rejected_moves()) as f64;
        assert!(search.steps() >= 1_000);
        assert!(accepted / considered > 0.5);
    }

    #[test]
    fn a_cold_system_never_leaves_the_optimum() {
        let problem = sum_problem(10, 3, 3);
        let mut search =
            MetropolisSearch::new(problem, Arc::new(SingleSwapNeighbourhood::new()), 0.001)
                .unwrap();
        search.set_rng(StdRng::seed_from_u64(7)).unwrap();
        search.set_current_solution(subset(10, [7, 8, 9])).unwrap();
        search
            .add_stop_criterion(Box::new(MaxSteps::new(1_000)))
            .unwrap();
        search.set_checker_period(Duration::from_millis(1)).unwrap();
        search.start().unwrap();

        let considered = (search.accepted_moves() + search.rejected_moves()) as f64;
        assert!(search.accepted_moves() as f64 / considered < 0.01);
        assert_eq!(search.best_evaluation().unwrap().value(), 24.0);
    }
}

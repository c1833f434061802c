//! Tabu search.

mod memory;

pub use memory::{
    FullSolutionTabuMemory, SubsetIdTabuMemory, TabuMemory, VisitedSolutionTabuMemory,
};

use std::sync::Arc;

use rand::seq::SliceRandom;

use strider_core::error::Result;
use strider_core::eval::{improvement_delta, Evaluation};
use strider_core::neigh::{Move, Neighbourhood};
use strider_core::problem::Problem;
use strider_core::solution::Solution;

use crate::local::{LocalSearch, LocalSearchCore};
use crate::neigh_search::NeighbourhoodSearchCore;
use crate::search::{Search, SearchCore};

/// Tabu search: every step enumerates the neighbourhood and accepts
/// the best admissible move, even when it worsens the current
/// solution. A move is admissible if the attached [`TabuMemory`] does
/// not forbid it, or if it leads to a new global best (the aspiration
/// criterion). The memory observes every accepted move.
///
/// Stops when no admissible move exists; since that may never happen,
/// a stop criterion should normally be set as well.
pub struct TabuSearch<S: Solution> {
    pub(crate) ns: NeighbourhoodSearchCore<S>,
    pub(crate) memory: Box<dyn TabuMemory<S>>,
}

impl<S: Solution> TabuSearch<S> {
    pub fn new(
        problem: Arc<dyn Problem<S>>,
        neighbourhood: Arc<dyn Neighbourhood<S>>,
        memory: Box<dyn TabuMemory<S>>,
    ) -> Self {
        Self {
            ns: NeighbourhoodSearchCore::single("TabuSearch", problem, neighbourhood),
            memory,
        }
    }

    // Accepts the selected admissible move and lets the memory observe
    // the acceptance.
    pub(crate) fn accept_and_remember(&mut self, mv: &dyn Move<S>) -> Result<()> {
        if self.ns.accept(mv)? {
            if let Some(current) = self.ns.local().current() {
                self.memory.remember(mv, current.solution());
            }
        }
        Ok(())
    }
}

// The admissibility filter shared by both tabu variants: not tabu, or
// aspirating by beating the global best.
pub(crate) fn admissible_filter<'a, S: Solution>(
    memory: &'a dyn TabuMemory<S>,
    best_value: Option<f64>,
    minimizing: bool,
) -> impl FnMut(&dyn Move<S>, &S, &Arc<dyn Evaluation>) -> bool + 'a {
    move |mv, current, evaluation| {
        if !memory.is_tabu(mv, current) {
            return true;
        }
        best_value
            .map(|best| improvement_delta(evaluation.value(), best, minimizing) > 0.0)
            .unwrap_or(true)
    }
}

impl<S: Solution> Search<S> for TabuSearch<S> {
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
        let moves = self.ns.all_moves();
        let best_value = self.core().shared().counters.best_value();
        let minimizing = self.core().is_minimizing();
        let selected = {
            let mut filter = admissible_filter(self.memory.as_ref(), best_value, minimizing);
            self.ns.best_move(&moves, false, false, Some(&mut filter))?
        };
        match selected {
            Some(index) => self.accept_and_remember(moves[index].as_ref()),
            None => {
                self.core().shared().request_stop();
                Ok(())
            }
        }
    }
}

impl<S: Solution> LocalSearch<S> for TabuSearch<S> {
    fn local(&self) -> &LocalSearchCore<S> {
        self.ns.local()
    }

    fn local_mut(&mut self) -> &mut LocalSearchCore<S> {
        self.ns.local_mut()
    }

    fn set_current_solution(&mut self, solution: S) -> Result<()> {
        self.ns.local_mut().set_current_solution(solution)?;
        self.memory.clear();
        Ok(())
    }
}

/// Tabu search accepting the first admissible improving move.
///
/// Every step shuffles the enumerated moves and walks them in random
/// order: the first admissible move that improves the current solution
/// is accepted immediately. When no admissible move improves, the best
/// admissible move is accepted instead, matching ordinary tabu
/// semantics. The aspiration criterion applies unchanged.
pub struct FirstBestAdmissibleTabuSearch<S: Solution> {
    tabu: TabuSearch<S>,
}

impl<S: Solution> FirstBestAdmissibleTabuSearch<S> {
    pub fn new(
        problem: Arc<dyn Problem<S>>,
        neighbourhood: Arc<dyn Neighbourhood<S>>,
        memory: Box<dyn TabuMemory<S>>,
    ) -> Self {
        Self {
            tabu: TabuSearch {
                ns: NeighbourhoodSearchCore::single(
                    "FirstBestAdmissibleTabuSearch",
                    problem,
                    neighbourhood,
                ),
                memory,
            },
        }
    }
}

impl<S: Solution> Search<S> for FirstBestAdmissibleTabuSearch<S> {
    fn core(&self) -> &SearchCore<S> {
        self.tabu.ns.local().core()
    }

    fn core_mut(&mut self) -> &mut SearchCore<S> {
        self.tabu.ns.local_mut().core_mut()
    }

    fn init(&mut self) -> Result<()> {
        self.tabu.ns.local_mut().init_current()
    }

    fn search_step(&mut self) -> Result<()> {
        let mut moves = self.tabu.ns.all_moves();
        moves.shuffle(self.core_mut().rng_mut());
        let best_value = self.core().shared().counters.best_value();
        let minimizing = self.core().is_minimizing();
        let selected = {
            let mut filter =
                admissible_filter(self.tabu.memory.as_ref(), best_value, minimizing);
            self.tabu.ns.best_move(&moves, false, true, Some(&mut filter))?
        };
        match selected {
            Some(index) => self.tabu.accept_and_remember(moves[index].as_ref()),
            None => {
                self.core().shared().request_stop();
                Ok(())
            }
        }
    }
}

impl<S: Solution> LocalSearch<S> for FirstBestAdmissibleTabuSearch<S> {
    fn local(&self) -> &LocalSearchCore<S> {
        self.tabu.ns.local()
    }

    fn local_mut(&mut self) -> &mut LocalSearchCore<S> {
        self.tabu.ns.local_mut()
    }

    fn set_current_solution(&mut self, solution: S) -> Result<()> {
        self.tabu.ns.local_mut().set_current_solution(solution)?;
        self.tabu.memory.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::SearchStatus;
    use crate::stop::MaxSteps;
    use crate::test_util::{selected_ids, subset, sum_problem};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::BTreeSet;
    use std::time::Duration;
    use strider_core::neigh::Move;
    use strider_core::subset::neigh::SingleSwapNeighbourhood;
    use strider_core::subset::SubsetSolution;

    /// Declares every move tabu, so only the aspiration criterion can
    /// admit moves.
    struct RejectAllTabuMemory;

    impl TabuMemory<SubsetSolution> for RejectAllTabuMemory {
        fn is_tabu(&self, _mv: &dyn Move<SubsetSolution>, _current: &SubsetSolution) -> bool {
            true
        }

        fn remember(&mut self, _mv: &dyn Move<SubsetSolution>, _new_solution: &SubsetSolution) {}

        fn clear(&mut self) {}
    }

    #[test]
    fn aspiration_admits_tabu_moves_that_beat_the_best() {
        let problem = sum_problem(5, 2, 2);
        let mut search = TabuSearch::new(
            problem,
            Arc::new(SingleSwapNeighbourhood::new()),
            Box::new(RejectAllTabuMemory),
        );
        search.set_current_solution(subset(5, [0, 1])).unwrap();
        // No stop criterion: once nothing beats the best any more,
        // every move is tabu and the search stops on its own.
        search.start().unwrap();

        assert_eq!(search.status(), SearchStatus::Idle);
        let best = search.best_solution().unwrap();
        assert_eq!(selected_ids(&best), BTreeSet::from([3, 4]));
        assert_eq!(search.best_evaluation().unwrap().value(), 7.0);
    }

    #[test]
    fn id_memory_guides_the_search_to_the_optimum() {
        let problem = sum_problem(6, 2, 2);
        let mut search = TabuSearch::new(
            problem,
            Arc::new(SingleSwapNeighbourhood::new()),
            Box::new(SubsetIdTabuMemory::new(2)),
        );
        search.set_rng(StdRng::seed_from_u64(3)).unwrap();
        search.set_current_solution(subset(6, [0, 1])).unwrap();
        search
            .add_stop_criterion(Box::new(MaxSteps::new(50)))
            .unwrap();
        search.set_checker_period(Duration::from_millis(1)).unwrap();
        search.start().unwrap();

        assert_eq!(search.best_evaluation().unwrap().value(), 9.0);
        assert!(search.accepted_moves() >= 1);
    }

    #[test]
    fn first_best_admissible_reaches_the_same_optimum() {
        let problem = sum_problem(6, 2, 2);
        let mut search = FirstBestAdmissibleTabuSearch::new(
            problem,
            Arc::new(SingleSwapNeighbourhood::new()),
            Box::new(SubsetIdTabuMemory::new(2)),
        );
        search.set_rng(StdRng::seed_from_u64(3)).unwrap();
        search.set_current_solution(subset(6, [0, 1])).unwrap();
        search
            .add_stop_criterion(Box::new(MaxSteps::new(50)))
            .unwrap();
        search.set_checker_period(Duration::from_millis(1)).unwrap();
        search.start().unwrap();

        assert_eq!(search.best_evaluation().unwrap().value(), 9.0);
    }

    #[test]
    fn installing_a_custom_solution_clears_the_memory() {
        let problem = sum_problem(6, 2, 2);
        let mut memory = SubsetIdTabuMemory::new(4);
        memory.remember(&strider_core::subset::SubsetMove::addition(5), &subset(6, [5, 1]));
        let mut search = TabuSearch::new(
            problem,
            Arc::new(SingleSwapNeighbourhood::new()),
            Box::new(memory),
        );
        search.set_current_solution(subset(6, [0, 1])).unwrap();
        // With the memory cleared, the remembered id 5 is free again
        // and the search reaches {4, 5}.
        search
            .add_stop_criterion(Box::new(MaxSteps::new(50)))
            .unwrap();
        search.set_checker_period(Duration::from_millis(1)).unwrap();
        search.start().unwrap();
        assert_eq!(search.best_evaluation().unwrap().value(), 9.0);
    }
}

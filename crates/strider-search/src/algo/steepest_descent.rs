//! Steepest descent.

use std::sync::Arc;

use strider_core::error::Result;
use strider_core::neigh::Neighbourhood;
use strider_core::problem::Problem;
use strider_core::solution::Solution;

use crate::local::{LocalSearch, LocalSearchCore};
use crate::neigh_search::NeighbourhoodSearchCore;
use crate::search::{Search, SearchCore};

/// Steepest descent: every step enumerates the entire neighbourhood
/// and accepts the most improving valid move. Stops as soon as no move
/// improves the current solution, i.e. in a local optimum.
pub struct SteepestDescent<S: Solution> {
    ns: NeighbourhoodSearchCore<S>,
}

impl<S: Solution> SteepestDescent<S> {
    pub fn new(problem: Arc<dyn Problem<S>>, neighbourhood: Arc<dyn Neighbourhood<S>>) -> Self {
        Self {
            ns: NeighbourhoodSearchCore::single("SteepestDescent", problem, neighbourhood),
        }
    }
}

impl<S: Solution> Search<S> for SteepestDescent<S> {
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
        match self.ns.best_move(&moves, true, false, None)? {
            Some(index) => {
                self.ns.accept(moves[index].as_ref())?;
                Ok(())
            }
            None => {
                self.core().shared().request_stop();
                Ok(())
            }
        }
    }
}

impl<S: Solution> LocalSearch<S> for SteepestDescent<S> {
    fn local(&self) -> &LocalSearchCore<S> {
        self.ns.local()
    }

    fn local_mut(&mut self) -> &mut LocalSearchCore<S> {
        self.ns.local_mut()
    }
}

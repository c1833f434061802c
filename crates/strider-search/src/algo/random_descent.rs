//! Random descent.

use std::sync::Arc;

use strider_core::error::Result;
use strider_core::neigh::Neighbourhood;
use strider_core::problem::Problem;
use strider_core::solution::Solution;

use crate::local::{LocalSearch, LocalSearchCore};
use crate::neigh_search::NeighbourhoodSearchCore;
use crate::search::{Search, SearchCore};

/// Basic random descent: every step samples one random neighbour and
/// accepts it only if it improves the current solution.
///
/// Random descent rarely comes to a natural end; it terminates
/// internally only when the neighbourhood cannot produce any move, so
/// it normally relies on stop criteria.
pub struct RandomDescent<S: Solution> {
    ns: NeighbourhoodSearchCore<S>,
}

impl<S: Solution> RandomDescent<S> {
    pub fn new(problem: Arc<dyn Problem<S>>, neighbourhood: Arc<dyn Neighbourhood<S>>) -> Self {
        Self {
            ns: NeighbourhoodSearchCore::single("RandomDescent", problem, neighbourhood),
        }
    }
}

impl<S: Solution> Search<S> for RandomDescent<S> {
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
        match self.ns.random_move() {
            Some(mv) => {
                if self.ns.is_improvement(mv.as_ref())? {
                    self.ns.accept(mv.as_ref())?;
                } else {
                    self.ns.reject();
                }
                Ok(())
            }
            None => {
                self.core().shared().request_stop();
                Ok(())
            }
        }
    }
}

impl<S: Solution> LocalSearch<S> for RandomDescent<S> {
    fn local(&self) -> &LocalSearchCore<S> {
        self.ns.local()
    }

    fn local_mut(&mut self) -> &mut LocalSearchCore<S> {
        self.ns.local_mut()
    }
}

//! Search factories.
//!
//! Factories let algorithms and embedding applications create searches
//! on demand, e.g. the embedded local search of a variable
//! neighbourhood search or the replicas of a parallel tempering
//! search. All factory traits are implemented for matching closures.

use std::sync::Arc;

use strider_core::error::Result;
use strider_core::neigh::Neighbourhood;
use strider_core::problem::Problem;
use strider_core::solution::Solution;

use crate::algo::MetropolisSearch;
use crate::local::LocalSearch;
use crate::search::Search;

/// Creates a search for a given problem.
pub trait SearchFactory<S: Solution>: Send + Sync {
    fn create(&self, problem: Arc<dyn Problem<S>>) -> Box<dyn Search<S>>;
}

impl<S, F> SearchFactory<S> for F
where
    S: Solution,
    F: Fn(Arc<dyn Problem<S>>) -> Box<dyn Search<S>> + Send + Sync,
{
    fn create(&self, problem: Arc<dyn Problem<S>>) -> Box<dyn Search<S>> {
        self(problem)
    }
}

/// Creates a local search for a given problem.
pub trait LocalSearchFactory<S: Solution>: Send + Sync {
    fn create(&self, problem: Arc<dyn Problem<S>>) -> Box<dyn LocalSearch<S>>;
}

impl<S, F> LocalSearchFactory<S> for F
where
    S: Solution,
    F: Fn(Arc<dyn Problem<S>>) -> Box<dyn LocalSearch<S>> + Send + Sync,
{
    fn create(&self, problem: Arc<dyn Problem<S>>) -> Box<dyn LocalSearch<S>> {
        self(problem)
    }
}

/// Creates a Metropolis search with the given temperature, used by
/// parallel tempering to customise its replicas.
pub trait MetropolisSearchFactory<S: Solution>: Send + Sync {
    fn create(
        &self,
        problem: Arc<dyn Problem<S>>,
        neighbourhood: Arc<dyn Neighbourhood<S>>,
        temperature: f64,
    ) -> Result<MetropolisSearch<S>>;
}

impl<S, F> MetropolisSearchFactory<S> for F
where
    S: Solution,
    F: Fn(Arc<dyn Problem<S>>, Arc<dyn Neighbourhood<S>>, f64) -> Result<MetropolisSearch<S>>
        + Send
        + Sync,
{
    fn create(
        &self,
        problem: Arc<dyn Problem<S>>,
        neighbourhood: Arc<dyn Neighbourhood<S>>,
        temperature: f64,
    ) -> Result<MetropolisSearch<S>> {
        self(problem, neighbourhood, temperature)
    }
}

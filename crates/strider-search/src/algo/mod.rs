//! Search algorithms.
//!
//! Single-neighbourhood trajectory algorithms (random descent,
//! steepest descent, Metropolis, tabu variants), multi-neighbourhood
//! and composed variants (variable neighbourhood search, piped local
//! search), parallel engines (parallel tempering, basic parallel
//! search), and exhaustive / greedy construction searches.

mod exhaustive;
mod lr_subset;
mod metropolis;
pub(crate) mod parallel;
mod piped;
mod random_descent;
mod steepest_descent;
pub mod tabu;
mod tempering;
mod vns;

pub use exhaustive::ExhaustiveSearch;
pub use lr_subset::LrSubsetSearch;
pub use metropolis::MetropolisSearch;
pub use parallel::BasicParallelSearch;
pub use piped::PipedLocalSearch;
pub use random_descent::RandomDescent;
pub use steepest_descent::SteepestDescent;
pub use tabu::{FirstBestAdmissibleTabuSearch, TabuSearch};
pub use tempering::ParallelTempering;
pub use vns::VariableNeighbourhoodSearch;

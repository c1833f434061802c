//! Strider - A trajectory metaheuristic local search framework
//!
//! Strider solves combinatorial optimization problems of the shape
//! "find a solution that maximizes or minimizes an objective subject
//! to validity constraints" by iteratively transforming a current
//! solution through neighbourhood moves.
//!
//! The framework splits into two layers, re-exported here:
//! - [`strider_core`]: the problem contract — solutions, moves,
//!   neighbourhoods, evaluation/validation value objects with
//!   incremental (delta) specialisations, and the subset selection
//!   family.
//! - [`strider_search`]: the search engine — lifecycle, listeners,
//!   stop criteria, and the algorithms from random descent up to
//!   parallel tempering.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use strider::core::eval::{Evaluation, SimpleEvaluation};
//! use strider::core::objective::Objective;
//! use strider::core::subset::neigh::SingleSwapNeighbourhood;
//! use strider::core::subset::{IdentifiedData, SubsetProblem, SubsetSolution};
//! use strider::search::{Search, SteepestDescent};
//!
//! struct Items(u32);
//!
//! impl IdentifiedData for Items {
//!     fn ids(&self) -> Vec<u32> {
//!         (0..self.0).collect()
//!     }
//! }
//!
//! struct SumOfIds;
//!
//! impl Objective<SubsetSolution, Items> for SumOfIds {
//!     fn evaluate(&self, solution: &SubsetSolution, _data: &Items) -> Arc<dyn Evaluation> {
//!         let sum: u32 = solution.selected_ids().sum();
//!         Arc::new(SimpleEvaluation::new(sum as f64))
//!     }
//! }
//!
//! let problem = Arc::new(SubsetProblem::fixed_size(Items(10), Arc::new(SumOfIds), 3).unwrap());
//! let mut search = SteepestDescent::new(problem, Arc::new(SingleSwapNeighbourhood::new()));
//! search.start().unwrap();
//! assert_eq!(search.best_evaluation().unwrap().value(), 24.0);
//! ```

pub use strider_core as core;
pub use strider_search as search;

pub use strider_core::{
    improvement_delta, ClosureMove, Constraint, Evaluation, GenericProblem, Move, Neighbourhood,
    Objective, PenalizedEvaluation, PenalizingConstraint, PenalizingValidation, Problem,
    RandomSolutionGenerator, Result, SimpleEvaluation, SimplePenalizingValidation,
    SimpleValidation, Solution, StriderError, SubsetValidation, UnanimousValidation, Validation,
};
pub use strider_search::{
    BasicParallelSearch, EvaluatedSolution, ExhaustiveSearch, FirstBestAdmissibleTabuSearch,
    LocalSearch, LocalSearchFactory, LrSubsetSearch, MaxRuntime, MaxSteps,
    MaxStepsWithoutImprovement, MaxTimeWithoutImprovement, MetropolisSearch,
    MetropolisSearchFactory, MinDelta, ParallelTempering, PipedLocalSearch, RandomDescent,
    Search, SearchFactory, SearchListener, SearchStatus, SteepestDescent, StopCriterion,
    TabuSearch, TargetValue, VariableNeighbourhoodSearch,
};

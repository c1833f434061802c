//! strider-core - Problem contract for trajectory local search
//!
//! This crate provides the building blocks a search engine consumes:
//! - Evaluation and validation value objects with aggregation
//! - Solution, move and neighbourhood contracts
//! - Objective and constraint traits with delta specialisations
//! - Generic problem composition and random solution generation
//! - The subset selection family (solution, moves, neighbourhoods)

pub mod constraint;
pub mod error;
pub mod eval;
pub mod neigh;
pub mod objective;
pub mod problem;
pub mod random;
pub mod solution;
pub mod subset;
pub mod validation;

pub use constraint::{Constraint, PenalizingConstraint};
pub use error::{Result, StriderError};
pub use eval::{improvement_delta, Evaluation, PenalizedEvaluation, SimpleEvaluation};
pub use neigh::{ClosureMove, Move, Neighbourhood};
pub use objective::Objective;
pub use problem::{GenericProblem, Problem};
pub use random::RandomSolutionGenerator;
pub use solution::Solution;
pub use validation::{
    PenalizingValidation, SimplePenalizingValidation, SimpleValidation, SubsetValidation,
    UnanimousValidation, Validation,
};

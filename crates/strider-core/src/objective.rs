//! Objective function contract.

use std::sync::Arc;

use crate::error::Result;
use crate::eval::Evaluation;
use crate::neigh::Move;
use crate::solution::Solution;

/// Scores solutions against the underlying problem data.
///
/// The orientation returned by [`is_minimizing`](Objective::is_minimizing)
/// must be a stable property of the objective instance.
pub trait Objective<S: Solution, D>: Send + Sync {
    /// Computes the evaluation of the given solution.
    fn evaluate(&self, solution: &S, data: &D) -> Arc<dyn Evaluation>;

    /// Computes the evaluation of the neighbour obtained by applying
    /// `mv` to `current`, given the current solution's evaluation.
    ///
    /// The default applies the move, fully evaluates, and undoes it
    /// again. Overriding with a true delta computation is the primary
    /// performance lever of the framework.
    fn evaluate_delta(
        &self,
        mv: &dyn Move<S>,
        current: &mut S,
        current_evaluation: &Arc<dyn Evaluation>,
        data: &D,
    ) -> Result<Arc<dyn Evaluation>> {
        let _ = current_evaluation;
        mv.apply(current)?;
        let evaluation = self.evaluate(current, data);
        mv.undo(current)?;
        Ok(evaluation)
    }

    /// Whether lower evaluations are better. Defaults to maximizing.
    fn is_minimizing(&self) -> bool {
        false
    }
}

//! Constraint contracts.

use std::sync::Arc;

use crate::error::Result;
use crate::neigh::Move;
use crate::solution::Solution;
use crate::validation::{PenalizingValidation, Validation};

/// A mandatory constraint: solutions failing it are discarded
/// regardless of their evaluation.
pub trait Constraint<S: Solution, D>: Send + Sync {
    /// Validates the given solution.
    fn validate(&self, solution: &S, data: &D) -> Arc<dyn Validation>;

    /// Validates the neighbour obtained by applying `mv` to `current`,
    /// given the current solution's validation.
    ///
    /// The default applies the move, fully validates, and undoes it
    /// again; implementations are encouraged to override with a true
    /// delta computation.
    fn validate_delta(
        &self,
        mv: &dyn Move<S>,
        current: &mut S,
        current_validation: &Arc<dyn Validation>,
        data: &D,
    ) -> Result<Arc<dyn Validation>> {
        let _ = current_validation;
        mv.apply(current)?;
        let validation = self.validate(current, data);
        mv.undo(current)?;
        Ok(validation)
    }
}

/// A soft constraint whose violation assigns a penalty to the
/// evaluation instead of invalidating the solution.
///
/// Implementors also implement [`Constraint`], typically by delegating
/// `validate` to [`validate_penalizing`](PenalizingConstraint::validate_penalizing).
pub trait PenalizingConstraint<S: Solution, D>: Constraint<S, D> {
    /// Validates the given solution, assigning a penalty on violation.
    fn validate_penalizing(&self, solution: &S, data: &D) -> Arc<dyn PenalizingValidation>;

    /// Delta counterpart of
    /// [`validate_penalizing`](PenalizingConstraint::validate_penalizing).
    fn validate_penalizing_delta(
        &self,
        mv: &dyn Move<S>,
        current: &mut S,
        current_validation: &Arc<dyn PenalizingValidation>,
        data: &D,
    ) -> Result<Arc<dyn PenalizingValidation>> {
        let _ = current_validation;
        mv.apply(current)?;
        let validation = self.validate_penalizing(current, data);
        mv.undo(current)?;
        Ok(validation)
    }
}

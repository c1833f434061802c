//! Move and neighbourhood contracts.

use std::any::Any;
use std::fmt;

use rand::RngCore;

use crate::error::Result;
use crate::solution::Solution;

/// A reversible transformation of a solution.
///
/// `undo` restores the state observed immediately before the paired
/// `apply`. It is only guaranteed to work when the solution has not
/// been modified in between, and when called at most once per apply.
///
/// Delta evaluators dispatch on the concrete move type through
/// [`Move::as_any`]. Framework-owned move kinds (such as the subset
/// moves) are closed enums that delta implementations match on; any
/// other implementation is an opaque move, which full evaluation
/// handles fine but a delta specialisation rejects with
/// [`StriderError::IncompatibleDelta`](crate::StriderError::IncompatibleDelta).
pub trait Move<S: Solution>: Any + Send + Sync + fmt::Debug {
    /// Applies this move to the given solution.
    fn apply(&self, solution: &mut S) -> Result<()>;

    /// Undoes this move, restoring the state before the paired apply.
    fn undo(&self, solution: &mut S) -> Result<()>;

    /// Downcasting support for delta evaluators.
    fn as_any(&self) -> &dyn Any;
}

/// Factory of moves for a given current solution.
///
/// Invariant: `random_move` returns `None` exactly when `all_moves` is
/// empty for that solution, and every returned move is applicable to
/// the solution it was generated for. Enumeration order is
/// unspecified unless a concrete neighbourhood documents otherwise.
pub trait Neighbourhood<S: Solution>: Send + Sync {
    /// Generates a single random move, or `None` if the solution has
    /// no neighbours.
    fn random_move(&self, solution: &S, rng: &mut dyn RngCore) -> Option<Box<dyn Move<S>>>;

    /// Generates all moves transforming the solution into a neighbour.
    fn all_moves(&self, solution: &S) -> Vec<Box<dyn Move<S>>>;
}

/// Opaque move carrying an apply/undo closure pair.
///
/// Useful for ad-hoc user-defined moves. Being opaque, it can only be
/// processed by full (non-delta) evaluation.
pub struct ClosureMove<S> {
    apply: Box<dyn Fn(&mut S) -> Result<()> + Send + Sync>,
    undo: Box<dyn Fn(&mut S) -> Result<()> + Send + Sync>,
}

impl<S: Solution> ClosureMove<S> {
    pub fn new(
        apply: impl Fn(&mut S) -> Result<()> + Send + Sync + 'static,
        undo: impl Fn(&mut S) -> Result<()> + Send + Sync + 'static,
    ) -> Self {
        Self {
            apply: Box::new(apply),
            undo: Box::new(undo),
        }
    }
}

impl<S> fmt::Debug for ClosureMove<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClosureMove").finish_non_exhaustive()
    }
}

impl<S: Solution> Move<S> for ClosureMove<S> {
    fn apply(&self, solution: &mut S) -> Result<()> {
        (self.apply)(solution)
    }

    fn undo(&self, solution: &mut S) -> Result<()> {
        (self.undo)(solution)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

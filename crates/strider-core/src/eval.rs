//! Evaluation value objects.
//!
//! An evaluation is the immutable numeric outcome of applying an
//! objective (and any penalizing constraints) to a solution. Searches
//! never inspect the concrete type; they compare scalar values through
//! [`improvement_delta`]. Delta-aware objectives downcast the previous
//! evaluation through [`Evaluation::as_any`] to reuse cached state.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::validation::PenalizingValidation;

/// Numeric score of a solution.
///
/// Implementations are immutable once handed to the search engine and
/// are shared as `Arc<dyn Evaluation>`.
pub trait Evaluation: Any + Send + Sync + fmt::Debug {
    /// Scalar value of this evaluation.
    fn value(&self) -> f64;

    /// Downcasting support for delta evaluators.
    fn as_any(&self) -> &dyn Any;
}

/// Signed improvement of `candidate` over `reference` under the given
/// orientation. Positive means `candidate` is strictly better.
pub fn improvement_delta(candidate: f64, reference: f64, minimizing: bool) -> f64 {
    if minimizing {
        reference - candidate
    } else {
        candidate - reference
    }
}

/// Evaluation consisting of a single value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimpleEvaluation {
    value: f64,
}

impl SimpleEvaluation {
    pub fn new(value: f64) -> Self {
        Self { value }
    }
}

impl Evaluation for SimpleEvaluation {
    #[inline]
    fn value(&self) -> f64 {
        self.value
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl fmt::Display for SimpleEvaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

/// Evaluation combining a base evaluation with the penalties assigned
/// by a problem's penalizing constraints.
///
/// The contained penalizing validations are index-aligned with the
/// owning problem's penalizing-constraint list, so that delta
/// evaluation can retrieve each constraint's previous validation
/// without recomputation. Penalties are subtracted from the base value
/// when maximizing and added when minimizing; a passed penalizing
/// validation carries a zero penalty.
#[derive(Debug)]
pub struct PenalizedEvaluation {
    evaluation: Arc<dyn Evaluation>,
    penalties: Vec<Arc<dyn PenalizingValidation>>,
    minimizing: bool,
    value: f64,
}

impl PenalizedEvaluation {
    pub fn new(
        evaluation: Arc<dyn Evaluation>,
        penalties: Vec<Arc<dyn PenalizingValidation>>,
        minimizing: bool,
    ) -> Self {
        let total: f64 = penalties.iter().map(|p| p.penalty()).sum();
        let value = if minimizing {
            evaluation.value() + total
        } else {
            evaluation.value() - total
        };
        Self {
            evaluation,
            penalties,
            minimizing,
            value,
        }
    }

    /// The wrapped evaluation, without penalties.
    pub fn evaluation(&self) -> &Arc<dyn Evaluation> {
        &self.evaluation
    }

    /// Penalizing validation of the constraint at `index` in the
    /// owning problem's penalizing-constraint list.
    pub fn penalizing_validation(&self, index: usize) -> Option<&Arc<dyn PenalizingValidation>> {
        self.penalties.get(index)
    }

    pub fn is_minimizing(&self) -> bool {
        self.minimizing
    }
}

impl Evaluation for PenalizedEvaluation {
    #[inline]
    fn value(&self) -> f64 {
        self.value
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::SimplePenalizingValidation;

    fn penalty(p: f64) -> Arc<dyn PenalizingValidation> {
        Arc::new(SimplePenalizingValidation::failed(p))
    }

    #[test]
    fn improvement_delta_respects_orientation() {
        assert_eq!(improvement_delta(10.0, 4.0, false), 6.0);
        assert_eq!(improvement_delta(10.0, 4.0, true), -6.0);
        assert_eq!(improvement_delta(4.0, 10.0, true), 6.0);
    }

    #[test]
    fn penalties_subtract_when_maximizing() {
        let eval = PenalizedEvaluation::new(
            Arc::new(SimpleEvaluation::new(24.0)),
            vec![penalty(5.0)],
            false,
        );
        assert_eq!(eval.value(), 19.0);
    }

    #[test]
    fn penalties_add_when_minimizing() {
        let eval = PenalizedEvaluation::new(
            Arc::new(SimpleEvaluation::new(24.0)),
            vec![penalty(5.0)],
            true,
        );
        assert_eq!(eval.value(), 29.0);
    }

    #[test]
    fn passed_penalizing_validations_do_not_penalize() {
        let eval = PenalizedEvaluation::new(
            Arc::new(SimpleEvaluation::new(7.5)),
            vec![Arc::new(SimplePenalizingValidation::passed())],
            false,
        );
        assert_eq!(eval.value(), 7.5);
    }

    #[test]
    fn retrieves_penalizing_validation_by_index() {
        let eval = PenalizedEvaluation::new(
            Arc::new(SimpleEvaluation::new(0.0)),
            vec![penalty(1.0), penalty(2.0)],
            false,
        );
        assert_eq!(eval.penalizing_validation(1).unwrap().penalty(), 2.0);
        assert!(eval.penalizing_validation(2).is_none());
    }
}

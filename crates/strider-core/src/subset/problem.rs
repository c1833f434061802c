//! Subset selection problems.

use std::sync::Arc;

use rand::seq::IndexedRandom;
use rand::{Rng, RngCore};

use crate::constraint::{Constraint, PenalizingConstraint};
use crate::error::{Result, StriderError};
use crate::eval::Evaluation;
use crate::neigh::Move;
use crate::objective::Objective;
use crate::problem::{GenericProblem, Problem};
use crate::subset::moves::as_subset_move;
use crate::subset::solution::{IdComparator, SubsetSolution};
use crate::validation::{SubsetValidation, Validation};

/// Data from which a subset is selected. Every item is identified by a
/// unique integer id.
pub trait IdentifiedData: Send + Sync {
    fn ids(&self) -> Vec<u32>;
}

/// Problem of selecting a subset of the data's items, with an imposed
/// minimum and maximum subset size.
///
/// Validation wraps the aggregated constraint validation of the
/// underlying generic problem in a [`SubsetValidation`] that also
/// checks the size bounds. The built-in random solution generator
/// draws a uniform size within the bounds and samples the selection
/// uniformly.
pub struct SubsetProblem<D: IdentifiedData> {
    inner: GenericProblem<SubsetSolution, D>,
    min_size: usize,
    max_size: usize,
    order: Option<IdComparator>,
}

impl<D: IdentifiedData + 'static> SubsetProblem<D> {
    /// Creates a subset problem with the given size bounds, imposing
    /// no order on the ids.
    pub fn new(
        data: D,
        objective: Arc<dyn Objective<SubsetSolution, D>>,
        min_size: usize,
        max_size: usize,
    ) -> Result<Self> {
        Self::with_order(data, objective, min_size, max_size, None)
    }

    /// Creates a subset problem with a fixed subset size.
    pub fn fixed_size(
        data: D,
        objective: Arc<dyn Objective<SubsetSolution, D>>,
        size: usize,
    ) -> Result<Self> {
        Self::new(data, objective, size, size)
    }

    /// Creates a subset problem without size limits.
    pub fn unbounded(data: D, objective: Arc<dyn Objective<SubsetSolution, D>>) -> Result<Self> {
        let n = data.ids().len();
        Self::new(data, objective, 0, n)
    }

    /// Creates a subset problem whose generated solutions keep their
    /// ids ordered by the given comparator.
    pub fn with_order(
        data: D,
        objective: Arc<dyn Objective<SubsetSolution, D>>,
        min_size: usize,
        max_size: usize,
        order: Option<IdComparator>,
    ) -> Result<Self> {
        let n = data.ids().len();
        if n == 0 {
            return Err(StriderError::Configuration(
                "subset problem requires data with at least one id".to_string(),
            ));
        }
        if max_size > n {
            return Err(StriderError::Configuration(format!(
                "maximum subset size {max_size} exceeds the number of items {n}"
            )));
        }
        if min_size > max_size {
            return Err(StriderError::Configuration(format!(
                "minimum subset size {min_size} exceeds maximum subset size {max_size}"
            )));
        }
        let generator_order = order.clone();
        let generator = move |rng: &mut dyn RngCore, data: &D| {
            let ids = data.ids();
            let size = rng.random_range(min_size..=max_size);
            let selection: Vec<u32> = ids.choose_multiple(rng, size).copied().collect();
            SubsetSolution::assemble(ids, selection, generator_order.clone())
        };
        Ok(Self {
            inner: GenericProblem::new(data, objective, Arc::new(generator)),
            min_size,
            max_size,
            order,
        })
    }

    pub fn data(&self) -> &D {
        self.inner.data()
    }

    pub fn min_size(&self) -> usize {
        self.min_size
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Adds a mandatory constraint. Must not be called while a search
    /// is solving this problem.
    pub fn add_mandatory_constraint(
        &mut self,
        constraint: Arc<dyn Constraint<SubsetSolution, D>>,
    ) {
        self.inner.add_mandatory_constraint(constraint);
    }

    /// Adds a penalizing constraint. Must not be called while a search
    /// is solving this problem.
    pub fn add_penalizing_constraint(
        &mut self,
        constraint: Arc<dyn PenalizingConstraint<SubsetSolution, D>>,
    ) {
        self.inner.add_penalizing_constraint(constraint);
    }

    /// All violated constraints, mandatory and penalizing.
    pub fn violated_constraints(
        &self,
        solution: &SubsetSolution,
    ) -> Vec<Arc<dyn Constraint<SubsetSolution, D>>> {
        self.inner.violated_constraints(solution)
    }

    /// Creates a solution over the data's ids with nothing selected.
    pub fn empty_solution(&self) -> SubsetSolution {
        SubsetSolution::assemble(self.data().ids(), std::iter::empty(), self.order.clone())
    }

    /// Creates a solution over the data's ids with everything selected.
    pub fn full_solution(&self) -> SubsetSolution {
        let ids = self.data().ids();
        SubsetSolution::assemble(ids.clone(), ids, self.order.clone())
    }

    fn size_within_bounds(&self, size: usize) -> bool {
        size >= self.min_size && size <= self.max_size
    }
}

impl<D: IdentifiedData + 'static> Problem<SubsetSolution> for SubsetProblem<D> {
    fn evaluate(&self, solution: &SubsetSolution) -> Arc<dyn Evaluation> {
        self.inner.evaluate(solution)
    }

    fn validate(&self, solution: &SubsetSolution) -> Arc<dyn Validation> {
        Arc::new(SubsetValidation::new(
            self.size_within_bounds(solution.num_selected()),
            self.inner.validate(solution),
        ))
    }

    fn evaluate_delta(
        &self,
        mv: &dyn Move<SubsetSolution>,
        current: &mut SubsetSolution,
        current_evaluation: &Arc<dyn Evaluation>,
    ) -> Result<Arc<dyn Evaluation>> {
        self.inner.evaluate_delta(mv, current, current_evaluation)
    }

    fn validate_delta(
        &self,
        mv: &dyn Move<SubsetSolution>,
        current: &mut SubsetSolution,
        current_validation: &Arc<dyn Validation>,
    ) -> Result<Arc<dyn Validation>> {
        let subset_validation = current_validation
            .as_any()
            .downcast_ref::<SubsetValidation>()
            .ok_or_else(|| {
                StriderError::IncompatibleDelta(
                    "current validation of a subset problem is not a subset validation"
                        .to_string(),
                )
            })?;
        let subset_move = as_subset_move(mv)?;
        let new_size = current.num_selected() as i64 + subset_move.net_change();
        let constraint_validation = self.inner.validate_delta(
            mv,
            current,
            subset_validation.constraint_validation(),
        )?;
        Ok(Arc::new(SubsetValidation::new(
            new_size >= 0 && self.size_within_bounds(new_size as usize),
            constraint_validation,
        )))
    }

    fn is_minimizing(&self) -> bool {
        self.inner.is_minimizing()
    }

    fn random_solution(&self, rng: &mut dyn RngCore) -> SubsetSolution {
        self.inner.random_solution(rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::SimpleEvaluation;
    use crate::neigh::ClosureMove;
    use crate::subset::moves::SubsetMove;
    use crate::validation::{PenalizingValidation, SimplePenalizingValidation};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    struct IdRange(u32);

    impl IdentifiedData for IdRange {
        fn ids(&self) -> Vec<u32> {
            (0..self.0).collect()
        }
    }

    /// Sum of the selected ids; maximizing.
    struct SumOfIds;

    impl Objective<SubsetSolution, IdRange> for SumOfIds {
        fn evaluate(&self, solution: &SubsetSolution, _data: &IdRange) -> Arc<dyn Evaluation> {
            let sum: u32 = solution.selected_ids().sum();
            Arc::new(SimpleEvaluation::new(sum as f64))
        }
    }

    /// Penalizes selecting any forbidden id.
    struct ForbiddenIds {
        forbidden: Vec<u32>,
        penalty: f64,
    }

    impl Constraint<SubsetSolution, IdRange> for ForbiddenIds {
        fn validate(&self, solution: &SubsetSolution, data: &IdRange) -> Arc<dyn Validation> {
            self.validate_penalizing(solution, data)
        }
    }

    impl PenalizingConstraint<SubsetSolution, IdRange> for ForbiddenIds {
        fn validate_penalizing(
            &self,
            solution: &SubsetSolution,
            _data: &IdRange,
        ) -> Arc<dyn PenalizingValidation> {
            let violations = self
                .forbidden
                .iter()
                .filter(|&&id| solution.is_selected(id))
                .count();
            if violations == 0 {
                Arc::new(SimplePenalizingValidation::passed())
            } else {
                Arc::new(SimplePenalizingValidation::failed(
                    violations as f64 * self.penalty,
                ))
            }
        }
    }

    fn sum_problem(n: u32, min: usize, max: usize) -> SubsetProblem<IdRange> {
        SubsetProblem::new(IdRange(n), Arc::new(SumOfIds), min, max).unwrap()
    }

    #[test]
    fn rejects_inconsistent_size_bounds() {
        assert!(SubsetProblem::new(IdRange(5), Arc::new(SumOfIds), 3, 2).is_err());
        assert!(SubsetProblem::new(IdRange(5), Arc::new(SumOfIds), 0, 6).is_err());
        assert!(SubsetProblem::new(IdRange(0), Arc::new(SumOfIds), 0, 0).is_err());
    }

    #[test]
    fn validation_checks_the_size_bounds() {
        let problem = sum_problem(10, 3, 3);
        let ok = SubsetSolution::with_selection(0..10, [1, 2, 3]).unwrap();
        assert!(problem.validate(&ok).passed());
        let too_small = SubsetSolution::with_selection(0..10, [1]).unwrap();
        assert!(!problem.validate(&too_small).passed());
    }

    #[test]
    fn delta_validation_tracks_the_resulting_size() {
        let problem = sum_problem(10, 3, 3);
        let mut current = SubsetSolution::with_selection(0..10, [1, 2, 3]).unwrap();
        let validation = problem.validate(&current);

        let swap = SubsetMove::swap(9, 1);
        assert!(problem
            .validate_delta(&swap, &mut current, &validation)
            .unwrap()
            .passed());

        let grow = SubsetMove::addition(9);
        assert!(!problem
            .validate_delta(&grow, &mut current, &validation)
            .unwrap()
            .passed());
        assert_eq!(current.num_selected(), 3);
    }

    #[test]
    fn delta_validation_rejects_opaque_moves() {
        let problem = sum_problem(10, 0, 10);
        let mut current = problem.empty_solution();
        let validation = problem.validate(&current);
        let opaque: ClosureMove<SubsetSolution> = ClosureMove::new(|_| Ok(()), |_| Ok(()));
        let err = problem
            .validate_delta(&opaque, &mut current, &validation)
            .unwrap_err();
        assert!(matches!(err, StriderError::IncompatibleDelta(_)));
    }

    #[test]
    fn random_solutions_respect_the_size_bounds() {
        let problem = sum_problem(12, 2, 5);
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let solution = problem.random_solution(&mut rng);
            assert!(solution.num_selected() >= 2 && solution.num_selected() <= 5);
            assert_eq!(solution.total_ids(), 12);
        }
    }

    #[test]
    fn penalized_subset_evaluation_follows_the_orientation() {
        let mut problem = sum_problem(10, 0, 10);
        problem.add_penalizing_constraint(Arc::new(ForbiddenIds {
            forbidden: vec![9],
            penalty: 5.0,
        }));
        let solution = SubsetSolution::with_selection(0..10, [7, 8, 9]).unwrap();
        assert_eq!(problem.evaluate(&solution).value(), 19.0);

        struct MinimizingSum;
        impl Objective<SubsetSolution, IdRange> for MinimizingSum {
            fn evaluate(
                &self,
                solution: &SubsetSolution,
                _data: &IdRange,
            ) -> Arc<dyn Evaluation> {
                let sum: u32 = solution.selected_ids().sum();
                Arc::new(SimpleEvaluation::new(sum as f64))
            }
            fn is_minimizing(&self) -> bool {
                true
            }
        }
        let mut problem =
            SubsetProblem::new(IdRange(10), Arc::new(MinimizingSum), 0, 10).unwrap();
        problem.add_penalizing_constraint(Arc::new(ForbiddenIds {
            forbidden: vec![9],
            penalty: 5.0,
        }));
        assert_eq!(problem.evaluate(&solution).value(), 29.0);
    }

    #[test]
    fn empty_and_full_solutions_span_the_universe() {
        let problem = sum_problem(6, 0, 6);
        assert_eq!(problem.empty_solution().num_selected(), 0);
        assert_eq!(problem.full_solution().num_selected(), 6);
    }
}

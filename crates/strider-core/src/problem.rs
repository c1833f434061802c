//! Problem composition: data, objective, constraints and random
//! solution generation.

use std::sync::Arc;

use rand::RngCore;

use crate::constraint::{Constraint, PenalizingConstraint};
use crate::error::{Result, StriderError};
use crate::eval::{Evaluation, PenalizedEvaluation};
use crate::neigh::Move;
use crate::objective::Objective;
use crate::random::RandomSolutionGenerator;
use crate::solution::Solution;
use crate::validation::{SimpleValidation, UnanimousValidation, Validation};

/// A combinatorial optimization problem as seen by the search engine.
///
/// Problems must be safe for concurrent read: parallel searches
/// evaluate and validate solutions from several threads at once. No
/// component of a problem may be mutated while a search is running
/// against it.
pub trait Problem<S: Solution>: Send + Sync {
    /// Evaluates a solution, aggregating the objective and any
    /// penalizing constraints.
    fn evaluate(&self, solution: &S) -> Arc<dyn Evaluation>;

    /// Validates a solution against all mandatory constraints.
    fn validate(&self, solution: &S) -> Arc<dyn Validation>;

    /// Delta form of [`evaluate`](Problem::evaluate): evaluates the
    /// neighbour reached by `mv` without leaving `current` modified.
    fn evaluate_delta(
        &self,
        mv: &dyn Move<S>,
        current: &mut S,
        current_evaluation: &Arc<dyn Evaluation>,
    ) -> Result<Arc<dyn Evaluation>>;

    /// Delta form of [`validate`](Problem::validate).
    fn validate_delta(
        &self,
        mv: &dyn Move<S>,
        current: &mut S,
        current_validation: &Arc<dyn Validation>,
    ) -> Result<Arc<dyn Validation>>;

    /// Whether the underlying objective is minimizing.
    fn is_minimizing(&self) -> bool;

    /// Creates an independent random solution.
    fn random_solution(&self, rng: &mut dyn RngCore) -> S;
}

/// Problem fully based on delegation: data of type `D`, an objective,
/// mandatory and penalizing constraint lists, and a random solution
/// generator.
///
/// A solution is valid only if it satisfies all mandatory constraints;
/// validation short-circuits on the first violated one. Penalizing
/// constraints never invalidate a solution: each violation assigns a
/// penalty which is subtracted from the evaluation when maximizing and
/// added when minimizing.
pub struct GenericProblem<S: Solution, D> {
    data: D,
    objective: Arc<dyn Objective<S, D>>,
    mandatory: Vec<Arc<dyn Constraint<S, D>>>,
    penalizing: Vec<Arc<dyn PenalizingConstraint<S, D>>>,
    generator: Arc<dyn RandomSolutionGenerator<S, D>>,
}

impl<S: Solution, D> GenericProblem<S, D> {
    /// Creates a new generic problem with given data, objective and
    /// random solution generator, and no constraints.
    pub fn new(
        data: D,
        objective: Arc<dyn Objective<S, D>>,
        generator: Arc<dyn RandomSolutionGenerator<S, D>>,
    ) -> Self {
        Self {
            data,
            objective,
            mandatory: Vec::new(),
            penalizing: Vec::new(),
            generator,
        }
    }

    pub fn data(&self) -> &D {
        &self.data
    }

    pub fn objective(&self) -> &Arc<dyn Objective<S, D>> {
        &self.objective
    }

    /// Adds a mandatory constraint. Must not be called while a search
    /// is solving this problem.
    pub fn add_mandatory_constraint(&mut self, constraint: Arc<dyn Constraint<S, D>>) {
        self.mandatory.push(constraint);
    }

    /// Adds a penalizing constraint. Must not be called while a search
    /// is solving this problem.
    pub fn add_penalizing_constraint(&mut self, constraint: Arc<dyn PenalizingConstraint<S, D>>) {
        self.penalizing.push(constraint);
    }

    pub fn mandatory_constraints(&self) -> &[Arc<dyn Constraint<S, D>>] {
        &self.mandatory
    }

    pub fn penalizing_constraints(&self) -> &[Arc<dyn PenalizingConstraint<S, D>>] {
        &self.penalizing
    }

    /// All constraints, mandatory and penalizing, violated by the
    /// given solution. Possibly empty.
    pub fn violated_constraints(&self, solution: &S) -> Vec<Arc<dyn Constraint<S, D>>> {
        self.mandatory
            .iter()
            .cloned()
            .chain(
                self.penalizing
                    .iter()
                    .map(|c| c.clone() as Arc<dyn Constraint<S, D>>),
            )
            .filter(|c| !c.validate(solution, &self.data).passed())
            .collect()
    }
}

impl<S: Solution, D: Send + Sync> Problem<S> for GenericProblem<S, D> {
    fn evaluate(&self, solution: &S) -> Arc<dyn Evaluation> {
        if self.penalizing.is_empty() {
            return self.objective.evaluate(solution, &self.data);
        }
        let evaluation = self.objective.evaluate(solution, &self.data);
        let penalties = self
            .penalizing
            .iter()
            .map(|pc| pc.validate_penalizing(solution, &self.data))
            .collect();
        Arc::new(PenalizedEvaluation::new(
            evaluation,
            penalties,
            self.is_minimizing(),
        ))
    }

    fn validate(&self, solution: &S) -> Arc<dyn Validation> {
        match self.mandatory.as_slice() {
            [] => Arc::new(SimpleValidation::PASSED),
            [single] => single.validate(solution, &self.data),
            constraints => {
                let mut aggregate = UnanimousValidation::new();
                for constraint in constraints {
                    let validation = constraint.validate(solution, &self.data);
                    let passed = validation.passed();
                    aggregate.record(validation);
                    if !passed {
                        break;
                    }
                }
                Arc::new(aggregate)
            }
        }
    }

    fn evaluate_delta(
        &self,
        mv: &dyn Move<S>,
        current: &mut S,
        current_evaluation: &Arc<dyn Evaluation>,
    ) -> Result<Arc<dyn Evaluation>> {
        if self.penalizing.is_empty() {
            return self
                .objective
                .evaluate_delta(mv, current, current_evaluation, &self.data);
        }
        let penalized = current_evaluation
            .as_any()
            .downcast_ref::<PenalizedEvaluation>()
            .ok_or_else(|| {
                StriderError::IncompatibleDelta(
                    "current evaluation of a penalized problem is not a penalized evaluation"
                        .to_string(),
                )
            })?;
        let evaluation =
            self.objective
                .evaluate_delta(mv, current, penalized.evaluation(), &self.data)?;
        let mut penalties = Vec::with_capacity(self.penalizing.len());
        for (i, pc) in self.penalizing.iter().enumerate() {
            let prior = match penalized.penalizing_validation(i) {
                Some(prior) => prior.clone(),
                None => pc.validate_penalizing(current, &self.data),
            };
            penalties.push(pc.validate_penalizing_delta(mv, current, &prior, &self.data)?);
        }
        Ok(Arc::new(PenalizedEvaluation::new(
            evaluation,
            penalties,
            self.is_minimizing(),
        )))
    }

    fn validate_delta(
        &self,
        mv: &dyn Move<S>,
        current: &mut S,
        current_validation: &Arc<dyn Validation>,
    ) -> Result<Arc<dyn Validation>> {
        match self.mandatory.as_slice() {
            [] => Ok(Arc::new(SimpleValidation::PASSED)),
            [single] => single.validate_delta(mv, current, current_validation, &self.data),
            constraints => {
                let unanimous = current_validation
                    .as_any()
                    .downcast_ref::<UnanimousValidation>()
                    .ok_or_else(|| {
                        StriderError::IncompatibleDelta(
                            "current validation of a multi-constraint problem is not an aggregate"
                                .to_string(),
                        )
                    })?;
                let mut aggregate = UnanimousValidation::new();
                for (i, constraint) in constraints.iter().enumerate() {
                    // The prior sub-validation may be missing because
                    // full validation short-circuited before reaching
                    // this constraint; recompute it from scratch.
                    let prior = match unanimous.sub_validation(i) {
                        Some(prior) => prior.clone(),
                        None => constraint.validate(current, &self.data),
                    };
                    let validation = constraint.validate_delta(mv, current, &prior, &self.data)?;
                    let passed = validation.passed();
                    aggregate.record(validation);
                    if !passed {
                        break;
                    }
                }
                Ok(Arc::new(aggregate))
            }
        }
    }

    fn is_minimizing(&self) -> bool {
        self.objective.is_minimizing()
    }

    fn random_solution(&self, rng: &mut dyn RngCore) -> S {
        self.generator.create(rng, &self.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::SimpleEvaluation;
    use crate::neigh::ClosureMove;
    use crate::validation::{PenalizingValidation, SimplePenalizingValidation, SubsetValidation};
    use std::fmt;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Clone, PartialEq, Eq, Hash, Debug)]
    struct Num(i64);

    impl fmt::Display for Num {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{}", self.0)
        }
    }

    impl Solution for Num {}

    struct Identity;

    impl Objective<Num, ()> for Identity {
        fn evaluate(&self, solution: &Num, _data: &()) -> Arc<dyn Evaluation> {
            Arc::new(SimpleEvaluation::new(solution.0 as f64))
        }
    }

    /// Passes iff the value is non-negative; counts invocations of the
    /// full validation.
    struct NonNegative {
        invocations: AtomicUsize,
    }

    impl NonNegative {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                invocations: AtomicUsize::new(0),
            })
        }
    }

    impl Constraint<Num, ()> for NonNegative {
        fn validate(&self, solution: &Num, _data: &()) -> Arc<dyn Validation> {
            self.invocations.fetch_add(1, Ordering::SeqCst);
            Arc::new(SimpleValidation::new(solution.0 >= 0))
        }
    }

    struct Below {
        limit: i64,
    }

    impl Constraint<Num, ()> for Below {
        fn validate(&self, solution: &Num, _data: &()) -> Arc<dyn Validation> {
            Arc::new(SimpleValidation::new(solution.0 < self.limit))
        }
    }

    struct PenaltyAbove {
        limit: i64,
        penalty: f64,
    }

    impl Constraint<Num, ()> for PenaltyAbove {
        fn validate(&self, solution: &Num, data: &()) -> Arc<dyn Validation> {
            self.validate_penalizing(solution, data)
        }
    }

    impl PenalizingConstraint<Num, ()> for PenaltyAbove {
        fn validate_penalizing(&self, solution: &Num, _data: &()) -> Arc<dyn PenalizingValidation> {
            if solution.0 > self.limit {
                Arc::new(SimplePenalizingValidation::failed(self.penalty))
            } else {
                Arc::new(SimplePenalizingValidation::passed())
            }
        }
    }

    fn problem() -> GenericProblem<Num, ()> {
        GenericProblem::new(
            (),
            Arc::new(Identity),
            Arc::new(|_: &mut dyn RngCore, _: &()| Num(0)),
        )
    }

    fn plus(k: i64) -> ClosureMove<Num> {
        ClosureMove::new(
            move |n: &mut Num| {
                n.0 += k;
                Ok(())
            },
            move |n: &mut Num| {
                n.0 -= k;
                Ok(())
            },
        )
    }

    #[test]
    fn no_constraints_validates_as_passed() {
        let problem = problem();
        assert!(problem.validate(&Num(-5)).passed());
    }

    #[test]
    fn single_constraint_validation_is_returned_directly() {
        let mut problem = problem();
        problem.add_mandatory_constraint(NonNegative::new());
        let validation = problem.validate(&Num(-1));
        assert!(!validation.passed());
        assert!(validation
            .as_any()
            .downcast_ref::<SimpleValidation>()
            .is_some());
    }

    #[test]
    fn aggregate_validation_short_circuits() {
        let mut problem = problem();
        let expensive = NonNegative::new();
        problem.add_mandatory_constraint(Arc::new(Below { limit: 0 }));
        problem.add_mandatory_constraint(expensive.clone());

        // 5 < 0 fails the first constraint, so the counting one must
        // never be consulted.
        let validation = problem.validate(&Num(5));
        assert!(!validation.passed());
        assert_eq!(expensive.invocations.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn delta_validation_recomputes_missing_sub_validation() {
        let mut problem = problem();
        let expensive = NonNegative::new();
        problem.add_mandatory_constraint(Arc::new(Below { limit: 0 }));
        problem.add_mandatory_constraint(expensive.clone());

        let mut current = Num(5);
        let current_validation = problem.validate(&current);
        assert_eq!(expensive.invocations.load(Ordering::SeqCst), 0);

        // The move repairs the first constraint, so the aggregate must
        // now consult the second one, whose prior validation was never
        // recorded.
        let mv = plus(-10);
        let validation = problem
            .validate_delta(&mv, &mut current, &current_validation)
            .unwrap();
        assert!(!validation.passed());
        assert!(expensive.invocations.load(Ordering::SeqCst) >= 1);
        assert_eq!(current, Num(5));
    }

    #[test]
    fn evaluation_without_penalties_is_the_objective_evaluation() {
        let problem = problem();
        assert_eq!(problem.evaluate(&Num(7)).value(), 7.0);
    }

    #[test]
    fn penalized_evaluation_subtracts_when_maximizing() {
        let mut problem = problem();
        problem.add_penalizing_constraint(Arc::new(PenaltyAbove {
            limit: 10,
            penalty: 5.0,
        }));
        assert_eq!(problem.evaluate(&Num(24)).value(), 19.0);
        assert_eq!(problem.evaluate(&Num(8)).value(), 8.0);
    }

    #[test]
    fn delta_evaluation_matches_full_evaluation() {
        let mut problem = problem();
        problem.add_penalizing_constraint(Arc::new(PenaltyAbove {
            limit: 10,
            penalty: 5.0,
        }));
        let mut current = Num(8);
        let current_evaluation = problem.evaluate(&current);
        let mv = plus(4);
        let delta = problem
            .evaluate_delta(&mv, &mut current, &current_evaluation)
            .unwrap();
        assert_eq!(current, Num(8));

        let mut neighbour = current.clone();
        mv.apply(&mut neighbour).unwrap();
        assert_eq!(delta.value(), problem.evaluate(&neighbour).value());
    }

    #[test]
    fn incompatible_current_validation_is_rejected() {
        let mut problem = problem();
        problem.add_mandatory_constraint(NonNegative::new());
        problem.add_mandatory_constraint(NonNegative::new());
        let mut current = Num(1);
        let foreign: Arc<dyn Validation> =
            Arc::new(SubsetValidation::new(true, Arc::new(SimpleValidation::PASSED)));
        let err = problem
            .validate_delta(&plus(1), &mut current, &foreign)
            .unwrap_err();
        assert!(matches!(err, StriderError::IncompatibleDelta(_)));
    }

    #[test]
    fn violated_constraints_spans_both_lists() {
        let mut problem = problem();
        problem.add_mandatory_constraint(Arc::new(Below { limit: 0 }));
        problem.add_penalizing_constraint(Arc::new(PenaltyAbove {
            limit: 10,
            penalty: 1.0,
        }));
        assert_eq!(problem.violated_constraints(&Num(20)).len(), 2);
        assert_eq!(problem.violated_constraints(&Num(-1)).len(), 0);
    }
}

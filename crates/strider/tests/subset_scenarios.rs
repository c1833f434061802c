//! End-to-end scenarios on a small subset-sum problem.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;

use strider::core::error::Result;
use strider::core::eval::{Evaluation, SimpleEvaluation};
use strider::core::neigh::Move;
use strider::core::objective::Objective;
use strider::core::subset::neigh::SingleSwapNeighbourhood;
use strider::core::subset::{as_subset_move, IdentifiedData, SubsetProblem, SubsetSolution};
use strider::core::validation::Validation;
use strider::{
    Constraint, LocalSearch, MaxSteps, MetropolisSearch, Neighbourhood, ParallelTempering,
    PenalizingConstraint, PenalizingValidation, Problem, RandomDescent, Search,
    SimplePenalizingValidation, SteepestDescent,
};

struct Items(u32);

impl IdentifiedData for Items {
    fn ids(&self) -> Vec<u32> {
        (0..self.0).collect()
    }
}

/// Maximizes the sum of the selected ids, with an incremental delta
/// over subset moves.
struct SumOfIds;

impl SumOfIds {
    fn full_sum(solution: &SubsetSolution) -> f64 {
        solution.selected_ids().map(|id| id as f64).sum()
    }
}

impl Objective<SubsetSolution, Items> for SumOfIds {
    fn evaluate(&self, solution: &SubsetSolution, _data: &Items) -> Arc<dyn Evaluation> {
        Arc::new(SimpleEvaluation::new(Self::full_sum(solution)))
    }

    fn evaluate_delta(
        &self,
        mv: &dyn Move<SubsetSolution>,
        _current: &mut SubsetSolution,
        current_evaluation: &Arc<dyn Evaluation>,
        _data: &Items,
    ) -> Result<Arc<dyn Evaluation>> {
        let mv = as_subset_move(mv)?;
        let added: f64 = mv.added_ids().iter().map(|&id| id as f64).sum();
        let deleted: f64 = mv.deleted_ids().iter().map(|&id| id as f64).sum();
        Ok(Arc::new(SimpleEvaluation::new(
            current_evaluation.value() + added - deleted,
        )))
    }
}

struct MinimizingSumOfIds;

impl Objective<SubsetSolution, Items> for MinimizingSumOfIds {
    fn evaluate(&self, solution: &SubsetSolution, _data: &Items) -> Arc<dyn Evaluation> {
        Arc::new(SimpleEvaluation::new(SumOfIds::full_sum(solution)))
    }

    fn is_minimizing(&self) -> bool {
        true
    }
}

/// Penalizes every selected forbidden id.
struct ForbiddenIds {
    forbidden: Vec<u32>,
    penalty_per_id: f64,
}

impl Constraint<SubsetSolution, Items> for ForbiddenIds {
    fn validate(&self, solution: &SubsetSolution, data: &Items) -> Arc<dyn Validation> {
        self.validate_penalizing(solution, data)
    }
}

impl PenalizingConstraint<SubsetSolution, Items> for ForbiddenIds {
    fn validate_penalizing(
        &self,
        solution: &SubsetSolution,
        _data: &Items,
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
                violations as f64 * self.penalty_per_id,
            ))
        }
    }
}

fn sum_problem(n: u32, size: usize) -> Arc<SubsetProblem<Items>> {
    Arc::new(SubsetProblem::fixed_size(Items(n), Arc::new(SumOfIds), size).unwrap())
}

fn selection(solution: &SubsetSolution) -> BTreeSet<u32> {
    solution.selected_ids().collect()
}

#[test]
fn random_descent_converges_to_the_top_ids() {
    let problem = sum_problem(10, 3);
    let mut search = RandomDescent::new(problem, Arc::new(SingleSwapNeighbourhood::new()));
    search.set_rng(StdRng::seed_from_u64(1)).unwrap();
    search
        .add_stop_criterion(Box::new(MaxSteps::new(5_000)))
        .unwrap();
    search.set_checker_period(Duration::from_millis(1)).unwrap();
    search.start().unwrap();

    let best = search.best_solution().unwrap();
    assert_eq!(selection(&best), BTreeSet::from([7, 8, 9]));
    assert_eq!(search.best_evaluation().unwrap().value(), 24.0);
}

#[test]
fn steepest_descent_improves_strictly_until_the_optimum() {
    let problem = sum_problem(10, 3);
    let mut search = SteepestDescent::new(problem, Arc::new(SingleSwapNeighbourhood::new()));
    search
        .set_current_solution(SubsetSolution::with_selection(0..10, [0, 1, 2]).unwrap())
        .unwrap();
    search.start().unwrap();

    assert_eq!(search.steps(), 4);
    assert_eq!(
        selection(&search.best_solution().unwrap()),
        BTreeSet::from([7, 8, 9])
    );
    assert_eq!(search.best_evaluation().unwrap().value(), 24.0);
}

#[test]
fn metropolis_acceptance_depends_on_the_temperature() {
    let start = SubsetSolution::with_selection(0..10, [7, 8, 9]).unwrap();

    let problem = sum_problem(10, 3);
    let mut hot = MetropolisSearch::new(
        problem.clone(),
        Arc::new(SingleSwapNeighbourhood::new()),
        1_000.0,
    )
    .unwrap();
    hot.set_rng(StdRng::seed_from_u64(2)).unwrap();
    hot.set_current_solution(start.clone()).unwrap();
    hot.add_stop_criterion(Box::new(MaxSteps::new(1_000))).unwrap();
    hot.set_checker_period(Duration::from_millis(1)).unwrap();
    hot.start().unwrap();
    let hot_rate =
        hot.accepted_moves() as f64 / (hot.accepted_moves() + hot.rejected_moves()) as f64;
    assert!(hot_rate > 0.5, "hot acceptance rate was {hot_rate}");

    let mut cold = MetropolisSearch::new(
        problem,
        Arc::new(SingleSwapNeighbourhood::new()),
        0.001,
    )
    .unwrap();
    cold.set_rng(StdRng::seed_from_u64(2)).unwrap();
    cold.set_current_solution(start).unwrap();
    cold.add_stop_criterion(Box::new(MaxSteps::new(1_000))).unwrap();
    cold.set_checker_period(Duration::from_millis(1)).unwrap();
    cold.start().unwrap();
    let cold_rate =
        cold.accepted_moves() as f64 / (cold.accepted_moves() + cold.rejected_moves()) as f64;
    assert!(cold_rate < 0.01, "cold acceptance rate was {cold_rate}");
}

#[test]
fn penalties_follow_the_objective_orientation() {
    let solution = SubsetSolution::with_selection(0..10, [7, 8, 9]).unwrap();

    let mut maximizing =
        SubsetProblem::new(Items(10), Arc::new(SumOfIds), 0, 10).unwrap();
    maximizing.add_penalizing_constraint(Arc::new(ForbiddenIds {
        forbidden: vec![9],
        penalty_per_id: 5.0,
    }));
    assert_eq!(maximizing.evaluate(&solution).value(), 19.0);
    assert!(maximizing.validate(&solution).passed());

    let mut minimizing =
        SubsetProblem::new(Items(10), Arc::new(MinimizingSumOfIds), 0, 10).unwrap();
    minimizing.add_penalizing_constraint(Arc::new(ForbiddenIds {
        forbidden: vec![9],
        penalty_per_id: 5.0,
    }));
    assert_eq!(minimizing.evaluate(&solution).value(), 29.0);
}

#[test]
fn parallel_tempering_matches_the_steepest_descent_optimum() {
    let problem = sum_problem(10, 3);
    let mut search = ParallelTempering::new(
        problem,
        Arc::new(SingleSwapNeighbourhood::new()),
        4,
        1.0,
        100.0,
    )
    .unwrap();
    search.set_replica_steps(50).unwrap();
    search
        .add_stop_criterion(Box::new(MaxSteps::new(10)))
        .unwrap();
    search.set_checker_period(Duration::from_millis(1)).unwrap();
    search.start().unwrap();

    assert_eq!(
        selection(&search.best_solution().unwrap()),
        BTreeSet::from([7, 8, 9])
    );
    assert_eq!(search.best_evaluation().unwrap().value(), 24.0);
    assert!(search.best_validation().unwrap().passed());
}

#[test]
fn delta_and_full_evaluation_agree_along_a_trajectory() {
    let problem = sum_problem(12, 4);
    let mut rng = StdRng::seed_from_u64(9);
    let neighbourhood = SingleSwapNeighbourhood::new();
    let mut current = problem.random_solution(&mut rng);
    let mut evaluation = problem.evaluate(&current);
    let mut validation = problem.validate(&current);

    for _ in 0..200 {
        let Some(mv) = neighbourhood.random_move(&current, &mut rng) else {
            break;
        };
        let delta_evaluation = problem
            .evaluate_delta(mv.as_ref(), &mut current, &evaluation)
            .unwrap();
        let delta_validation = problem
            .validate_delta(mv.as_ref(), &mut current, &validation)
            .unwrap();
        mv.apply(&mut current).unwrap();
        let full_evaluation = problem.evaluate(&current);
        let full_validation = problem.validate(&current);
        assert!((delta_evaluation.value() - full_evaluation.value()).abs() < 1e-9);
        assert_eq!(delta_validation.passed(), full_validation.passed());
        evaluation = delta_evaluation;
        validation = delta_validation;
    }
}

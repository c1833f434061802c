//! Shared test fixtures: a subset-sum problem with a true delta
//! objective.

use std::collections::BTreeSet;
use std::sync::Arc;

use strider_core::error::Result;
use strider_core::eval::{Evaluation, SimpleEvaluation};
use strider_core::neigh::Move;
use strider_core::objective::Objective;
use strider_core::subset::{as_subset_move, IdentifiedData, SubsetProblem, SubsetSolution};

pub(crate) struct IdRange(pub u32);

impl IdentifiedData for IdRange {
    fn ids(&self) -> Vec<u32> {
        (0..self.0).collect()
    }
}

/// Maximizes the sum of the selected ids, with an incremental delta
/// evaluation over subset moves.
pub(crate) struct SumOfIds;

impl Objective<SubsetSolution, IdRange> for SumOfIds {
    fn evaluate(&self, solution: &SubsetSolution, _data: &IdRange) -> Arc<dyn Evaluation> {
        let sum: u32 = solution.selected_ids().sum();
        Arc::new(SimpleEvaluation::new(sum as f64))
    }

    fn evaluate_delta(
        &self,
        mv: &dyn Move<SubsetSolution>,
        _current: &mut SubsetSolution,
        current_evaluation: &Arc<dyn Evaluation>,
        _data: &IdRange,
    ) -> Result<Arc<dyn Evaluation>> {
        let mv = as_subset_move(mv)?;
        let added: f64 = mv.added_ids().iter().map(|&id| id as f64).sum();
        let deleted: f64 = mv.deleted_ids().iter().map(|&id| id as f64).sum();
        Ok(Arc::new(SimpleEvaluation::new(
            current_evaluation.value() + added - deleted,
        )))
    }
}

pub(crate) fn sum_problem(n: u32, min_size: usize, max_size: usize) -> Arc<SubsetProblem<IdRange>> {
    Arc::new(SubsetProblem::new(IdRange(n), Arc::new(SumOfIds), min_size, max_size).unwrap())
}

pub(crate) fn subset(n: u32, selected: impl IntoIterator<Item = u32>) -> SubsetSolution {
    SubsetSolution::with_selection(0..n, selected).unwrap()
}

pub(crate) fn selected_ids(solution: &SubsetSolution) -> BTreeSet<u32> {
    solution.selected_ids().collect()
}

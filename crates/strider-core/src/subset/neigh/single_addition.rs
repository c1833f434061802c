//! Single addition neighbourhood.

use std::collections::HashSet;

use rand::seq::IndexedRandom;
use rand::RngCore;

use crate::neigh::{Move, Neighbourhood};
use crate::subset::moves::SubsetMove;
use crate::subset::neigh::addition_candidates;
use crate::subset::solution::SubsetSolution;

/// Neighbourhood generating all moves that select one currently
/// unselected id, optionally bounded by a maximum subset size.
#[derive(Debug, Default)]
pub struct SingleAdditionNeighbourhood {
    max_size: Option<usize>,
    fixed_ids: Option<HashSet<u32>>,
}

impl SingleAdditionNeighbourhood {
    /// Neighbourhood without a size limit.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stops generating moves once the subset has the given size.
    pub fn with_max_size(mut self, max_size: usize) -> Self {
        self.max_size = Some(max_size);
        self
    }

    /// Excludes the given ids from addition.
    pub fn with_fixed_ids(mut self, fixed_ids: HashSet<u32>) -> Self {
        self.fixed_ids = Some(fixed_ids);
        self
    }

    fn may_grow(&self, solution: &SubsetSolution) -> bool {
        self.max_size
            .map_or(true, |max| solution.num_selected() + 1 <= max)
    }
}

impl Neighbourhood<SubsetSolution> for SingleAdditionNeighbourhood {
    fn random_move(
        &self,
        solution: &SubsetSolution,
        rng: &mut dyn RngCore,
    ) -> Option<Box<dyn Move<SubsetSolution>>> {
        if !self.may_grow(solution) {
            return None;
        }
        let adds = addition_candidates(solution, self.fixed_ids.as_ref());
        let &add = adds.choose(rng)?;
        Some(Box::new(SubsetMove::addition(add)))
    }

    fn all_moves(&self, solution: &SubsetSolution) -> Vec<Box<dyn Move<SubsetSolution>>> {
        if !self.may_grow(solution) {
            return Vec::new();
        }
        addition_candidates(solution, self.fixed_ids.as_ref())
            .into_iter()
            .map(|add| Box::new(SubsetMove::addition(add)) as Box<dyn Move<SubsetSolution>>)
            .collect()
    }
}

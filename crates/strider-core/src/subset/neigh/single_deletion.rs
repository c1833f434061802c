//! Single deletion neighbourhood.

use std::collections::HashSet;

use rand::seq::IndexedRandom;
use rand::RngCore;

use crate::neigh::{Move, Neighbourhood};
use crate::subset::moves::SubsetMove;
use crate::subset::neigh::deletion_candidates;
use crate::subset::solution::SubsetSolution;

/// Neighbourhood generating all moves that deselect one currently
/// selected id, optionally bounded by a minimum subset size.
#[derive(Debug, Default)]
pub struct SingleDeletionNeighbourhood {
    min_size: Option<usize>,
    fixed_ids: Option<HashSet<u32>>,
}

impl SingleDeletionNeighbourhood {
    /// Neighbourhood without a size limit.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stops generating moves once the subset has the given size.
    pub fn with_min_size(mut self, min_size: usize) -> Self {
        self.min_size = Some(min_size);
        self
    }

    /// Excludes the given ids from deletion.
    pub fn with_fixed_ids(mut self, fixed_ids: HashSet<u32>) -> Self {
        self.fixed_ids = Some(fixed_ids);
        self
    }

    fn may_shrink(&self, solution: &SubsetSolution) -> bool {
        self.min_size.map_or(solution.num_selected() > 0, |min| {
            solution.num_selected() > min
        })
    }
}

impl Neighbourhood<SubsetSolution> for SingleDeletionNeighbourhood {
    fn random_move(
        &self,
        solution: &SubsetSolution,
        rng: &mut dyn RngCore,
    ) -> Option<Box<dyn Move<SubsetSolution>>> {
        if !self.may_shrink(solution) {
            return None;
        }
        let deletes = deletion_candidates(solution, self.fixed_ids.as_ref());
        let &delete = deletes.choose(rng)?;
        Some(Box::new(SubsetMove::deletion(delete)))
    }

    fn all_moves(&self, solution: &SubsetSolution) -> Vec<Box<dyn Move<SubsetSolution>>> {
        if !self.may_shrink(solution) {
            return Vec::new();
        }
        deletion_candidates(solution, self.fixed_ids.as_ref())
            .into_iter()
            .map(|delete| Box::new(SubsetMove::deletion(delete)) as Box<dyn Move<SubsetSolution>>)
            .collect()
    }
}

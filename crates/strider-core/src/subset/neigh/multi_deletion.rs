//! Multi deletion neighbourhood.

use std::collections::HashSet;

use rand::seq::IndexedRandom;
use rand::{Rng, RngCore};

use crate::neigh::{Move, Neighbourhood};
use crate::subset::moves::SubsetMove;
use crate::subset::neigh::{deletion_candidates, k_combinations};
use crate::subset::solution::SubsetSolution;

/// Neighbourhood deselecting up to a fixed number of ids in a single
/// step, aggregated in one composite move, optionally bounded by a
/// minimum subset size.
#[derive(Debug)]
pub struct MultiDeletionNeighbourhood {
    max_deletions: usize,
    min_size: Option<usize>,
    fixed_ids: Option<HashSet<u32>>,
}

impl MultiDeletionNeighbourhood {
    pub fn new(max_deletions: usize) -> Self {
        Self {
            max_deletions,
            min_size: None,
            fixed_ids: None,
        }
    }

    /// Keeps the resulting subset size at or above the given floor.
    pub fn with_min_size(mut self, min_size: usize) -> Self {
        self.min_size = Some(min_size);
        self
    }

    /// Excludes the given ids from deletion.
    pub fn with_fixed_ids(mut self, fixed_ids: HashSet<u32>) -> Self {
        self.fixed_ids = Some(fixed_ids);
        self
    }

    fn feasible_deletions(&self, solution: &SubsetSolution, candidates: usize) -> usize {
        let floor = self
            .min_size
            .map_or(candidates, |min| solution.num_selected().saturating_sub(min));
        self.max_deletions.min(candidates).min(floor)
    }
}

impl Neighbourhood<SubsetSolution> for MultiDeletionNeighbourhood {
    fn random_move(
        &self,
        solution: &SubsetSolution,
        rng: &mut dyn RngCore,
    ) -> Option<Box<dyn Move<SubsetSolution>>> {
        let deletes = deletion_candidates(solution, self.fixed_ids.as_ref());
        let max = self.feasible_deletions(solution, deletes.len());
        if max == 0 {
            return None;
        }
        let k = rng.random_range(1..=max);
        let delete: Vec<u32> = deletes.choose_multiple(rng, k).copied().collect();
        Some(Box::new(SubsetMove::general(std::iter::empty(), delete)))
    }

    fn all_moves(&self, solution: &SubsetSolution) -> Vec<Box<dyn Move<SubsetSolution>>> {
        let deletes = deletion_candidates(solution, self.fixed_ids.as_ref());
        let max = self.feasible_deletions(solution, deletes.len());
        let mut moves: Vec<Box<dyn Move<SubsetSolution>>> = Vec::new();
        for k in 1..=max {
            for delete in k_combinations(&deletes, k) {
                moves.push(Box::new(SubsetMove::general(
                    std::iter::empty(),
                    delete.iter().copied(),
                )));
            }
        }
        moves
    }
}

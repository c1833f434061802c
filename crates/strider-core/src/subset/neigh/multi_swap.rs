//! Multi swap neighbourhood.

use std::collections::HashSet;

use rand::seq::IndexedRandom;
use rand::{Rng, RngCore};

use crate::neigh::{Move, Neighbourhood};
use crate::subset::moves::SubsetMove;
use crate::subset::neigh::{addition_candidates, deletion_candidates, k_combinations};
use crate::subset::solution::SubsetSolution;

/// Neighbourhood performing up to a fixed number of independent swaps
/// in a single step, aggregated in one composite move.
///
/// A random move draws the number of swaps uniformly from the feasible
/// range. Enumerating all moves grows combinatorially with the swap
/// count; prefer random sampling for anything but small instances.
#[derive(Debug)]
pub struct MultiSwapNeighbourhood {
    max_swaps: usize,
    fixed_ids: Option<HashSet<u32>>,
}

impl MultiSwapNeighbourhood {
    pub fn new(max_swaps: usize) -> Self {
        Self {
            max_swaps,
            fixed_ids: None,
        }
    }

    /// Excludes the given ids from both sides of every swap.
    pub fn with_fixed_ids(mut self, fixed_ids: HashSet<u32>) -> Self {
        self.fixed_ids = Some(fixed_ids);
        self
    }

    fn feasible_swaps(&self, adds: usize, deletes: usize) -> usize {
        self.max_swaps.min(adds).min(deletes)
    }
}

impl Neighbourhood<SubsetSolution> for MultiSwapNeighbourhood {
    fn random_move(
        &self,
        solution: &SubsetSolution,
        rng: &mut dyn RngCore,
    ) -> Option<Box<dyn Move<SubsetSolution>>> {
        let adds = addition_candidates(solution, self.fixed_ids.as_ref());
        let deletes = deletion_candidates(solution, self.fixed_ids.as_ref());
        let max = self.feasible_swaps(adds.len(), deletes.len());
        if max == 0 {
            return None;
        }
        let k = rng.random_range(1..=max);
        let add: Vec<u32> = adds.choose_multiple(rng, k).copied().collect();
        let delete: Vec<u32> = deletes.choose_multiple(rng, k).copied().collect();
        Some(Box::new(SubsetMove::general(add, delete)))
    }

    fn all_moves(&self, solution: &SubsetSolution) -> Vec<Box<dyn Move<SubsetSolution>>> {
        let adds = addition_candidates(solution, self.fixed_ids.as_ref());
        let deletes = deletion_candidates(solution, self.fixed_ids.as_ref());
        let max = self.feasible_swaps(adds.len(), deletes.len());
        let mut moves: Vec<Box<dyn Move<SubsetSolution>>> = Vec::new();
        for k in 1..=max {
            for add in k_combinations(&adds, k) {
                for delete in k_combinations(&deletes, k) {
                    moves.push(Box::new(SubsetMove::general(
                        add.iter().copied(),
                        delete.iter().copied(),
                    )));
                }
            }
        }
        moves
    }
}

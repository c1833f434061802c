//! Multi addition neighbourhood.

use std::collections::HashSet;

use rand::seq::IndexedRandom;
use rand::{Rng, RngCore};

use crate::neigh::{Move, Neighbourhood};
use crate::subset::moves::SubsetMove;
use crate::subset::neigh::{addition_candidates, k_combinations};
use crate::subset::solution::SubsetSolution;

/// Neighbourhood selecting up to a fixed number of ids in a single
/// step, aggregated in one composite move, optionally bounded by a
/// maximum subset size.
#[derive(Debug)]
pub struct MultiAdditionNeighbourhood {
    max_additions: usize,
    max_size: Option<usize>,
    fixed_ids: Option<HashSet<u32>>,
}

impl MultiAdditionNeighbourhood {
    pub fn new(max_additions: usize) -> Self {
        Self {
            max_additions,
            max_size: None,
            fixed_ids: None,
        }
    }

    /// Caps the resulting subset size.
    pub fn with_max_size(mut self, max_size: usize) -> Self {
        self.max_size = Some(max_size);
        self
    }

    /// Excludes the given ids from addition.
    pub fn with_fixed_ids(mut self, fixed_ids: HashSet<u32>) -> Self {
        self.fixed_ids = Some(fixed_ids);
        self
    }

    fn feasible_additions(&self, solution: &SubsetSolution, candidates: usize) -> usize {
        let headroom = self
            .max_size
            .map_or(candidates, |max| max.saturating_sub(solution.num_selected()));
        self.max_additions.min(candidates).min(headroom)
    }
}

impl Neighbourhood<SubsetSolution> for MultiAdditionNeighbourhood {
    fn random_move(
        &self,
        solution: &SubsetSolution,
        rng: &mut dyn RngCore,
    ) -> Option<Box<dyn Move<SubsetSolution>>> {
        let adds = addition_candidates(solution, self.fixed_ids.as_ref());
        let max = self.feasible_additions(solution, adds.len());
        if max == 0 {
            return None;
        }
        let k = rng.random_range(1..=max);
        let add: Vec<u32> = adds.choose_multiple(rng, k).copied().collect();
        Some(Box::new(SubsetMove::general(add, std::iter::empty())))
    }

    fn all_moves(&self, solution: &SubsetSolution) -> Vec<Box<dyn Move<SubsetSolution>>> {
        let adds = addition_candidates(solution, self.fixed_ids.as_ref());
        let max = self.feasible_additions(solution, adds.len());
        let mut moves: Vec<Box<dyn Move<SubsetSolution>>> = Vec::new();
        for k in 1..=max {
            for add in k_combinations(&adds, k) {
                moves.push(Box::new(SubsetMove::general(
                    add.iter().copied(),
                    std::iter::empty(),
                )));
            }
        }
        moves
    }
}

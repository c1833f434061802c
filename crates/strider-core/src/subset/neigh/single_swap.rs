//! Single swap neighbourhood.

use std::collections::HashSet;

use rand::seq::IndexedRandom;
use rand::RngCore;

use crate::neigh::{Move, Neighbourhood};
use crate::subset::moves::SubsetMove;
use crate::subset::neigh::{addition_candidates, deletion_candidates};
use crate::subset::solution::SubsetSolution;

/// Neighbourhood generating all moves that swap one selected id for
/// one unselected id.
///
/// Swaps never change the subset size, so this neighbourhood is only
/// suited for fixed-size subset problems; use
/// [`SinglePerturbationNeighbourhood`](crate::subset::neigh::SinglePerturbationNeighbourhood)
/// when the size may vary.
#[derive(Debug, Default)]
pub struct SingleSwapNeighbourhood {
    fixed_ids: Option<HashSet<u32>>,
}

impl SingleSwapNeighbourhood {
    pub fn new() -> Self {
        Self::default()
    }

    /// Excludes the given ids from both sides of every swap.
    pub fn with_fixed_ids(fixed_ids: HashSet<u32>) -> Self {
        Self {
            fixed_ids: Some(fixed_ids),
        }
    }
}

impl Neighbourhood<SubsetSolution> for SingleSwapNeighbourhood {
    fn random_move(
        &self,
        solution: &SubsetSolution,
        rng: &mut dyn RngCore,
    ) -> Option<Box<dyn Move<SubsetSolution>>> {
        let adds = addition_candidates(solution, self.fixed_ids.as_ref());
        let deletes = deletion_candidates(solution, self.fixed_ids.as_ref());
        let &add = adds.choose(rng)?;
        let &delete = deletes.choose(rng)?;
        Some(Box::new(SubsetMove::swap(add, delete)))
    }

    fn all_moves(&self, solution: &SubsetSolution) -> Vec<Box<dyn Move<SubsetSolution>>> {
        let adds = addition_candidates(solution, self.fixed_ids.as_ref());
        let deletes = deletion_candidates(solution, self.fixed_ids.as_ref());
        let mut moves: Vec<Box<dyn Move<SubsetSolution>>> =
            Vec::with_capacity(adds.len() * deletes.len());
        for &add in &adds {
            for &delete in &deletes {
                moves.push(Box::new(SubsetMove::swap(add, delete)));
            }
        }
        moves
    }
}

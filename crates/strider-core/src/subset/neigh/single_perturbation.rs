//! Single perturbation neighbourhood.

use std::collections::HashSet;

use rand::seq::IndexedRandom;
use rand::RngCore;

use crate::error::{Result, StriderError};
use crate::neigh::{Move, Neighbourhood};
use crate::subset::moves::SubsetMove;
use crate::subset::neigh::{addition_candidates, deletion_candidates};
use crate::subset::solution::SubsetSolution;

#[derive(Clone, Copy, Debug)]
enum MoveKind {
    Addition,
    Deletion,
    Swap,
}

/// Neighbourhood generating swap, addition and deletion moves, only
/// emitting those kinds whose resulting subset size stays within the
/// configured bounds.
///
/// Suited for variable-size subset problems, in contrast to
/// [`SingleSwapNeighbourhood`](crate::subset::neigh::SingleSwapNeighbourhood).
/// For a random move, the set of valid kinds for the current solution
/// is computed first, one kind is picked uniformly, and then a uniform
/// candidate of that kind is generated.
#[derive(Debug)]
pub struct SinglePerturbationNeighbourhood {
    min_size: usize,
    max_size: usize,
    fixed_ids: Option<HashSet<u32>>,
}

impl SinglePerturbationNeighbourhood {
    pub fn new(min_size: usize, max_size: usize) -> Result<Self> {
        if min_size > max_size {
            return Err(StriderError::Configuration(format!(
                "minimum subset size {min_size} exceeds maximum subset size {max_size}"
            )));
        }
        Ok(Self {
            min_size,
            max_size,
            fixed_ids: None,
        })
    }

    /// Excludes the given ids from addition, deletion and swapping.
    pub fn with_fixed_ids(mut self, fixed_ids: HashSet<u32>) -> Self {
        self.fixed_ids = Some(fixed_ids);
        self
    }

    pub fn min_size(&self) -> usize {
        self.min_size
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    fn size_ok(&self, size: usize) -> bool {
        size >= self.min_size && size <= self.max_size
    }

    fn valid_kinds(
        &self,
        solution: &SubsetSolution,
        adds: &[u32],
        deletes: &[u32],
    ) -> Vec<MoveKind> {
        let size = solution.num_selected();
        let mut kinds = Vec::with_capacity(3);
        if !adds.is_empty() && self.size_ok(size + 1) {
            kinds.push(MoveKind::Addition);
        }
        if !deletes.is_empty() && size > 0 && self.size_ok(size - 1) {
            kinds.push(MoveKind::Deletion);
        }
        if !adds.is_empty() && !deletes.is_empty() && self.size_ok(size) {
            kinds.push(MoveKind::Swap);
        }
        kinds
    }
}

impl Neighbourhood<SubsetSolution> for SinglePerturbationNeighbourhood {
    fn random_move(
        &self,
        solution: &SubsetSolution,
        rng: &mut dyn RngCore,
    ) -> Option<Box<dyn Move<SubsetSolution>>> {
        let adds = addition_candidates(solution, self.fixed_ids.as_ref());
        let deletes = deletion_candidates(solution, self.fixed_ids.as_ref());
        let kinds = self.valid_kinds(solution, &adds, &deletes);
        let &kind = kinds.choose(rng)?;
        match kind {
            MoveKind::Addition => {
                let &add = adds.choose(rng)?;
                Some(Box::new(SubsetMove::addition(add)))
            }
            MoveKind::Deletion => {
                let &delete = deletes.choose(rng)?;
                Some(Box::new(SubsetMove::deletion(delete)))
            }
            MoveKind::Swap => {
                let &add = adds.choose(rng)?;
                let &delete = deletes.choose(rng)?;
                Some(Box::new(SubsetMove::swap(add, delete)))
            }
        }
    }

    fn all_moves(&self, solution: &SubsetSolution) -> Vec<Box<dyn Move<SubsetSolution>>> {
        let adds = addition_candidates(solution, self.fixed_ids.as_ref());
        let deletes = deletion_candidates(solution, self.fixed_ids.as_ref());
        let mut moves: Vec<Box<dyn Move<SubsetSolution>>> = Vec::new();
        for kind in self.valid_kinds(solution, &adds, &deletes) {
            match kind {
                MoveKind::Addition => {
                    moves.extend(
                        adds.iter()
                            .map(|&add| Box::new(SubsetMove::addition(add)) as _),
                    );
                }
                MoveKind::Deletion => {
                    moves.extend(
                        deletes
                            .iter()
                            .map(|&delete| Box::new(SubsetMove::deletion(delete)) as _),
                    );
                }
                MoveKind::Swap => {
                    for &add in &adds {
                        moves.extend(
                            deletes
                                .iter()
                                .map(|&delete| Box::new(SubsetMove::swap(add, delete)) as _),
                        );
                    }
                }
            }
        }
        moves
    }
}

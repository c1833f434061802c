//! Neighbourhoods over subset solutions.
//!
//! All neighbourhoods accept an optional set of fixed ids: those ids
//! are never considered for addition, deletion or swapping.

mod multi_addition;
mod multi_deletion;
mod multi_swap;
mod single_addition;
mod single_deletion;
mod single_perturbation;
mod single_swap;

pub use multi_addition::MultiAdditionNeighbourhood;
pub use multi_deletion::MultiDeletionNeighbourhood;
pub use multi_swap::MultiSwapNeighbourhood;
pub use single_addition::SingleAdditionNeighbourhood;
pub use single_deletion::SingleDeletionNeighbourhood;
pub use single_perturbation::SinglePerturbationNeighbourhood;
pub use single_swap::SingleSwapNeighbourhood;

use std::collections::HashSet;

use crate::subset::solution::SubsetSolution;

/// Unselected ids that may be added, excluding fixed ids.
pub(crate) fn addition_candidates(
    solution: &SubsetSolution,
    fixed: Option<&HashSet<u32>>,
) -> Vec<u32> {
    solution
        .unselected_ids()
        .filter(|id| fixed.map_or(true, |f| !f.contains(id)))
        .collect()
}

/// Selected ids that may be deleted, excluding fixed ids.
pub(crate) fn deletion_candidates(
    solution: &SubsetSolution,
    fixed: Option<&HashSet<u32>>,
) -> Vec<u32> {
    solution
        .selected_ids()
        .filter(|id| fixed.map_or(true, |f| !f.contains(id)))
        .collect()
}

/// All k-element combinations of the given ids.
pub(crate) fn k_combinations(items: &[u32], k: usize) -> Vec<Vec<u32>> {
    fn recurse(
        items: &[u32],
        k: usize,
        start: usize,
        current: &mut Vec<u32>,
        out: &mut Vec<Vec<u32>>,
    ) {
        if current.len() == k {
            out.push(current.clone());
            return;
        }
        let needed = k - current.len();
        for i in start..=items.len().saturating_sub(needed) {
            current.push(items[i]);
            recurse(items, k, i + 1, current, out);
            current.pop();
        }
    }
    let mut out = Vec::new();
    if k > 0 && k <= items.len() {
        recurse(items, k, 0, &mut Vec::with_capacity(k), &mut out);
    }
    out
}

//! Exhaustive enumeration of subset solutions.

use crate::error::{Result, StriderError};
use crate::subset::solution::SubsetSolution;

/// Iterator over every subset of the given id universe whose size lies
/// within the given bounds, in increasing size order. Feeds exhaustive
/// searches over subset problems.
pub struct SubsetSolutionIterator {
    ids: Vec<u32>,
    max_size: usize,
    size: usize,
    indices: Vec<usize>,
    done: bool,
}

impl SubsetSolutionIterator {
    pub fn new(
        ids: impl IntoIterator<Item = u32>,
        min_size: usize,
        max_size: usize,
    ) -> Result<Self> {
        let ids: Vec<u32> = ids.into_iter().collect();
        if ids.is_empty() {
            return Err(StriderError::Configuration(
                "subset enumeration requires a non-empty set of ids".to_string(),
            ));
        }
        if min_size > max_size || max_size > ids.len() {
            return Err(StriderError::Configuration(format!(
                "invalid subset size bounds [{min_size}, {max_size}] for {} ids",
                ids.len()
            )));
        }
        Ok(Self {
            indices: (0..min_size).collect(),
            size: min_size,
            max_size,
            ids,
            done: false,
        })
    }

    // Advances the combination odometer; false when the current size
    // is exhausted.
    fn advance(&mut self) -> bool {
        let n = self.ids.len();
        let k = self.indices.len();
        for i in (0..k).rev() {
            if self.indices[i] < n - (k - i) {
                self.indices[i] += 1;
                for j in i + 1..k {
                    self.indices[j] = self.indices[j - 1] + 1;
                }
                return true;
            }
        }
        false
    }
}

impl Iterator for SubsetSolutionIterator {
    type Item = SubsetSolution;

    fn next(&mut self) -> Option<SubsetSolution> {
        if self.done {
            return None;
        }
        let solution = SubsetSolution::assemble(
            self.ids.iter().copied(),
            self.indices.iter().map(|&i| self.ids[i]),
            None,
        );
        if !self.advance() {
            self.size += 1;
            if self.size > self.max_size {
                self.done = true;
            } else {
                self.indices = (0..self.size).collect();
            }
        }
        Some(solution)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn enumerates_all_subsets_within_bounds() {
        let solutions: Vec<SubsetSolution> =
            SubsetSolutionIterator::new(0..4, 1, 2).unwrap().collect();
        // C(4,1) + C(4,2) = 4 + 6.
        assert_eq!(solutions.len(), 10);
        let distinct: HashSet<SubsetSolution> = solutions.iter().cloned().collect();
        assert_eq!(distinct.len(), 10);
        assert!(solutions
            .iter()
            .all(|s| s.num_selected() >= 1 && s.num_selected() <= 2));
    }

    #[test]
    fn includes_the_empty_subset_when_allowed() {
        let solutions: Vec<SubsetSolution> =
            SubsetSolutionIterator::new(0..3, 0, 3).unwrap().collect();
        assert_eq!(solutions.len(), 8);
        assert_eq!(solutions[0].num_selected(), 0);
        assert_eq!(solutions[7].num_selected(), 3);
    }

    #[test]
    fn rejects_invalid_bounds() {
        assert!(SubsetSolutionIterator::new(0..3, 2, 1).is_err());
        assert!(SubsetSolutionIterator::new(0..3, 0, 4).is_err());
        assert!(SubsetSolutionIterator::new([], 0, 0).is_err());
    }
}

//! Greedy (L, R) subset construction.

use std::sync::Arc;

use strider_core::error::{Result, StriderError};
use strider_core::eval::improvement_delta;
use strider_core::problem::Problem;
use strider_core::subset::{IdentifiedData, SubsetMove, SubsetProblem, SubsetSolution};

use crate::local::{LocalSearch, LocalSearchCore};
use crate::search::{Search, SearchCore};

/// Greedy subset construction with parameters `L ≠ R`.
///
/// When `L > R` the search starts from the empty subset and grows;
/// when `R > L` it starts from the full subset and shrinks. Every step
/// greedily performs the `L` best additions followed by the `R` best
/// deletions, each chosen by delta evaluation and committed regardless
/// of sign, moving the subset size by `L − R` net items. The search
/// stops once the size no longer changes, i.e. when it has reached the
/// problem's size bound.
///
/// Intermediate solutions outside the problem's size bounds are
/// invalid and never become the best solution; the best is only
/// updated once the constructed subset is valid.
pub struct LrSubsetSearch<D: IdentifiedData + 'static> {
    local: LocalSearchCore<SubsetSolution>,
    problem: Arc<SubsetProblem<D>>,
    l: usize,
    r: usize,
}

impl<D: IdentifiedData + 'static> LrSubsetSearch<D> {
    pub fn new(problem: Arc<SubsetProblem<D>>, l: usize, r: usize) -> Result<Self> {
        if l == r {
            return Err(StriderError::Configuration(format!(
                "LR subset search requires L != R, got L = R = {l}"
            )));
        }
        Ok(Self {
            local: LocalSearchCore::new("LRSubsetSearch", problem.clone()),
            problem,
            l,
            r,
        })
    }

    pub fn l(&self) -> usize {
        self.l
    }

    pub fn r(&self) -> usize {
        self.r
    }

    fn current_size(&self) -> Result<usize> {
        self.local
            .current()
            .map(|triple| triple.solution().num_selected())
            .ok_or_else(|| StriderError::Search("no current solution".to_string()))
    }

    // Greedily commits the best single addition or deletion by delta
    // evaluation. Returns false when no candidate move exists.
    fn apply_best(&mut self, addition: bool) -> Result<bool> {
        let problem: Arc<dyn Problem<SubsetSolution>> = self.problem.clone();
        let minimizing = problem.is_minimizing();
        let best = {
            let mut guard = self.local.current_cell().lock().unwrap();
            let triple = guard.as_mut().ok_or_else(|| {
                StriderError::Search("no current solution".to_string())
            })?;
            let current_value = triple.evaluation().value();
            let candidates: Vec<u32> = if addition {
                triple.solution().unselected_ids().collect()
            } else {
                triple.solution().selected_ids().collect()
            };
            let mut best: Option<(SubsetMove, f64)> = None;
            for id in candidates {
                let mv = if addition {
                    SubsetMove::addition(id)
                } else {
                    SubsetMove::deletion(id)
                };
                let (solution, current_evaluation, _) = triple.parts_mut();
                let evaluation = problem.evaluate_delta(&mv, solution, current_evaluation)?;
                let delta = improvement_delta(evaluation.value(), current_value, minimizing);
                if best.as_ref().map_or(true, |(_, best_delta)| delta > *best_delta) {
                    best = Some((mv, delta));
                }
            }
            best
        };
        match best {
            Some((mv, _)) => {
                self.local.apply_move(&mv)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

impl<D: IdentifiedData + 'static> Search<SubsetSolution> for LrSubsetSearch<D> {
    fn core(&self) -> &SearchCore<SubsetSolution> {
        self.local.core()
    }

    fn core_mut(&mut self) -> &mut SearchCore<SubsetSolution> {
        self.local.core_mut()
    }

    // Starts from the empty subset when growing, the full subset when
    // shrinking, unless a custom current solution was set.
    fn init(&mut self) -> Result<()> {
        if self.local.current().is_none() {
            let start = if self.l > self.r {
                self.problem.empty_solution()
            } else {
                self.problem.full_solution()
            };
            self.local.install_solution(start);
        }
        Ok(())
    }

    fn search_step(&mut self) -> Result<()> {
        let size_before = self.current_size()?;
        for _ in 0..self.l {
            if self.current_size()? >= self.problem.max_size() {
                break;
            }
            if !self.apply_best(true)? {
                break;
            }
        }
        for _ in 0..self.r {
            if self.current_size()? <= self.problem.min_size() {
                break;
            }
            if !self.apply_best(false)? {
                break;
            }
        }
        if self.current_size()? == size_before {
            self.core().shared().request_stop();
        }
        Ok(())
    }
}

impl<D: IdentifiedData + 'static> LocalSearch<SubsetSolution> for LrSubsetSearch<D> {
    fn local(&self) -> &LocalSearchCore<SubsetSolution> {
        &self.local
    }

    fn local_mut(&mut self) -> &mut LocalSearchCore<SubsetSolution> {
        &mut self.local
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::SearchStatus;
    use crate::test_util::{selected_ids, sum_problem};
    use std::collections::BTreeSet;

    #[test]
    fn rejects_equal_parameters() {
        let problem = sum_problem(6, 2, 2);
        assert!(LrSubsetSearch::new(problem, 2, 2).is_err());
    }

    #[test]
    fn grows_greedily_from_the_empty_subset_when_l_exceeds_r() {
        let problem = sum_problem(8, 3, 3);
        let mut search = LrSubsetSearch::new(problem, 2, 1).unwrap();
        search.start().unwrap();

        assert_eq!(search.status(), SearchStatus::Idle);
        let best = search.best_solution().unwrap();
        assert_eq!(selected_ids(&best), BTreeSet::from([5, 6, 7]));
        assert_eq!(search.best_evaluation().unwrap().value(), 18.0);
        assert!(search.best_validation().unwrap().passed());
    }

    #[test]
    fn shrinks_greedily_from_the_full_subset_when_r_exceeds_l() {
        let problem = sum_problem(5, 2, 2);
        let mut search = LrSubsetSearch::new(problem, 1, 2).unwrap();
        search.start().unwrap();

        let best = search.best_solution().unwrap();
        assert_eq!(selected_ids(&best), BTreeSet::from([3, 4]));
        assert_eq!(search.best_evaluation().unwrap().value(), 7.0);
    }
}

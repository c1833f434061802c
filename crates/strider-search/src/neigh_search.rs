//! Shared policy of neighbourhood searches: move validation and
//! evaluation through the delta protocol, acceptance bookkeeping and
//! best-move selection.

use std::sync::Arc;

use strider_core::error::{Result, StriderError};
use strider_core::eval::{improvement_delta, Evaluation};
use strider_core::neigh::{Move, Neighbourhood};
use strider_core::problem::Problem;
use strider_core::solution::Solution;
use strider_core::validation::Validation;

use crate::local::LocalSearchCore;

/// Filter deciding whether a move may be selected by
/// [`NeighbourhoodSearchCore::best_move`]. Receives the move, the
/// current solution and the evaluation of the neighbour the move leads
/// to.
pub type MoveFilter<'a, S> = dyn FnMut(&dyn Move<S>, &S, &Arc<dyn Evaluation>) -> bool + 'a;

/// State and policy shared by all neighbourhood searches.
///
/// Constructed with a single neighbourhood or a prioritised list of
/// them; algorithms that work on exactly one neighbourhood use the
/// first.
pub struct NeighbourhoodSearchCore<S: Solution> {
    local: LocalSearchCore<S>,
    neighbourhoods: Vec<Arc<dyn Neighbourhood<S>>>,
}

impl<S: Solution> NeighbourhoodSearchCore<S> {
    pub fn single(
        name: impl Into<String>,
        problem: Arc<dyn Problem<S>>,
        neighbourhood: Arc<dyn Neighbourhood<S>>,
    ) -> Self {
        Self {
            local: LocalSearchCore::new(name, problem),
            neighbourhoods: vec![neighbourhood],
        }
    }

    pub fn multi(
        name: impl Into<String>,
        problem: Arc<dyn Problem<S>>,
        neighbourhoods: Vec<Arc<dyn Neighbourhood<S>>>,
    ) -> Result<Self> {
        if neighbourhoods.is_empty() {
            return Err(StriderError::Configuration(
                "a neighbourhood search requires at least one neighbourhood".to_string(),
            ));
        }
        Ok(Self {
            local: LocalSearchCore::new(name, problem),
            neighbourhoods,
        })
    }

    pub fn local(&self) -> &LocalSearchCore<S> {
        &self.local
    }

    pub fn local_mut(&mut self) -> &mut LocalSearchCore<S> {
        &mut self.local
    }

    /// The neighbourhood of a single-neighbourhood search.
    pub fn neighbourhood(&self) -> &Arc<dyn Neighbourhood<S>> {
        &self.neighbourhoods[0]
    }

    pub fn neighbourhoods(&self) -> &[Arc<dyn Neighbourhood<S>>] {
        &self.neighbourhoods
    }

    /// Replaces the neighbourhood of a single-neighbourhood search.
    /// Only allowed while the search is idle.
    pub fn set_neighbourhood(&mut self, neighbourhood: Arc<dyn Neighbourhood<S>>) -> Result<()> {
        self.local.core().ensure_idle("replacing the neighbourhood")?;
        self.neighbourhoods[0] = neighbourhood;
        Ok(())
    }

    /// Random move from the first neighbourhood.
    pub fn random_move(&mut self) -> Option<Box<dyn Move<S>>> {
        self.random_move_from(0)
    }

    /// Random move from the neighbourhood at the given index.
    pub fn random_move_from(&mut self, index: usize) -> Option<Box<dyn Move<S>>> {
        let neighbourhood = self.neighbourhoods[index].clone();
        let cell = self.local.current_cell().clone();
        let guard = cell.lock().unwrap();
        let triple = guard.as_ref()?;
        neighbourhood.random_move(triple.solution(), self.local.core_mut().rng_mut())
    }

    /// All moves of the first neighbourhood for the current solution.
    pub fn all_moves(&self) -> Vec<Box<dyn Move<S>>> {
        let guard = self.local.current_cell().lock().unwrap();
        match guard.as_ref() {
            Some(triple) => self.neighbourhoods[0].all_moves(triple.solution()),
            None => Vec::new(),
        }
    }

    /// Delta validation of a move against the current solution.
    pub fn validate_move(&self, mv: &dyn Move<S>) -> Result<Arc<dyn Validation>> {
        let problem = self.local.problem().clone();
        let mut guard = self.local.current_cell().lock().unwrap();
        let triple = guard.as_mut().ok_or_else(no_current)?;
        let (solution, _, current_validation) = triple.parts_mut();
        problem.validate_delta(mv, solution, current_validation)
    }

    /// Delta evaluation of a move against the current solution.
    pub fn evaluate_move(&self, mv: &dyn Move<S>) -> Result<Arc<dyn Evaluation>> {
        let problem = self.local.problem().clone();
        let mut guard = self.local.current_cell().lock().unwrap();
        let triple = guard.as_mut().ok_or_else(no_current)?;
        let (solution, current_evaluation, _) = triple.parts_mut();
        problem.evaluate_delta(mv, solution, current_evaluation)
    }

    /// Whether the given move leads to an improvement: a valid
    /// neighbour that is strictly better than the current solution.
    /// When the current solution is itself invalid, any valid
    /// neighbour counts as an improvement, so the search can escape an
    /// invalid start.
    pub fn is_improvement(&self, mv: &dyn Move<S>) -> Result<bool> {
        let problem = self.local.problem().clone();
        let minimizing = self.local.core().is_minimizing();
        let mut guard = self.local.current_cell().lock().unwrap();
        let triple = guard.as_mut().ok_or_else(no_current)?;
        let current_valid = triple.validation().passed();
        let current_value = triple.evaluation().value();
        let (solution, current_evaluation, current_validation) = triple.parts_mut();
        let validation = problem.validate_delta(mv, solution, current_validation)?;
        if !validation.passed() {
            return Ok(false);
        }
        if !current_valid {
            return Ok(true);
        }
        let evaluation = problem.evaluate_delta(mv, solution, current_evaluation)?;
        Ok(improvement_delta(evaluation.value(), current_value, minimizing) > 0.0)
    }

    /// Accepts a move: validates and evaluates it through the delta
    /// protocol, applies it to the current solution, installs the new
    /// triple and updates the best solution if improved. Returns false
    /// without applying anything when the move leads to an invalid
    /// neighbour, counting it as rejected.
    pub fn accept(&mut self, mv: &dyn Move<S>) -> Result<bool> {
        let problem = self.local.problem().clone();
        let updated = {
            let mut guard = self.local.current_cell().lock().unwrap();
            let triple = guard.as_mut().ok_or_else(no_current)?;
            let (solution, current_evaluation, current_validation) = triple.parts_mut();
            let validation = problem.validate_delta(mv, solution, current_validation)?;
            if validation.passed() {
                let evaluation = problem.evaluate_delta(mv, solution, current_evaluation)?;
                mv.apply(solution)?;
                triple.set_evaluation(evaluation);
                triple.set_validation(validation);
                Some(triple.clone())
            } else {
                None
            }
        };
        let shared = self.local.core().shared();
        match updated {
            Some(triple) => {
                shared.counters.inc_accepted();
                shared.fire_new_current(&triple);
                shared.update_best(&triple);
                Ok(true)
            }
            None => {
                shared.counters.inc_rejected();
                Ok(false)
            }
        }
    }

    /// Rejects the proposed move: bookkeeping only, no state change.
    pub fn reject(&self) {
        self.local.core().shared().counters.inc_rejected();
    }

    /// Selects the best move out of `moves` by delta evaluation,
    /// skipping invalid moves and moves the filter rejects.
    ///
    /// With `accept_first_improvement`, the first strictly improving
    /// move encountered is returned immediately. With
    /// `require_improvement`, `None` is returned unless the best move
    /// found is an improvement. When the current solution is invalid,
    /// every valid neighbour counts as improving; if additionally no
    /// move leads to a valid neighbour, no move qualifies and `None`
    /// is returned.
    pub fn best_move(
        &self,
        moves: &[Box<dyn Move<S>>],
        require_improvement: bool,
        accept_first_improvement: bool,
        mut filter: Option<&mut MoveFilter<'_, S>>,
    ) -> Result<Option<usize>> {
        let problem = self.local.problem().clone();
        let minimizing = self.local.core().is_minimizing();
        let mut guard = self.local.current_cell().lock().unwrap();
        let triple = guard.as_mut().ok_or_else(no_current)?;
        let current_valid = triple.validation().passed();
        let current_value = triple.evaluation().value();
        let mut best: Option<(usize, f64)> = None;
        for (index, mv) in moves.iter().enumerate() {
            let (solution, current_evaluation, current_validation) = triple.parts_mut();
            let validation = problem.validate_delta(mv.as_ref(), solution, current_validation)?;
            if !validation.passed() {
                continue;
            }
            let evaluation = problem.evaluate_delta(mv.as_ref(), solution, current_evaluation)?;
            if let Some(filter) = filter.as_mut() {
                if !filter(mv.as_ref(), solution, &evaluation) {
                    continue;
                }
            }
            let delta = improvement_delta(evaluation.value(), current_value, minimizing);
            let improving = !current_valid || delta > 0.0;
            if accept_first_improvement && improving {
                return Ok(Some(index));
            }
            if best.map_or(true, |(_, best_delta)| delta > best_delta) {
                best = Some((index, delta));
            }
        }
        Ok(best.and_then(|(index, delta)| {
            (!require_improvement || !current_valid || delta > 0.0).then_some(index)
        }))
    }
}

fn no_current() -> StriderError {
    StriderError::Search("the search has no current solution".to_string())
}

//! Local search: searches that maintain a current solution.

use std::sync::{Arc, Mutex};

use strider_core::error::{Result, StriderError};
use strider_core::eval::Evaluation;
use strider_core::neigh::Move;
use strider_core::problem::Problem;
use strider_core::solution::Solution;
use strider_core::validation::Validation;

use crate::search::{EvaluatedSolution, Search, SearchCore};

/// Shared state of every local search: the problem handle and the
/// current solution with its evaluation and validation.
///
/// The current solution sits behind a mutex because parallel
/// algorithms update it from replica listeners running on worker
/// threads.
pub struct LocalSearchCore<S: Solution> {
    core: SearchCore<S>,
    problem: Arc<dyn Problem<S>>,
    current: Arc<Mutex<Option<EvaluatedSolution<S>>>>,
}

impl<S: Solution> LocalSearchCore<S> {
    pub fn new(name: impl Into<String>, problem: Arc<dyn Problem<S>>) -> Self {
        let minimizing = problem.is_minimizing();
        Self {
            core: SearchCore::new(name, minimizing),
            problem,
            current: Arc::new(Mutex::new(None)),
        }
    }

    pub fn core(&self) -> &SearchCore<S> {
        &self.core
    }

    pub fn core_mut(&mut self) -> &mut SearchCore<S> {
        &mut self.core
    }

    pub fn problem(&self) -> &Arc<dyn Problem<S>> {
        &self.problem
    }

    /// Copy-on-read snapshot of the current solution triple.
    pub fn current(&self) -> Option<EvaluatedSolution<S>> {
        self.current.lock().unwrap().clone()
    }

    /// Value of the current solution's evaluation.
    pub fn current_value(&self) -> Option<f64> {
        self.current
            .lock()
            .unwrap()
            .as_ref()
            .map(|triple| triple.evaluation().value())
    }

    pub(crate) fn current_cell(&self) -> &Arc<Mutex<Option<EvaluatedSolution<S>>>> {
        &self.current
    }

    /// Generates a random current solution if none has been set yet.
    pub fn init_current(&mut self) -> Result<()> {
        if self.current.lock().unwrap().is_some() {
            return Ok(());
        }
        let problem = self.problem.clone();
        let solution = problem.random_solution(self.core.rng_mut());
        self.install_solution(solution);
        Ok(())
    }

    /// Installs a new current solution: evaluates and validates it in
    /// full, notifies listeners and updates the best solution if the
    /// new one is valid and strictly better.
    pub fn install_solution(&self, solution: S) {
        let evaluation = self.problem.evaluate(&solution);
        let validation = self.problem.validate(&solution);
        self.install_triple(EvaluatedSolution::new(solution, evaluation, validation));
    }

    /// Installs an already evaluated triple without recomputation.
    pub(crate) fn install_triple(&self, triple: EvaluatedSolution<S>) {
        *self.current.lock().unwrap() = Some(triple.clone());
        let shared = self.core.shared();
        shared.fire_new_current(&triple);
        shared.update_best(&triple);
    }

    pub(crate) fn set_current_solution(&mut self, solution: S) -> Result<()> {
        self.core.ensure_idle("setting the current solution")?;
        self.install_solution(solution);
        Ok(())
    }

    /// Applies a move to the current solution through the delta
    /// protocol, installing the resulting triple whether or not it is
    /// valid. Greedy construction heuristics commit their chosen move
    /// unconditionally through this.
    pub(crate) fn apply_move(&self, mv: &dyn Move<S>) -> Result<()> {
        let problem = self.problem.clone();
        let updated = {
            let mut guard = self.current.lock().unwrap();
            let triple = guard.as_mut().ok_or_else(|| {
                StriderError::Search("cannot apply a move without a current solution".to_string())
            })?;
            let (solution, current_evaluation, current_validation) = triple.parts_mut();
            let validation = problem.validate_delta(mv, solution, current_validation)?;
            let evaluation = problem.evaluate_delta(mv, solution, current_evaluation)?;
            mv.apply(solution)?;
            triple.set_evaluation(evaluation);
            triple.set_validation(validation);
            triple.clone()
        };
        let shared = self.core.shared();
        shared.fire_new_current(&updated);
        shared.update_best(&updated);
        Ok(())
    }
}

/// A search that iteratively transforms a current solution.
pub trait LocalSearch<S: Solution>: Search<S> {
    fn local(&self) -> &LocalSearchCore<S>;

    fn local_mut(&mut self) -> &mut LocalSearchCore<S>;

    /// Sets a custom current solution. Only allowed while the search
    /// is idle; the solution is evaluated and validated immediately
    /// and may become the new best.
    fn set_current_solution(&mut self, solution: S) -> Result<()> {
        self.local_mut().set_current_solution(solution)
    }

    /// Copy of the current solution.
    fn current_solution(&self) -> Option<S> {
        self.local().current().map(|t| t.solution().clone())
    }

    fn current_evaluation(&self) -> Option<Arc<dyn Evaluation>> {
        self.local().current().map(|t| t.evaluation().clone())
    }

    fn current_validation(&self) -> Option<Arc<dyn Validation>> {
        self.local().current().map(|t| t.validation().clone())
    }
}

//! Sequential composition of local searches.

use std::sync::Arc;

use strider_core::error::{Result, StriderError};
use strider_core::problem::Problem;
use strider_core::solution::Solution;

use crate::local::{LocalSearch, LocalSearchCore};
use crate::search::{EvaluatedSolution, Search, SearchCore};

/// Pipes a sequence of local searches: every search starts from the
/// best solution of its predecessor, and the output of the last one is
/// the result of the pipe.
///
/// The entire pipe executes within a single search step, after which
/// the search stops. Every composed search should therefore terminate
/// on its own or carry its own stop criteria.
pub struct PipedLocalSearch<S: Solution> {
    local: LocalSearchCore<S>,
    pipeline: Vec<Box<dyn LocalSearch<S>>>,
}

impl<S: Solution> PipedLocalSearch<S> {
    pub fn new(
        problem: Arc<dyn Problem<S>>,
        pipeline: Vec<Box<dyn LocalSearch<S>>>,
    ) -> Result<Self> {
        if pipeline.is_empty() {
            return Err(StriderError::Configuration(
                "a piped local search requires at least one search".to_string(),
            ));
        }
        Ok(Self {
            local: LocalSearchCore::new("PipedLocalSearch", problem),
            pipeline,
        })
    }
}

impl<S: Solution> Search<S> for PipedLocalSearch<S> {
    fn core(&self) -> &SearchCore<S> {
        self.local.core()
    }

    fn core_mut(&mut self) -> &mut SearchCore<S> {
        self.local.core_mut()
    }

    fn init(&mut self) -> Result<()> {
        self.local.init_current()
    }

    fn search_step(&mut self) -> Result<()> {
        let mut piped = self
            .local
            .current()
            .ok_or_else(|| StriderError::Search("no current solution".to_string()))?;
        for search in &mut self.pipeline {
            search.set_current_solution(piped.solution().clone())?;
            search.start()?;
            if let (Some(solution), Some(evaluation), Some(validation)) = (
                search.best_solution(),
                search.best_evaluation(),
                search.best_validation(),
            ) {
                piped = EvaluatedSolution::new(solution, evaluation, validation);
            }
        }
        self.local.install_triple(piped);
        self.core().shared().request_stop();
        Ok(())
    }

    fn on_dispose(&mut self) {
        for search in &mut self.pipeline {
            let _ = search.dispose();
        }
    }
}

impl<S: Solution> LocalSearch<S> for PipedLocalSearch<S> {
    fn local(&self) -> &LocalSearchCore<S> {
        &self.local
    }

    fn local_mut(&mut self) -> &mut LocalSearchCore<S> {
        &mut self.local
    }
}

//! Search base: lifecycle state machine, best-solution accounting and
//! the uniform outer surface of every algorithm.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use tracing::{debug, info};

use strider_core::error::{Result, StriderError};
use strider_core::eval::{improvement_delta, Evaluation};
use strider_core::random;
use strider_core::solution::Solution;
use strider_core::validation::Validation;

use crate::counters::SearchCounters;
use crate::listener::SearchListener;
use crate::status::SearchStatus;
use crate::stop::checker::{spawn_checker, CheckerHandle};
use crate::stop::StopCriterion;

/// A solution together with its evaluation and validation, as tracked
/// for the current and best solutions of a search.
#[derive(Clone, Debug)]
pub struct EvaluatedSolution<S: Solution> {
    solution: S,
    evaluation: Arc<dyn Evaluation>,
    validation: Arc<dyn Validation>,
}

impl<S: Solution> EvaluatedSolution<S> {
    pub fn new(
        solution: S,
        evaluation: Arc<dyn Evaluation>,
        validation: Arc<dyn Validation>,
    ) -> Self {
        Self {
            solution,
            evaluation,
            validation,
        }
    }

    pub fn solution(&self) -> &S {
        &self.solution
    }

    pub fn evaluation(&self) -> &Arc<dyn Evaluation> {
        &self.evaluation
    }

    pub fn validation(&self) -> &Arc<dyn Validation> {
        &self.validation
    }

    // Split borrow: mutable solution next to the previous evaluation
    // and validation, as the delta protocol requires.
    pub(crate) fn parts_mut(&mut self) -> (&mut S, &Arc<dyn Evaluation>, &Arc<dyn Validation>) {
        (&mut self.solution, &self.evaluation, &self.validation)
    }

    pub(crate) fn set_evaluation(&mut self, evaluation: Arc<dyn Evaluation>) {
        self.evaluation = evaluation;
    }

    pub(crate) fn set_validation(&mut self, validation: Arc<dyn Validation>) {
        self.validation = validation;
    }
}

/// State shared between a search, its listeners, its stop-criterion
/// checker and, for parallel algorithms, its worker threads.
///
/// Lock order, where several are held: best, then current solution,
/// then listeners.
pub(crate) struct SharedState<S: Solution> {
    name: String,
    minimizing: bool,
    stop_requested: AtomicBool,
    best: Mutex<Option<EvaluatedSolution<S>>>,
    listeners: Mutex<Vec<Box<dyn SearchListener<S>>>>,
    pub(crate) counters: SearchCounters,
}

impl<S: Solution> SharedState<S> {
    pub(crate) fn new(name: String, minimizing: bool) -> Self {
        Self {
            name,
            minimizing,
            stop_requested: AtomicBool::new(false),
            best: Mutex::new(None),
            listeners: Mutex::new(Vec::new()),
            counters: SearchCounters::new(),
        }
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn is_minimizing(&self) -> bool {
        self.minimizing
    }

    pub(crate) fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::SeqCst);
    }

    pub(crate) fn stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::SeqCst)
    }

    fn clear_stop(&self) {
        self.stop_requested.store(false, Ordering::SeqCst);
    }

    pub(crate) fn add_listener(&self, listener: Box<dyn SearchListener<S>>) {
        self.listeners.lock().unwrap().push(listener);
    }

    pub(crate) fn best(&self) -> Option<EvaluatedSolution<S>> {
        self.best.lock().unwrap().clone()
    }

    pub(crate) fn best_lock(&self) -> &Mutex<Option<EvaluatedSolution<S>>> {
        &self.best
    }

    /// Fires one callback on every registered listener.
    pub(crate) fn fire(&self, callback: impl Fn(&dyn SearchListener<S>, &SearchHandle<'_, S>)) {
        let handle = SearchHandle { shared: self };
        let listeners = self.listeners.lock().unwrap();
        for listener in listeners.iter() {
            callback(listener.as_ref(), &handle);
        }
    }

    pub(crate) fn fire_new_current(&self, current: &EvaluatedSolution<S>) {
        self.fire(|listener, handle| {
            listener.new_current_solution(
                handle,
                current.solution(),
                current.evaluation(),
                current.validation(),
            )
        });
    }

    /// Replaces the best solution if the candidate is valid and
    /// strictly better (ties never replace). `new_best_solution`
    /// listeners fire while the best lock is held, so observers see a
    /// consistent triple.
    pub(crate) fn update_best(&self, candidate: &EvaluatedSolution<S>) -> bool {
        let mut best = self.best.lock().unwrap();
        self.install_best(&mut best, candidate)
    }

    /// Best-solution update against an already acquired best guard;
    /// used by parallel algorithms that must update the current and
    /// best solution under one lock.
    pub(crate) fn install_best(
        &self,
        best: &mut Option<EvaluatedSolution<S>>,
        candidate: &EvaluatedSolution<S>,
    ) -> bool {
        if !candidate.validation().passed() {
            return false;
        }
        let delta = match best.as_ref() {
            Some(best) => improvement_delta(
                candidate.evaluation().value(),
                best.evaluation().value(),
                self.minimizing,
            ),
            None => f64::INFINITY,
        };
        if delta <= 0.0 {
            return false;
        }
        *best = Some(candidate.clone());
        self.counters
            .record_improvement(delta, candidate.evaluation().value());
        debug!(
            event = "new_best",
            search = %self.name,
            value = candidate.evaluation().value(),
        );
        let handle = SearchHandle { shared: self };
        let listeners = self.listeners.lock().unwrap();
        for listener in listeners.iter() {
            listener.new_best_solution(
                &handle,
                candidate.solution(),
                candidate.evaluation(),
                candidate.validation(),
            );
        }
        true
    }
}

/// Clonable handle for requesting termination of a running search
/// from another thread: obtain it before handing the search to a
/// worker, then call [`stop`](StopTrigger::stop) at any time.
pub struct StopTrigger<S: Solution> {
    shared: Arc<SharedState<S>>,
}

impl<S: Solution> Clone for StopTrigger<S> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<S: Solution> StopTrigger<S> {
    /// Requests cooperative termination. Idempotent.
    pub fn stop(&self) {
        self.shared.request_stop();
    }
}

/// Read-only view of a search handed to listeners and stop criteria.
///
/// The handle also allows requesting cooperative termination, which is
/// how e.g. a replica budget listener stops its replica.
pub struct SearchHandle<'a, S: Solution> {
    pub(crate) shared: &'a SharedState<S>,
}

impl<S: Solution> SearchHandle<'_, S> {
    pub fn name(&self) -> &str {
        self.shared.name()
    }

    pub fn is_minimizing(&self) -> bool {
        self.shared.is_minimizing()
    }

    /// Steps completed in the current run.
    pub fn steps(&self) -> u64 {
        self.shared.counters.steps()
    }

    pub fn runtime(&self) -> Option<Duration> {
        self.shared.counters.runtime()
    }

    pub fn steps_without_improvement(&self) -> Option<u64> {
        self.shared.counters.steps_without_improvement()
    }

    pub fn time_without_improvement(&self) -> Option<Duration> {
        self.shared.counters.time_without_improvement()
    }

    pub fn last_improvement_delta(&self) -> Option<f64> {
        self.shared.counters.last_improvement_delta()
    }

    /// Value of the best evaluation seen so far.
    pub fn best_value(&self) -> Option<f64> {
        self.shared.counters.best_value()
    }

    pub fn accepted_moves(&self) -> u64 {
        self.shared.counters.accepted()
    }

    pub fn rejected_moves(&self) -> u64 {
        self.shared.counters.rejected()
    }

    /// Requests cooperative termination of the search; the search
    /// stops before its next step begins.
    pub fn request_stop(&self) {
        self.shared.request_stop();
    }
}

/// State owned by every search: shared state handle, status machine,
/// dedicated random generator, and registered stop criteria.
pub struct SearchCore<S: Solution> {
    shared: Arc<SharedState<S>>,
    status: Mutex<SearchStatus>,
    rng: StdRng,
    criteria: Option<Vec<Box<dyn StopCriterion<S>>>>,
    checker_period: Duration,
}

impl<S: Solution> SearchCore<S> {
    pub fn new(name: impl Into<String>, minimizing: bool) -> Self {
        Self {
            shared: Arc::new(SharedState::new(name.into(), minimizing)),
            status: Mutex::new(SearchStatus::Idle),
            rng: random::new_generator(),
            criteria: Some(Vec::new()),
            checker_period: Duration::from_secs(1),
        }
    }

    pub fn name(&self) -> &str {
        self.shared.name()
    }

    pub fn status(&self) -> SearchStatus {
        *self.status.lock().unwrap()
    }

    pub fn is_minimizing(&self) -> bool {
        self.shared.is_minimizing()
    }

    /// The search's dedicated random generator.
    pub fn rng_mut(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    pub(crate) fn shared(&self) -> &Arc<SharedState<S>> {
        &self.shared
    }

    pub(crate) fn request_stop(&self) {
        self.shared.request_stop();
    }

    pub(crate) fn ensure_idle(&self, operation: &str) -> Result<()> {
        let status = self.status();
        if status != SearchStatus::Idle {
            return Err(StriderError::Status(format!(
                "{operation} requires an idle search, but it is {status}"
            )));
        }
        Ok(())
    }

    fn set_status(&self, status: SearchStatus) {
        *self.status.lock().unwrap() = status;
    }

    fn start_checker(&mut self) -> Option<CheckerHandle<S>> {
        let criteria = self.criteria.take().unwrap_or_default();
        if criteria.is_empty() {
            self.criteria = Some(criteria);
            return None;
        }
        Some(spawn_checker(
            self.shared.clone(),
            criteria,
            self.checker_period,
        ))
    }
}

/// A single-solution metaheuristic search.
///
/// Implementors provide access to their [`SearchCore`], an `init`
/// phase and a `search_step`; the lifecycle itself — status
/// transitions, stop-criterion checking, listener dispatch, counters —
/// is driven by the provided [`start`](Search::start).
pub trait Search<S: Solution>: Send {
    fn core(&self) -> &SearchCore<S>;

    fn core_mut(&mut self) -> &mut SearchCore<S>;

    /// Prepares the search for a run, e.g. by generating an initial
    /// solution. Called once per run, before any step.
    fn init(&mut self) -> Result<()>;

    /// Executes one step of the algorithm.
    fn search_step(&mut self) -> Result<()>;

    /// Hook invoked when a run terminates, before listeners are
    /// notified.
    fn on_stopped(&mut self) {}

    /// Hook invoked on disposal.
    fn on_dispose(&mut self) {}

    fn name(&self) -> &str {
        self.core().name()
    }

    fn status(&self) -> SearchStatus {
        self.core().status()
    }

    /// Runs the search until a stop criterion fires, [`stop`](Search::stop)
    /// is called, or the algorithm terminates internally.
    ///
    /// Errors raised by `init` or a step terminate the run and are
    /// surfaced here after the search has transitioned back to idle.
    fn start(&mut self) -> Result<()> {
        {
            let mut status = self.core().status.lock().unwrap();
            if *status != SearchStatus::Idle {
                return Err(StriderError::Status(format!(
                    "cannot start a search that is {status}"
                )));
            }
            *status = SearchStatus::Initializing;
        }
        let shared = self.core().shared.clone();
        shared.clear_stop();
        shared.counters.reset_for_run();
        info!(event = "search_start", search = %shared.name());

        if let Err(err) = self.init() {
            shared.counters.finish_run();
            self.core().set_status(SearchStatus::Idle);
            return Err(err);
        }
        shared.fire(|listener, handle| listener.search_started(handle));
        self.core().set_status(SearchStatus::Running);
        let checker = self.core_mut().start_checker();

        let mut step_error = None;
        while !shared.stop_requested() {
            let step_started = Instant::now();
            match self.search_step() {
                Ok(()) => {
                    shared.counters.record_step(step_started.elapsed());
                    let steps = shared.counters.steps();
                    shared.fire(|listener, handle| listener.step_completed(handle, steps));
                }
                Err(err) => {
                    step_error = Some(err);
                    break;
                }
            }
        }

        self.core().set_status(SearchStatus::Terminating);
        if let Some(checker) = checker {
            self.core_mut().criteria = Some(checker.stop());
        }
        shared.counters.finish_run();
        self.on_stopped();
        shared.fire(|listener, handle| listener.search_stopped(handle));
        info!(
            event = "search_stop",
            search = %shared.name(),
            steps = shared.counters.steps(),
            runtime_ms = shared.counters.runtime().map_or(0, |r| r.as_millis() as u64),
            best = shared.counters.best_value(),
        );
        self.core().set_status(SearchStatus::Idle);
        match step_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Requests cooperative termination. Idempotent, safe from any
    /// thread; the search stops before its next step begins.
    fn stop(&self) {
        self.core().request_stop();
    }

    /// Handle for stopping this search from another thread while it
    /// runs.
    fn stop_trigger(&self) -> StopTrigger<S> {
        StopTrigger {
            shared: self.core().shared.clone(),
        }
    }

    /// Disposes the search, releasing any owned resources. Terminal:
    /// a disposed search cannot be restarted. Rejected while a run is
    /// active.
    fn dispose(&mut self) -> Result<()> {
        {
            let mut status = self.core().status.lock().unwrap();
            match *status {
                SearchStatus::Disposed => return Ok(()),
                status if status.is_active() => {
                    return Err(StriderError::Status(format!(
                        "cannot dispose a search that is {status}"
                    )));
                }
                _ => *status = SearchStatus::Disposed,
            }
        }
        self.on_dispose();
        Ok(())
    }

    /// Registers a listener. Only allowed while the search is idle.
    fn add_listener(&self, listener: Box<dyn SearchListener<S>>) -> Result<()> {
        self.core().ensure_idle("adding a listener")?;
        self.core().shared.add_listener(listener);
        Ok(())
    }

    /// Registers a stop criterion. Only allowed while the search is
    /// idle.
    fn add_stop_criterion(&mut self, criterion: Box<dyn StopCriterion<S>>) -> Result<()> {
        self.core().ensure_idle("adding a stop criterion")?;
        if let Some(criteria) = self.core_mut().criteria.as_mut() {
            criteria.push(criterion);
        }
        Ok(())
    }

    /// Sets the period at which stop criteria are checked. Defaults to
    /// one second.
    fn set_checker_period(&mut self, period: Duration) -> Result<()> {
        self.core().ensure_idle("setting the checker period")?;
        self.core_mut().checker_period = period;
        Ok(())
    }

    /// Replaces the search's dedicated random generator. Only allowed
    /// while the search is idle.
    fn set_rng(&mut self, rng: StdRng) -> Result<()> {
        self.core().ensure_idle("replacing the random generator")?;
        self.core_mut().rng = rng;
        Ok(())
    }

    fn best_solution(&self) -> Option<S> {
        self.core().shared.best().map(|best| best.solution().clone())
    }

    fn best_evaluation(&self) -> Option<Arc<dyn Evaluation>> {
        self.core().shared.best().map(|best| best.evaluation().clone())
    }

    fn best_validation(&self) -> Option<Arc<dyn Validation>> {
        self.core().shared.best().map(|best| best.validation().clone())
    }

    /// Steps completed in the current (or last) run.
    fn steps(&self) -> u64 {
        self.core().shared.counters.steps()
    }

    fn runtime(&self) -> Option<Duration> {
        self.core().shared.counters.runtime()
    }

    fn min_step_time(&self) -> Option<Duration> {
        self.core().shared.counters.min_step_time()
    }

    fn max_step_time(&self) -> Option<Duration> {
        self.core().shared.counters.max_step_time()
    }

    fn steps_without_improvement(&self) -> Option<u64> {
        self.core().shared.counters.steps_without_improvement()
    }

    fn time_without_improvement(&self) -> Option<Duration> {
        self.core().shared.counters.time_without_improvement()
    }

    fn accepted_moves(&self) -> u64 {
        self.core().shared.counters.accepted()
    }

    fn rejected_moves(&self) -> u64 {
        self.core().shared.counters.rejected()
    }
}

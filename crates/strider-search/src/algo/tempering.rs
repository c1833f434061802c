//! Parallel tempering.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;

use rand::Rng;
use tracing::debug;

use strider_core::error::{Result, StriderError};
use strider_core::eval::improvement_delta;
use strider_core::neigh::Neighbourhood;
use strider_core::problem::Problem;
use strider_core::solution::Solution;

use crate::algo::parallel::BestMergeListener;
use crate::algo::MetropolisSearch;
use crate::factory::MetropolisSearchFactory;
use crate::listener::SearchListener;
use crate::local::{LocalSearch, LocalSearchCore};
use crate::neigh_search::NeighbourhoodSearchCore;
use crate::search::{Search, SearchCore, SearchHandle};

/// Stops a replica once it has performed its step budget for the
/// current global step.
struct ReplicaBudgetListener {
    budget: Arc<AtomicU64>,
}

impl<S: Solution> SearchListener<S> for ReplicaBudgetListener {
    fn step_completed(&self, search: &SearchHandle<'_, S>, steps: u64) {
        if steps >= self.budget.load(Ordering::SeqCst) {
            search.request_stop();
        }
    }
}

/// Parallel tempering: `N` Metropolis replicas at temperatures evenly
/// spaced over `[Tmin, Tmax]`, where good solutions are pushed towards
/// cool replicas for convergence and bad solutions towards hot
/// replicas in search of further improvement.
///
/// Each global step first lets every replica perform its own step
/// budget (500 by default) on a dedicated worker thread. Solutions of
/// adjacent replicas are then considered for swapping: with `Δ` the
/// improvement of the hotter replica's solution over the cooler one's,
/// a swap always happens when `Δ ≥ 0` and with probability
/// `exp((1/Tᵢ − 1/Tᵢ₊₁)·Δ)` otherwise. The pair base alternates
/// between 0 and 1 every global step so all adjacent pairs are
/// considered fairly. Swaps exchange the full evaluated triples, so
/// nothing is recomputed.
///
/// Replica bests are merged into this search's current and best
/// solution as they are found. By default every replica starts from
/// its own random solution; setting a current solution before starting
/// seeds every replica with a copy of it instead, cancelling the
/// built-in multi-start.
///
/// The problem and neighbourhood must be safe for concurrent read:
/// replicas use them from separate threads.
pub struct ParallelTempering<S: Solution> {
    ns: NeighbourhoodSearchCore<S>,
    replicas: Vec<MetropolisSearch<S>>,
    replica_steps: Arc<AtomicU64>,
    swap_base: usize,
}

impl<S: Solution> ParallelTempering<S> {
    /// Creates a parallel tempering search with plain Metropolis
    /// replicas.
    ///
    /// The replica count must be positive and the temperature range
    /// must satisfy `0 < Tmin < Tmax`.
    pub fn new(
        problem: Arc<dyn Problem<S>>,
        neighbourhood: Arc<dyn Neighbourhood<S>>,
        num_replicas: usize,
        min_temperature: f64,
        max_temperature: f64,
    ) -> Result<Self> {
        Self::with_metropolis_factory(
            problem,
            neighbourhood,
            num_replicas,
            min_temperature,
            max_temperature,
            &MetropolisSearch::new,
        )
    }

    /// Creates a parallel tempering search whose replicas are produced
    /// by a custom factory, e.g. to give each replica its own initial
    /// solution.
    pub fn with_metropolis_factory(
        problem: Arc<dyn Problem<S>>,
        neighbourhood: Arc<dyn Neighbourhood<S>>,
        num_replicas: usize,
        min_temperature: f64,
        max_temperature: f64,
        factory: &dyn MetropolisSearchFactory<S>,
    ) -> Result<Self> {
        if num_replicas == 0 {
            return Err(StriderError::Configuration(
                "parallel tempering requires at least one replica".to_string(),
            ));
        }
        if min_temperature <= 0.0 {
            return Err(StriderError::Configuration(format!(
                "minimum temperature must be strictly positive, got {min_temperature}"
            )));
        }
        if min_temperature >= max_temperature {
            return Err(StriderError::Configuration(format!(
                "minimum temperature {min_temperature} must be smaller than \
                 maximum temperature {max_temperature}"
            )));
        }
        let ns = NeighbourhoodSearchCore::single(
            "ParallelTempering",
            problem.clone(),
            neighbourhood.clone(),
        );
        let replica_steps = Arc::new(AtomicU64::new(500));
        let parent_shared = ns.local().core().shared().clone();
        let parent_current = ns.local().current_cell().clone();
        let mut replicas = Vec::with_capacity(num_replicas);
        for i in 0..num_replicas {
            let temperature = if num_replicas == 1 {
                min_temperature
            } else {
                min_temperature
                    + i as f64 * (max_temperature - min_temperature) / (num_replicas - 1) as f64
            };
            let replica = factory.create(problem.clone(), neighbourhood.clone(), temperature)?;
            replica.add_listener(Box::new(ReplicaBudgetListener {
                budget: replica_steps.clone(),
            }))?;
            replica.add_listener(Box::new(BestMergeListener {
                parent: parent_shared.clone(),
                parent_current: parent_current.clone(),
            }))?;
            replicas.push(replica);
        }
        Ok(Self {
            ns,
            replicas,
            replica_steps,
            swap_base: 0,
        })
    }

    /// Number of steps each replica performs per global step. Defaults
    /// to 500.
    pub fn replica_steps(&self) -> u64 {
        self.replica_steps.load(Ordering::SeqCst)
    }

    /// Sets the per-replica step budget. Tune this to the cost of the
    /// objective: expensive evaluations usually warrant a lower
    /// budget.
    pub fn set_replica_steps(&mut self, steps: u64) -> Result<()> {
        if steps == 0 {
            return Err(StriderError::Configuration(
                "the replica step budget must be strictly positive".to_string(),
            ));
        }
        self.replica_steps.store(steps, Ordering::SeqCst);
        Ok(())
    }

    /// Temperatures of the replicas, in increasing order.
    pub fn temperatures(&self) -> Vec<f64> {
        self.replicas.iter().map(|r| r.temperature()).collect()
    }

    /// Replaces the neighbourhood of this search and of every replica.
    /// Only allowed while the search is idle.
    pub fn set_neighbourhood(&mut self, neighbourhood: Arc<dyn Neighbourhood<S>>) -> Result<()> {
        self.ns.set_neighbourhood(neighbourhood.clone())?;
        for replica in &mut self.replicas {
            replica.set_neighbourhood(neighbourhood.clone())?;
        }
        Ok(())
    }
}

impl<S: Solution> Search<S> for ParallelTempering<S> {
    fn core(&self) -> &SearchCore<S> {
        self.ns.local().core()
    }

    fn core_mut(&mut self) -> &mut SearchCore<S> {
        self.ns.local_mut().core_mut()
    }

    fn init(&mut self) -> Result<()> {
        self.swap_base = 0;
        self.ns.local_mut().init_current()
    }

    fn search_step(&mut self) -> Result<()> {
        // Run every replica to its step budget, one worker thread per
        // replica, and wait for all of them.
        let results: Vec<Result<()>> = thread::scope(|scope| {
            let handles: Vec<_> = self
                .replicas
                .iter_mut()
                .map(|replica| scope.spawn(move || replica.start()))
                .collect();
            handles
                .into_iter()
                .map(|handle| {
                    handle.join().unwrap_or_else(|_| {
                        Err(StriderError::Search("replica thread panicked".to_string()))
                    })
                })
                .collect()
        });
        for result in results {
            result
                .map_err(|err| StriderError::Search(format!("replica execution failed: {err}")))?;
        }
        {
            let shared = self.ns.local().core().shared();
            for replica in &self.replicas {
                shared.counters.add_accepted(replica.accepted_moves());
                shared.counters.add_rejected(replica.rejected_moves());
            }
        }

        // Swap phase over adjacent pairs, starting from the
        // alternating base.
        let minimizing = self.ns.local().core().is_minimizing();
        let mut index = self.swap_base;
        while index + 1 < self.replicas.len() {
            let colder = &self.replicas[index];
            let hotter = &self.replicas[index + 1];
            let (value_colder, value_hotter) = match (
                colder.ns().local().current_value(),
                hotter.ns().local().current_value(),
            ) {
                (Some(colder), Some(hotter)) => (colder, hotter),
                _ => {
                    index += 2;
                    continue;
                }
            };
            let delta = improvement_delta(value_hotter, value_colder, minimizing);
            let swap = delta >= 0.0 || {
                let beta_difference = 1.0 / colder.temperature() - 1.0 / hotter.temperature();
                let probability = (beta_difference * delta).exp();
                let roll: f64 = self.ns.local_mut().core_mut().rng_mut().random();
                roll < probability
            };
            if swap {
                debug!(event = "replica_swap", index, delta);
                let cell_colder = self.replicas[index].ns().local().current_cell().clone();
                let cell_hotter = self.replicas[index + 1].ns().local().current_cell().clone();
                let mut guard_colder = cell_colder.lock().unwrap();
                let mut guard_hotter = cell_hotter.lock().unwrap();
                std::mem::swap(&mut *guard_colder, &mut *guard_hotter);
            }
            index += 2;
        }
        self.swap_base = 1 - self.swap_base;
        Ok(())
    }

    fn on_dispose(&mut self) {
        for replica in &mut self.replicas {
            let _ = replica.dispose();
        }
    }
}

impl<S: Solution> LocalSearch<S> for ParallelTempering<S> {
    fn local(&self) -> &LocalSearchCore<S> {
        self.ns.local()
    }

    fn local_mut(&mut self) -> &mut LocalSearchCore<S> {
        self.ns.local_mut()
    }

    /// Seeds this search and every replica with a copy of the given
    /// solution, cancelling the built-in multi-start. Only allowed
    /// while the search is idle.
    fn set_current_solution(&mut self, solution: S) -> Result<()> {
        self.ns
            .local()
            .core()
            .ensure_idle("setting the current solution")?;
        for replica in &mut self.replicas {
            replica.set_current_solution(solution.clone())?;
        }
        self.ns.local_mut().set_current_solution(solution)
    }
}

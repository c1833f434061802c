//! Step, move and improvement bookkeeping.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

const NO_STEP: u64 = u64::MAX;

#[derive(Default)]
struct Timing {
    started: Option<Instant>,
    stopped: Option<Instant>,
    last_improvement: Option<Instant>,
}

/// Counters maintained by every search. Step and move counts refer to
/// the current (or last) run; the best value persists across runs.
///
/// Accessors return `None` for quantities that are not meaningful yet,
/// e.g. the minimum step time before the first step has completed.
pub(crate) struct SearchCounters {
    steps: AtomicU64,
    accepted: AtomicU64,
    rejected: AtomicU64,
    min_step_nanos: AtomicU64,
    max_step_nanos: AtomicU64,
    last_improvement_step: AtomicU64,
    improvement_delta_bits: AtomicU64,
    best_value_bits: AtomicU64,
    timing: Mutex<Timing>,
}

impl SearchCounters {
    pub fn new() -> Self {
        Self {
            steps: AtomicU64::new(0),
            accepted: AtomicU64::new(0),
            rejected: AtomicU64::new(0),
            min_step_nanos: AtomicU64::new(u64::MAX),
            max_step_nanos: AtomicU64::new(0),
            last_improvement_step: AtomicU64::new(NO_STEP),
            improvement_delta_bits: AtomicU64::new(f64::NAN.to_bits()),
            best_value_bits: AtomicU64::new(f64::NAN.to_bits()),
            timing: Mutex::new(Timing::default()),
        }
    }

    /// Resets the per-run counters at the start of a run. The best
    /// value is kept.
    pub fn reset_for_run(&self) {
        self.steps.store(0, Ordering::SeqCst);
        self.accepted.store(0, Ordering::SeqCst);
        self.rejected.store(0, Ordering::SeqCst);
        self.min_step_nanos.store(u64::MAX, Ordering::SeqCst);
        self.max_step_nanos.store(0, Ordering::SeqCst);
        self.last_improvement_step.store(NO_STEP, Ordering::SeqCst);
        self.improvement_delta_bits
            .store(f64::NAN.to_bits(), Ordering::SeqCst);
        let mut timing = self.timing.lock().unwrap();
        timing.started = Some(Instant::now());
        timing.stopped = None;
        timing.last_improvement = None;
    }

    pub fn finish_run(&self) {
        self.timing.lock().unwrap().stopped = Some(Instant::now());
    }

    pub fn record_step(&self, duration: Duration) {
        self.steps.fetch_add(1, Ordering::SeqCst);
        let nanos = duration.as_nanos().min(u128::from(u64::MAX)) as u64;
        self.min_step_nanos.fetch_min(nanos, Ordering::SeqCst);
        self.max_step_nanos.fetch_max(nanos, Ordering::SeqCst);
    }

    pub fn record_improvement(&self, delta: f64, best_value: f64) {
        self.last_improvement_step
            .store(self.steps.load(Ordering::SeqCst), Ordering::SeqCst);
        self.improvement_delta_bits
            .store(delta.to_bits(), Ordering::SeqCst);
        self.best_value_bits
            .store(best_value.to_bits(), Ordering::SeqCst);
        self.timing.lock().unwrap().last_improvement = Some(Instant::now());
    }

    pub fn inc_accepted(&self) {
        self.accepted.fetch_add(1, Ordering::SeqCst);
    }

    pub fn inc_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::SeqCst);
    }

    pub fn add_accepted(&self, count: u64) {
        self.accepted.fetch_add(count, Ordering::SeqCst);
    }

    pub fn add_rejected(&self, count: u64) {
        self.rejected.fetch_add(count, Ordering::SeqCst);
    }

    pub fn steps(&self) -> u64 {
        self.steps.load(Ordering::SeqCst)
    }

    pub fn accepted(&self) -> u64 {
        self.accepted.load(Ordering::SeqCst)
    }

    pub fn rejected(&self) -> u64 {
        self.rejected.load(Ordering::SeqCst)
    }

    /// Runtime of the current run, or of the last run once stopped.
    pub fn runtime(&self) -> Option<Duration> {
        let timing = self.timing.lock().unwrap();
        let started = timing.started?;
        Some(match timing.stopped {
            Some(stopped) => stopped.duration_since(started),
            None => started.elapsed(),
        })
    }

    pub fn min_step_time(&self) -> Option<Duration> {
        if self.steps() == 0 {
            return None;
        }
        Some(Duration::from_nanos(
            self.min_step_nanos.load(Ordering::SeqCst),
        ))
    }

    pub fn max_step_time(&self) -> Option<Duration> {
        if self.steps() == 0 {
            return None;
        }
        Some(Duration::from_nanos(
            self.max_step_nanos.load(Ordering::SeqCst),
        ))
    }

    /// Steps since the last improvement during the current run, or all
    /// steps of the run if it has not improved yet. `None` before the
    /// first run.
    pub fn steps_without_improvement(&self) -> Option<u64> {
        if self.timing.lock().unwrap().started.is_none() {
            return None;
        }
        let steps = self.steps();
        match self.last_improvement_step.load(Ordering::SeqCst) {
            NO_STEP => Some(steps),
            step => Some(steps.saturating_sub(step)),
        }
    }

    /// Time since the last improvement, or the runtime if the current
    /// run has not improved yet.
    pub fn time_without_improvement(&self) -> Option<Duration> {
        let timing = self.timing.lock().unwrap();
        match timing.last_improvement {
            Some(at) => Some(at.elapsed()),
            None => {
                let started = timing.started?;
                Some(match timing.stopped {
                    Some(stopped) => stopped.duration_since(started),
                    None => started.elapsed(),
                })
            }
        }
    }

    /// Improvement magnitude of the last best-solution update in the
    /// current run.
    pub fn last_improvement_delta(&self) -> Option<f64> {
        let delta = f64::from_bits(self.improvement_delta_bits.load(Ordering::SeqCst));
        (!delta.is_nan()).then_some(delta)
    }

    /// Value of the best evaluation seen so far, across runs.
    pub fn best_value(&self) -> Option<f64> {
        let value = f64::from_bits(self.best_value_bits.load(Ordering::SeqCst));
        (!value.is_nan()).then_some(value)
    }
}

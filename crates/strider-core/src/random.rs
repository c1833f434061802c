//! Random solution generation and the process-wide generator source.

use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

use crate::solution::Solution;

/// Produces independent random solutions.
///
/// Each produced instance must be independent of previously produced
/// instances: no shared mutable state may leak between them.
///
/// Implemented for closures `Fn(&mut dyn RngCore, &D) -> S`.
pub trait RandomSolutionGenerator<S: Solution, D>: Send + Sync {
    fn create(&self, rng: &mut dyn RngCore, data: &D) -> S;
}

impl<S, D, F> RandomSolutionGenerator<S, D> for F
where
    S: Solution,
    F: Fn(&mut dyn RngCore, &D) -> S + Send + Sync,
{
    fn create(&self, rng: &mut dyn RngCore, data: &D) -> S {
        self(rng, data)
    }
}

// Master generator used to derive per-search generators when a seed
// has been configured; None means thread-local entropy.
static SOURCE: Mutex<Option<StdRng>> = Mutex::new(None);

/// Seeds the process-wide generator source. Every generator obtained
/// through [`new_generator`] afterwards is derived deterministically
/// from this seed, in call order.
///
/// Intended to be set once at startup, never while a search is
/// running. Each search captures its own generator at construction,
/// so replacing the source never affects running searches.
pub fn set_seed(seed: u64) {
    *SOURCE.lock().unwrap() = Some(StdRng::seed_from_u64(seed));
}

/// Resets the default behaviour: [`new_generator`] draws fresh
/// entropy from the thread-local generator again.
pub fn reset() {
    *SOURCE.lock().unwrap() = None;
}

/// Creates a new random generator from the process-wide source.
///
/// By default the generator is seeded from the thread-local generator
/// to avoid contention in parallel searches.
pub fn new_generator() -> StdRng {
    let mut source = SOURCE.lock().unwrap();
    match source.as_mut() {
        Some(master) => StdRng::seed_from_u64(master.next_u64()),
        None => StdRng::from_rng(&mut rand::rng()),
    }
}

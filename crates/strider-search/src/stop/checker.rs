//! Cooperative background checker polling the stop criteria.

use std::sync::{Arc, Condvar, Mutex};
use std::thread;
use std::time::Duration;

use tracing::debug;

use strider_core::solution::Solution;

use crate::search::{SearchHandle, SharedState};
use crate::stop::StopCriterion;

/// Handle to a running checker thread. Stopping it returns the
/// criteria to the owning search for the next run.
pub(crate) struct CheckerHandle<S: Solution> {
    shutdown: Arc<(Mutex<bool>, Condvar)>,
    join: thread::JoinHandle<Vec<Box<dyn StopCriterion<S>>>>,
}

impl<S: Solution> CheckerHandle<S> {
    pub fn stop(self) -> Vec<Box<dyn StopCriterion<S>>> {
        let (lock, condvar) = &*self.shutdown;
        *lock.lock().unwrap() = true;
        condvar.notify_all();
        self.join.join().unwrap_or_default()
    }
}

/// Spawns the checker thread. Every period it polls all criteria; if
/// one fires, it sets the search's stop flag. The search observes the
/// flag before its next step.
pub(crate) fn spawn_checker<S: Solution>(
    shared: Arc<SharedState<S>>,
    criteria: Vec<Box<dyn StopCriterion<S>>>,
    period: Duration,
) -> CheckerHandle<S> {
    let shutdown = Arc::new((Mutex::new(false), Condvar::new()));
    let thread_shutdown = shutdown.clone();
    let join = thread::spawn(move || {
        let (lock, condvar) = &*thread_shutdown;
        loop {
            {
                let guard = lock.lock().unwrap();
                let (guard, _) = condvar.wait_timeout(guard, period).unwrap();
                if *guard {
                    break;
                }
            }
            let handle = SearchHandle { shared: &shared };
            let fired = criteria.iter().any(|criterion| criterion.should_stop(&handle));
            shared.fire(|listener, handle| listener.stop_criterion_checked(handle));
            if fired {
                debug!(event = "stop_criterion_fired", search = %shared.name());
                shared.request_stop();
                break;
            }
        }
        criteria
    });
    CheckerHandle { shutdown, join }
}

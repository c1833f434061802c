//! Tabu memory strategies.

use std::collections::{HashSet, VecDeque};

use strider_core::neigh::Move;
use strider_core::solution::Solution;
use strider_core::subset::{as_subset_move, SubsetSolution};

/// Memory deciding which moves are tabu, updated on every accepted
/// move.
pub trait TabuMemory<S: Solution>: Send {
    /// Whether applying the given move to the current solution is
    /// forbidden.
    fn is_tabu(&self, mv: &dyn Move<S>, current: &S) -> bool;

    /// Observes an accepted move and the solution it produced.
    fn remember(&mut self, mv: &dyn Move<S>, new_solution: &S);

    /// Forgets everything, e.g. when a custom current solution is
    /// installed.
    fn clear(&mut self);
}

/// Bounded first-in-first-out memory of recently visited solutions. A
/// move is tabu if it leads back to a remembered solution.
pub struct FullSolutionTabuMemory<S: Solution> {
    visited: VecDeque<S>,
    capacity: usize,
}

impl<S: Solution> FullSolutionTabuMemory<S> {
    pub fn new(capacity: usize) -> Self {
        Self {
            visited: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    fn neighbour_of(&self, mv: &dyn Move<S>, current: &S) -> Option<S> {
        let mut neighbour = current.clone();
        mv.apply(&mut neighbour).ok()?;
        Some(neighbour)
    }
}

impl<S: Solution> TabuMemory<S> for FullSolutionTabuMemory<S> {
    fn is_tabu(&self, mv: &dyn Move<S>, current: &S) -> bool {
        match self.neighbour_of(mv, current) {
            Some(neighbour) => self.visited.contains(&neighbour),
            None => false,
        }
    }

    fn remember(&mut self, _mv: &dyn Move<S>, new_solution: &S) {
        if self.visited.len() >= self.capacity {
            self.visited.pop_front();
        }
        self.visited.push_back(new_solution.clone());
    }

    fn clear(&mut self) {
        self.visited.clear();
    }
}

/// Unbounded memory of every visited solution. A move is tabu if it
/// leads back to any previously visited solution.
pub struct VisitedSolutionTabuMemory<S: Solution> {
    visited: HashSet<S>,
}

impl<S: Solution> VisitedSolutionTabuMemory<S> {
    pub fn new() -> Self {
        Self {
            visited: HashSet::new(),
        }
    }
}

impl<S: Solution> Default for VisitedSolutionTabuMemory<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Solution> TabuMemory<S> for VisitedSolutionTabuMemory<S> {
    fn is_tabu(&self, mv: &dyn Move<S>, current: &S) -> bool {
        let mut neighbour = current.clone();
        if mv.apply(&mut neighbour).is_err() {
            return false;
        }
        self.visited.contains(&neighbour)
    }

    fn remember(&mut self, _mv: &dyn Move<S>, new_solution: &S) {
        self.visited.insert(new_solution.clone());
    }

    fn clear(&mut self) {
        self.visited.clear();
    }
}

/// Bounded first-in-first-out memory of recently touched subset ids.
/// A subset move is tabu if it adds or deletes any remembered id;
/// moves of other kinds are never tabu.
pub struct SubsetIdTabuMemory {
    ids: VecDeque<u32>,
    capacity: usize,
}

impl SubsetIdTabuMemory {
    pub fn new(capacity: usize) -> Self {
        Self {
            ids: VecDeque::with_capacity(capacity),
            capacity,
        }
    }
}

impl TabuMemory<SubsetSolution> for SubsetIdTabuMemory {
    fn is_tabu(&self, mv: &dyn Move<SubsetSolution>, _current: &SubsetSolution) -> bool {
        match as_subset_move(mv) {
            Ok(mv) => mv
                .added_ids()
                .iter()
                .chain(mv.deleted_ids())
                .any(|id| self.ids.contains(id)),
            Err(_) => false,
        }
    }

    fn remember(&mut self, mv: &dyn Move<SubsetSolution>, _new_solution: &SubsetSolution) {
        if let Ok(mv) = as_subset_move(mv) {
            for &id in mv.added_ids().iter().chain(mv.deleted_ids()) {
                while self.ids.len() >= self.capacity {
                    self.ids.pop_front();
                }
                self.ids.push_back(id);
            }
        }
    }

    fn clear(&mut self) {
        self.ids.clear();
    }
}

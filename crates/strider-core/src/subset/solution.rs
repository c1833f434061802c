//! Subset solution modelled in terms of selected item ids.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::error::{Result, StriderError};
use crate::solution::Solution;

/// Ordering imposed on the ids of a subset solution.
pub type IdComparator = Arc<dyn Fn(u32, u32) -> Ordering + Send + Sync>;

/// Id container supporting both an unordered mode and a mode sorted by
/// a caller-supplied comparator. The mode survives cloning and every
/// mutation.
#[derive(Clone)]
enum IdSet {
    Unordered(HashSet<u32>),
    Ordered { ids: Vec<u32>, cmp: IdComparator },
}

impl IdSet {
    fn empty(order: Option<&IdComparator>) -> Self {
        match order {
            None => IdSet::Unordered(HashSet::new()),
            Some(cmp) => IdSet::Ordered {
                ids: Vec::new(),
                cmp: cmp.clone(),
            },
        }
    }

    fn contains(&self, id: u32) -> bool {
        match self {
            IdSet::Unordered(set) => set.contains(&id),
            IdSet::Ordered { ids, cmp } => ids.binary_search_by(|&x| cmp(x, id)).is_ok(),
        }
    }

    fn insert(&mut self, id: u32) -> bool {
        match self {
            IdSet::Unordered(set) => set.insert(id),
            IdSet::Ordered { ids, cmp } => match ids.binary_search_by(|&x| cmp(x, id)) {
                Ok(_) => false,
                Err(pos) => {
                    ids.insert(pos, id);
                    true
                }
            },
        }
    }

    fn remove(&mut self, id: u32) -> bool {
        match self {
            IdSet::Unordered(set) => set.remove(&id),
            IdSet::Ordered { ids, cmp } => match ids.binary_search_by(|&x| cmp(x, id)) {
                Ok(pos) => {
                    ids.remove(pos);
                    true
                }
                Err(_) => false,
            },
        }
    }

    fn len(&self) -> usize {
        match self {
            IdSet::Unordered(set) => set.len(),
            IdSet::Ordered { ids, .. } => ids.len(),
        }
    }

    fn iter(&self) -> Box<dyn Iterator<Item = u32> + '_> {
        match self {
            IdSet::Unordered(set) => Box::new(set.iter().copied()),
            IdSet::Ordered { ids, .. } => Box::new(ids.iter().copied()),
        }
    }

    fn set_eq(&self, other: &IdSet) -> bool {
        self.len() == other.len() && self.iter().all(|id| other.contains(id))
    }

    // Order-independent content hash.
    fn content_hash(&self) -> u64 {
        self.iter()
            .map(|id| (id as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15))
            .fold(0u64, u64::wrapping_add)
    }
}

impl fmt::Debug for IdSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

/// Subset solution: a partition of a fixed id universe into selected
/// and unselected ids.
///
/// Invariants, maintained by every operation: the selected and
/// unselected sets are disjoint and their union is the universe. By
/// default ids are unordered; constructing with an [`IdComparator`]
/// keeps all three sets sorted by it, including after cloning and
/// across all move applications.
#[derive(Clone)]
pub struct SubsetSolution {
    all: IdSet,
    selected: IdSet,
    unselected: IdSet,
    order: Option<IdComparator>,
}

impl fmt::Debug for SubsetSolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubsetSolution")
            .field("selected", &self.selected)
            .field("unselected", &self.unselected)
            .finish()
    }
}

impl SubsetSolution {
    /// Creates a solution over the given non-empty universe with no
    /// ids selected, without imposing an order.
    pub fn new(all_ids: impl IntoIterator<Item = u32>) -> Result<Self> {
        Self::build(all_ids, std::iter::empty(), None)
    }

    /// Creates a solution over the given universe with the given
    /// initial selection, without imposing an order.
    pub fn with_selection(
        all_ids: impl IntoIterator<Item = u32>,
        selected_ids: impl IntoIterator<Item = u32>,
    ) -> Result<Self> {
        Self::build(all_ids, selected_ids, None)
    }

    /// Creates an empty-selection solution whose id sets are kept
    /// sorted by the given comparator.
    pub fn ordered(
        all_ids: impl IntoIterator<Item = u32>,
        comparator: IdComparator,
    ) -> Result<Self> {
        Self::build(all_ids, std::iter::empty(), Some(comparator))
    }

    /// Creates a solution with the given initial selection, keeping
    /// id sets sorted by the given comparator.
    pub fn ordered_with_selection(
        all_ids: impl IntoIterator<Item = u32>,
        selected_ids: impl IntoIterator<Item = u32>,
        comparator: IdComparator,
    ) -> Result<Self> {
        Self::build(all_ids, selected_ids, Some(comparator))
    }

    /// Comparator imposing the natural ascending id order.
    pub fn natural_order() -> IdComparator {
        Arc::new(|a, b| a.cmp(&b))
    }

    fn build(
        all_ids: impl IntoIterator<Item = u32>,
        selected_ids: impl IntoIterator<Item = u32>,
        order: Option<IdComparator>,
    ) -> Result<Self> {
        let all: Vec<u32> = all_ids.into_iter().collect();
        if all.is_empty() {
            return Err(StriderError::Configuration(
                "subset solution requires a non-empty set of ids".to_string(),
            ));
        }
        let universe: HashSet<u32> = all.iter().copied().collect();
        let selected: Vec<u32> = selected_ids.into_iter().collect();
        if let Some(id) = selected.iter().find(|id| !universe.contains(id)) {
            return Err(StriderError::Configuration(format!(
                "selected id {id} is not part of the id universe"
            )));
        }
        Ok(Self::assemble(all, selected, order))
    }

    // Skips input validation; inputs must come from an already
    // validated universe (used by the built-in subset generator).
    pub(crate) fn assemble(
        all_ids: impl IntoIterator<Item = u32>,
        selected_ids: impl IntoIterator<Item = u32>,
        order: Option<IdComparator>,
    ) -> Self {
        let mut all = IdSet::empty(order.as_ref());
        let mut unselected = IdSet::empty(order.as_ref());
        for id in all_ids {
            if all.insert(id) {
                unselected.insert(id);
            }
        }
        let mut selected = IdSet::empty(order.as_ref());
        for id in selected_ids {
            if selected.insert(id) {
                unselected.remove(id);
            }
        }
        Self {
            all,
            selected,
            unselected,
            order,
        }
    }

    /// Selects the given id. Returns `Ok(false)` if it was already
    /// selected, and an error if the universe does not contain it, in
    /// which case the solution is unchanged.
    pub fn select(&mut self, id: u32) -> Result<bool> {
        if !self.all.contains(id) {
            return Err(StriderError::SolutionModification(format!(
                "cannot select id {id}: no such id"
            )));
        }
        if !self.selected.insert(id) {
            return Ok(false);
        }
        self.unselected.remove(id);
        Ok(true)
    }

    /// Deselects the given id. Returns `Ok(false)` if it was not
    /// selected, and an error if the universe does not contain it, in
    /// which case the solution is unchanged.
    pub fn deselect(&mut self, id: u32) -> Result<bool> {
        if !self.all.contains(id) {
            return Err(StriderError::SolutionModification(format!(
                "cannot deselect id {id}: no such id"
            )));
        }
        if !self.selected.remove(id) {
            return Ok(false);
        }
        self.unselected.insert(id);
        Ok(true)
    }

    /// Selects every id in the given collection. Returns whether the
    /// solution was modified.
    pub fn select_many(&mut self, ids: impl IntoIterator<Item = u32>) -> Result<bool> {
        let mut modified = false;
        for id in ids {
            modified |= self.select(id)?;
        }
        Ok(modified)
    }

    /// Deselects every id in the given collection. Returns whether the
    /// solution was modified.
    pub fn deselect_many(&mut self, ids: impl IntoIterator<Item = u32>) -> Result<bool> {
        let mut modified = false;
        for id in ids {
            modified |= self.deselect(id)?;
        }
        Ok(modified)
    }

    /// Selects all ids in the universe.
    pub fn select_all(&mut self) {
        let ids: Vec<u32> = self.unselected_ids().collect();
        for id in ids {
            self.selected.insert(id);
            self.unselected.remove(id);
        }
    }

    /// Deselects all ids.
    pub fn deselect_all(&mut self) {
        let ids: Vec<u32> = self.selected_ids().collect();
        for id in ids {
            self.selected.remove(id);
            self.unselected.insert(id);
        }
    }

    pub fn selected_ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.selected.iter()
    }

    pub fn unselected_ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.unselected.iter()
    }

    pub fn all_ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.all.iter()
    }

    pub fn is_selected(&self, id: u32) -> bool {
        self.selected.contains(id)
    }

    pub fn contains_id(&self, id: u32) -> bool {
        self.all.contains(id)
    }

    pub fn num_selected(&self) -> usize {
        self.selected.len()
    }

    pub fn num_unselected(&self) -> usize {
        self.unselected.len()
    }

    pub fn total_ids(&self) -> usize {
        self.all.len()
    }

    /// The comparator imposed on the ids, if any.
    pub fn order(&self) -> Option<&IdComparator> {
        self.order.as_ref()
    }
}

/// Equality is by content: exactly the same selected and unselected
/// ids, regardless of ordering mode.
impl PartialEq for SubsetSolution {
    fn eq(&self, other: &Self) -> bool {
        self.selected.set_eq(&other.selected) && self.unselected.set_eq(&other.unselected)
    }
}

impl Eq for SubsetSolution {}

impl Hash for SubsetSolution {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.selected.content_hash());
        state.write_u64(self.unselected.content_hash());
    }
}

impl fmt::Display for SubsetSolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ids: Vec<u32> = self.selected_ids().collect();
        if self.order.is_none() {
            ids.sort_unstable();
        }
        write!(f, "subset {{")?;
        for (i, id) in ids.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{id}")?;
        }
        write!(f, "}}")
    }
}

impl Solution for SubsetSolution {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;

    fn hash_of(solution: &SubsetSolution) -> u64 {
        let mut hasher = DefaultHasher::new();
        solution.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn empty_universe_is_rejected() {
        assert!(matches!(
            SubsetSolution::new([]),
            Err(StriderError::Configuration(_))
        ));
    }

    #[test]
    fn foreign_selection_is_rejected() {
        assert!(SubsetSolution::with_selection(0..5, [7]).is_err());
    }

    #[test]
    fn partition_invariant_holds_after_operations() {
        let mut solution = SubsetSolution::new(0..10).unwrap();
        solution.select(3).unwrap();
        solution.select(7).unwrap();
        solution.deselect(3).unwrap();
        assert_eq!(solution.num_selected() + solution.num_unselected(), 10);
        assert!(solution.is_selected(7));
        assert!(!solution.is_selected(3));
        assert!(solution.selected_ids().all(|id| solution.contains_id(id)));
        let selected: HashSet<u32> = solution.selected_ids().collect();
        assert!(solution.unselected_ids().all(|id| !selected.contains(&id)));
    }

    #[test]
    fn select_reports_modification() {
        let mut solution = SubsetSolution::new(0..3).unwrap();
        assert!(solution.select(1).unwrap());
        assert!(!solution.select(1).unwrap());
        assert!(solution.deselect(1).unwrap());
        assert!(!solution.deselect(1).unwrap());
    }

    #[test]
    fn unknown_id_leaves_solution_unchanged() {
        let mut solution = SubsetSolution::with_selection(0..3, [0]).unwrap();
        let before = solution.clone();
        assert!(solution.select(9).is_err());
        assert!(solution.deselect(9).is_err());
        assert_eq!(solution, before);
    }

    #[test]
    fn clone_is_a_deep_copy() {
        let original = SubsetSolution::with_selection(0..5, [1, 2]).unwrap();
        let mut copy = original.clone();
        assert_eq!(copy, original);
        assert_eq!(hash_of(&copy), hash_of(&original));
        copy.select(4).unwrap();
        assert_ne!(copy, original);
        assert!(!original.is_selected(4));
    }

    #[test]
    fn equality_ignores_ordering_mode() {
        let unordered = SubsetSolution::with_selection(0..5, [1, 3]).unwrap();
        let ordered = SubsetSolution::ordered_with_selection(
            0..5,
            [3, 1],
            SubsetSolution::natural_order(),
        )
        .unwrap();
        assert_eq!(unordered, ordered);
        assert_eq!(hash_of(&unordered), hash_of(&ordered));
    }

    #[test]
    fn ordered_mode_keeps_ids_sorted_and_survives_clone() {
        let mut solution =
            SubsetSolution::ordered(0..8, Arc::new(|a: u32, b: u32| b.cmp(&a))).unwrap();
        solution.select_many([2, 7, 5]).unwrap();
        let selected: Vec<u32> = solution.selected_ids().collect();
        assert_eq!(selected, vec![7, 5, 2]);

        let mut copy = solution.clone();
        copy.select(6).unwrap();
        let selected: Vec<u32> = copy.selected_ids().collect();
        assert_eq!(selected, vec![7, 6, 5, 2]);
    }

    #[test]
    fn select_and_deselect_all() {
        let mut solution = SubsetSolution::new(0..6).unwrap();
        solution.select_all();
        assert_eq!(solution.num_selected(), 6);
        assert_eq!(solution.num_unselected(), 0);
        solution.deselect_all();
        assert_eq!(solution.num_selected(), 0);
        assert_eq!(solution.num_unselected(), 6);
    }

    #[test]
    fn display_lists_the_selection() {
        let solution = SubsetSolution::with_selection(0..10, [9, 7, 8]).unwrap();
        assert_eq!(solution.to_string(), "subset {7, 8, 9}");
    }
}

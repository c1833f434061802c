//! Moves over subset solutions.

use std::any::Any;
use std::slice;

use smallvec::SmallVec;

use crate::error::{Result, StriderError};
use crate::neigh::Move;
use crate::subset::solution::SubsetSolution;

type IdList = SmallVec<[u32; 4]>;

/// The closed set of moves the framework knows how to delta-evaluate
/// on subset solutions.
///
/// Each variant records exactly the ids it transfers between the
/// selected and unselected sets and acts as its own undo record. Any
/// other [`Move`] implementation fed to a subset delta evaluator is
/// opaque and rejected with an incompatible-delta error.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SubsetMove {
    /// Selects one currently unselected id.
    Addition { add: u32 },
    /// Deselects one currently selected id.
    Deletion { delete: u32 },
    /// Selects one id and deselects another in a single step.
    Swap { add: u32, delete: u32 },
    /// Selects and deselects whole id sets in a single step; the
    /// aggregate of several independent single moves.
    General { add: IdList, delete: IdList },
}

impl SubsetMove {
    pub fn addition(add: u32) -> Self {
        SubsetMove::Addition { add }
    }

    pub fn deletion(delete: u32) -> Self {
        SubsetMove::Deletion { delete }
    }

    pub fn swap(add: u32, delete: u32) -> Self {
        SubsetMove::Swap { add, delete }
    }

    pub fn general(
        add: impl IntoIterator<Item = u32>,
        delete: impl IntoIterator<Item = u32>,
    ) -> Self {
        SubsetMove::General {
            add: add.into_iter().collect(),
            delete: delete.into_iter().collect(),
        }
    }

    /// Ids this move selects.
    pub fn added_ids(&self) -> &[u32] {
        match self {
            SubsetMove::Addition { add } => slice::from_ref(add),
            SubsetMove::Deletion { .. } => &[],
            SubsetMove::Swap { add, .. } => slice::from_ref(add),
            SubsetMove::General { add, .. } => add,
        }
    }

    /// Ids this move deselects.
    pub fn deleted_ids(&self) -> &[u32] {
        match self {
            SubsetMove::Addition { .. } => &[],
            SubsetMove::Deletion { delete } => slice::from_ref(delete),
            SubsetMove::Swap { delete, .. } => slice::from_ref(delete),
            SubsetMove::General { delete, .. } => delete,
        }
    }

    /// Net change in subset size caused by this move.
    pub fn net_change(&self) -> i64 {
        self.added_ids().len() as i64 - self.deleted_ids().len() as i64
    }

    fn select(solution: &mut SubsetSolution, id: u32) -> Result<()> {
        if !solution.select(id)? {
            return Err(StriderError::SolutionModification(format!(
                "cannot select id {id}: already selected"
            )));
        }
        Ok(())
    }

    fn deselect(solution: &mut SubsetSolution, id: u32) -> Result<()> {
        if !solution.deselect(id)? {
            return Err(StriderError::SolutionModification(format!(
                "cannot deselect id {id}: not selected"
            )));
        }
        Ok(())
    }
}

impl Move<SubsetSolution> for SubsetMove {
    fn apply(&self, solution: &mut SubsetSolution) -> Result<()> {
        for &id in self.added_ids() {
            Self::select(solution, id)?;
        }
        for &id in self.deleted_ids() {
            Self::deselect(solution, id)?;
        }
        Ok(())
    }

    fn undo(&self, solution: &mut SubsetSolution) -> Result<()> {
        for &id in self.added_ids() {
            Self::deselect(solution, id)?;
        }
        for &id in self.deleted_ids() {
            Self::select(solution, id)?;
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Downcasts a move to the known subset kinds, or reports an
/// incompatible delta.
pub fn as_subset_move<'a>(mv: &'a dyn Move<SubsetSolution>) -> Result<&'a SubsetMove> {
    mv.as_any().downcast_ref::<SubsetMove>().ok_or_else(|| {
        StriderError::IncompatibleDelta(
            "subset delta evaluation requires a subset move".to_string(),
        )
    })
}

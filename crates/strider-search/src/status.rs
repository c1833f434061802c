//! Search lifecycle states.

use std::fmt;

/// Status of a search.
///
/// Permitted transitions: `Idle → Initializing → Running → Terminating
/// → Idle`, plus `→ Disposed` from any non-running state. `Disposed`
/// is terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SearchStatus {
    Idle,
    Initializing,
    Running,
    Terminating,
    Disposed,
}

impl SearchStatus {
    /// Whether a run is in progress (between start and the return to
    /// idle).
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            SearchStatus::Initializing | SearchStatus::Running | SearchStatus::Terminating
        )
    }
}

impl fmt::Display for SearchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SearchStatus::Idle => "idle",
            SearchStatus::Initializing => "initializing",
            SearchStatus::Running => "running",
            SearchStatus::Terminating => "terminating",
            SearchStatus::Disposed => "disposed",
        };
        write!(f, "{name}")
    }
}

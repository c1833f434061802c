//! Error types for strider.

use thiserror::Error;

/// Main error type for strider operations.
#[derive(Debug, Error)]
pub enum StriderError {
    /// Invalid construction arguments (out-of-range sizes, bad
    /// temperature ranges, zero replica counts, ...). The offending
    /// object is never created.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// An operation on a solution referred to an identity that does
    /// not exist in its universe. The solution is left unchanged.
    #[error("solution modification error: {0}")]
    SolutionModification(String),

    /// A delta evaluation or validation did not recognise the concrete
    /// move type it was given. Fatal to the current search step.
    #[error("incompatible delta: {0}")]
    IncompatibleDelta(String),

    /// Internal invariant violation during a search run, including
    /// worker thread failures in parallel searches.
    #[error("search error: {0}")]
    Search(String),

    /// An API call required a specific search status (usually idle)
    /// and was rejected without side effects.
    #[error("invalid search status: {0}")]
    Status(String),
}

/// Result type alias for strider operations.
pub type Result<T> = std::result::Result<T, StriderError>;

//! Solution carrier contract.

use std::fmt;
use std::hash::Hash;

/// A candidate answer to an optimization problem.
///
/// `Clone` must produce a deep copy: the clone compares equal to the
/// original, and mutating either never affects the other. Equality and
/// hashing are by content. Solutions are mutated in place only through
/// move application and undo, or through solution-specific mutators
/// such as subset selection.
pub trait Solution: Clone + Eq + Hash + fmt::Debug + fmt::Display + Send + 'static {}

//! Structural invariant violations reported by `validate`.

use thiserror::Error;

/// A broken tree invariant.
///
/// None of these can be produced through the public API of a map whose key
/// type has a lawful total order. They exist so that consistency checks can
/// say what went wrong instead of just panicking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Violation {
    #[error("root node has a parent link")]
    RootHasParent,

    #[error("child node does not link back to its parent")]
    BrokenParentLink,

    #[error("in-order keys are not strictly ascending")]
    OrderViolation,

    #[error("stored height {stored} differs from computed height {computed}")]
    HeightMismatch { stored: usize, computed: usize },

    #[error("node balance factor {balance} is outside of [-1, 1]")]
    Unbalanced { balance: isize },

    #[error("root node is red")]
    RedRoot,

    #[error("red node has a red child")]
    RedRedEdge,

    #[error("black height {left} of left subtree differs from {right} of right subtree")]
    BlackHeightMismatch { left: usize, right: usize },
}

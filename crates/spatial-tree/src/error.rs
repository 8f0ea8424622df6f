//! Error types for tree manipulation and construction.

use thiserror::Error;

use crate::tree::NodeId;

/// Errors raised when a [`NodeId`] does not address a live node of the tree
/// it was passed to, or cannot take part in the requested edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TreeError {
    /// The id was issued by a different tree.
    #[error("node {0} is not part of this tree")]
    ForeignNode(NodeId),

    /// The node was removed (its parent's children were dropped).
    #[error("node {0} has been removed from the tree")]
    StaleNode(NodeId),

    /// The root cannot be moved, and no node can move into its own subtree.
    #[error("node {0} cannot be moved below the requested parent")]
    InvalidMove(NodeId),
}

/// Errors raised by the tree builders for invalid construction parameters.
///
/// Empty input is not an error: builders return `Ok(None)` instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    /// Grid trees allocate `(2^forks)^dim` cells; the fork count is capped.
    #[error("fork count {forks} is out of range (maximum is {max})")]
    ForkCountOutOfRange {
        /// Requested fork count.
        forks: u8,
        /// Largest supported fork count.
        max: u8,
    },

    /// Requested recursion depth exceeds the supported maximum.
    #[error("tree depth {depth} is out of range (maximum is {max})")]
    DepthOutOfRange {
        /// Requested depth.
        depth: u8,
        /// Largest supported depth.
        max: u8,
    },

    #[error(transparent)]
    Tree(#[from] TreeError),
}

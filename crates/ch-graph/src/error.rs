//! Graph construction errors.
//!
//! These are only produced while a `GraphRep` is being built or validated.
//! Once a graph exists, out-of-range ids are programmer errors and panic.

use thiserror::Error;

use ch_core::{EdgeId, NodeId};

/// Errors produced by `ch-graph`.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("node {node} out of range (node count {count})")]
    NodeOutOfRange { node: NodeId, count: usize },

    #[error("edge {edge} out of range (edge count {count})")]
    EdgeOutOfRange { edge: EdgeId, count: usize },

    #[error("{what} has length {got}, expected {expected}")]
    LengthMismatch {
        what:     &'static str,
        expected: usize,
        got:      usize,
    },

    #[error("{what} offsets are not a valid CSR row pointer: {reason}")]
    BadOffsets { what: &'static str, reason: String },

    #[error("{what} edge {edge} is stored in the range of the wrong node")]
    Ungrouped { what: &'static str, edge: EdgeId },

    #[error("edge {0} is missing from or duplicated in the incoming-edge index")]
    InEdgeMismatch(EdgeId),

    #[error("shortcut {edge} is inconsistent: {reason}")]
    BrokenShortcut { edge: EdgeId, reason: &'static str },
}

pub type GraphResult<T> = Result<T, GraphError>;

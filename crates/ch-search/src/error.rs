//! Search error type.

use thiserror::Error;

use ch_core::NodeId;

/// Errors produced by `ch-search`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SearchError {
    /// The forward search ran out of nodes before settling the destination.
    #[error("no path for leg {leg} from node {from} to node {to}")]
    NoPathFound { leg: usize, from: NodeId, to: NodeId },
}

pub type SearchResult<T> = Result<T, SearchError>;

//! Dispatcher error types.

use thiserror::Error;

use ch_core::{CoreError, NodeId};
use ch_search::SearchError;

/// Why a single route request produced no result.
///
/// Delivered through the request's [`ResultHandle`](crate::ResultHandle).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RouteError {
    /// `leg` counts from the submitted waypoint the failing leg starts at.
    #[error(transparent)]
    NoPath(#[from] SearchError),

    #[error("request queue is full ({capacity} waiting)")]
    CapacityExceeded { capacity: usize },

    /// The request was discarded before a worker finished it: the
    /// dispatcher shut down, or the worker running it died.
    #[error("request cancelled before completion")]
    Cancelled,

    /// Only produced by [`ResultHandle::await_result_timeout`](crate::ResultHandle::await_result_timeout);
    /// the request itself keeps running.
    #[error("timed out waiting for the result")]
    TimedOut,

    #[error("unknown algorithm {0:?}")]
    UnknownAlgorithm(String),

    #[error("waypoint {index} refers to node {node}, graph has {count} nodes")]
    InvalidNode { index: usize, node: NodeId, count: usize },
}

/// Errors starting a [`RequestDispatcher`](crate::RequestDispatcher).
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Config(#[from] CoreError),

    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[from] std::io::Error),
}

pub type DispatchResult<T> = Result<T, DispatchError>;

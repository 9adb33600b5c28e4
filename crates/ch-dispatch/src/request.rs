//! Route requests and their one-shot result channels.

use std::time::Duration;

use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};

use ch_search::{DistanceMatrix, RequestPoints, Way};

use crate::RouteError;

/// What a worker sends back for one request.
pub type RouteOutcome = Result<RouteResultBundle, RouteError>;

// ── RouteRequest ──────────────────────────────────────────────────────────────

/// One routing job: which algorithm to run over which waypoints.
///
/// Created together with its [`ResultHandle`] by [`RouteRequest::new`].
/// The request travels through the queue to a worker; the handle stays with
/// the caller.
#[derive(Debug)]
pub struct RouteRequest {
    /// Name the algorithm is registered under in the dispatcher's
    /// [`AlgorithmSet`](crate::AlgorithmSet).
    pub algorithm: String,
    pub points:    RequestPoints,
    /// Route back from the last waypoint to the first.
    pub tour:      bool,
    reply:         Sender<RouteOutcome>,
}

impl RouteRequest {
    pub fn new(algorithm: impl Into<String>, points: RequestPoints) -> (Self, ResultHandle) {
        let (reply, result) = channel::bounded(1);
        let request = Self { algorithm: algorithm.into(), points, tour: false, reply };
        (request, ResultHandle { result })
    }

    pub fn with_tour(mut self, tour: bool) -> Self {
        self.tour = tour;
        self
    }

    /// Deliver the outcome.  A caller that dropped its handle simply never
    /// sees it.
    pub(crate) fn complete(self, outcome: RouteOutcome) {
        let _ = self.reply.send(outcome);
    }
}

// ── RouteResultBundle ─────────────────────────────────────────────────────────

/// Everything an algorithm returns for one request.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RouteResultBundle {
    /// One way per leg, in route order.
    pub ways:           Vec<Way>,
    pub total_distance: u64,
    pub total_time:     f64,
    /// The request's waypoints after the run: possibly reordered, with
    /// per-leg constraints filled in.
    pub points:         RequestPoints,
    /// Pairwise distances, for algorithms that compute them.  Indexed by
    /// the waypoint order as *submitted*.
    pub matrix:         Option<DistanceMatrix>,
}

impl RouteResultBundle {
    pub fn new(ways: Vec<Way>, total_distance: u64, points: RequestPoints) -> Self {
        let total_time = ways.iter().map(|w| w.travel_time).sum();
        Self { ways, total_distance, total_time, points, matrix: None }
    }
}

// ── ResultHandle ──────────────────────────────────────────────────────────────

/// Caller's end of a request's completion channel.
#[derive(Debug)]
pub struct ResultHandle {
    result: Receiver<RouteOutcome>,
}

impl ResultHandle {
    /// Block until the request completes.
    ///
    /// Returns [`RouteError::Cancelled`] if the request is dropped without
    /// completing.
    pub fn await_result(self) -> RouteOutcome {
        self.result.recv().unwrap_or(Err(RouteError::Cancelled))
    }

    /// Like [`await_result`](Self::await_result) but gives up after
    /// `timeout` with [`RouteError::TimedOut`].  The request is not
    /// cancelled; the handle can be awaited again.
    pub fn await_result_timeout(&self, timeout: Duration) -> RouteOutcome {
        match self.result.recv_timeout(timeout) {
            Ok(outcome) => outcome,
            Err(RecvTimeoutError::Timeout) => Err(RouteError::TimedOut),
            Err(RecvTimeoutError::Disconnected) => Err(RouteError::Cancelled),
        }
    }

    /// Non-blocking poll: `None` while the request is still pending.
    pub fn try_result(&self) -> Option<RouteOutcome> {
        match self.result.try_recv() {
            Ok(outcome) => Some(outcome),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(RouteError::Cancelled)),
        }
    }
}

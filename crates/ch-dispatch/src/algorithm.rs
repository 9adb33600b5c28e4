//! Route algorithms the dispatcher can run.
//!
//! An [`Algorithm`] is stateless and shared by every worker; all per-query
//! state lives in the worker's [`ShortestPathEngine`].

use std::fmt;
use std::mem;

use rustc_hash::FxHashMap;

use ch_search::{SearchError, ShortestPathEngine};

use crate::{RouteOutcome, RouteRequest, RouteResultBundle};

/// Registry name of [`ShortestPath`].
pub const SHORTEST_PATH: &str = "sp";

/// Registry name of [`TravelingSalesman`].
pub const TRAVELING_SALESMAN: &str = "tsp";

/// A routing algorithm.
///
/// `compute` runs on a worker thread with that worker's engine.  It may
/// take the request's points (the bundle carries them back).
pub trait Algorithm: Send + Sync {
    fn compute(&self, engine: &mut ShortestPathEngine, request: &mut RouteRequest) -> RouteOutcome;
}

// ── Built-ins ─────────────────────────────────────────────────────────────────

/// Visit the waypoints in the given order, closing the loop if the request
/// asks for a tour.
#[derive(Clone, Copy, Debug, Default)]
pub struct ShortestPath;

impl Algorithm for ShortestPath {
    fn compute(&self, engine: &mut ShortestPathEngine, request: &mut RouteRequest) -> RouteOutcome {
        let mut ways = Vec::new();
        let total = engine.shortest_path(&mut request.points, &mut ways, request.tour)?;
        Ok(RouteResultBundle::new(ways, total, mem::take(&mut request.points)))
    }
}

/// Closed tour through every waypoint, visiting them in nearest-neighbour
/// order starting from the first one.  The bundle carries the distance
/// matrix the order was chosen from.
///
/// A failing leg is reported by the submitted index of the waypoint it
/// starts from, not by its position in the tour.
#[derive(Clone, Copy, Debug, Default)]
pub struct TravelingSalesman;

impl Algorithm for TravelingSalesman {
    fn compute(&self, engine: &mut ShortestPathEngine, request: &mut RouteRequest) -> RouteOutcome {
        let matrix = engine.distance_matrix(&request.points.nodes());
        let order = matrix.nearest_neighbor_order();
        request.points.reorder(&order);

        let mut ways = Vec::new();
        let total = engine
            .shortest_path(&mut request.points, &mut ways, true)
            .map_err(|SearchError::NoPathFound { leg, from, to }| SearchError::NoPathFound {
                leg: order[leg],
                from,
                to,
            })?;
        let mut bundle = RouteResultBundle::new(ways, total, mem::take(&mut request.points));
        bundle.matrix = Some(matrix);
        Ok(bundle)
    }
}

// ── AlgorithmSet ──────────────────────────────────────────────────────────────

/// Algorithms by name.
#[derive(Default)]
pub struct AlgorithmSet {
    algorithms: FxHashMap<String, Box<dyn Algorithm>>,
}

impl AlgorithmSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// `"sp"` → [`ShortestPath`], `"tsp"` → [`TravelingSalesman`].
    pub fn standard() -> Self {
        let mut set = Self::new();
        set.register(SHORTEST_PATH, ShortestPath);
        set.register(TRAVELING_SALESMAN, TravelingSalesman);
        set
    }

    /// Add or replace an algorithm.
    pub fn register(&mut self, name: impl Into<String>, algorithm: impl Algorithm + 'static) -> &mut Self {
        self.algorithms.insert(name.into(), Box::new(algorithm));
        self
    }

    pub fn get(&self, name: &str) -> Option<&dyn Algorithm> {
        self.algorithms.get(name).map(|a| a.as_ref())
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.algorithms.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.algorithms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.algorithms.is_empty()
    }
}

impl fmt::Debug for AlgorithmSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.names()).finish()
    }
}

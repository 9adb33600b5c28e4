//! Waypoints of a route request.
//!
//! Each waypoint is already resolved to a graph node by the caller's
//! nearest-neighbour lookup.  The engine records per-leg results in the
//! constraint map of the waypoint a leg *arrives* at.

use std::fmt;

use rustc_hash::FxHashMap;

use ch_core::{GeoPoint, NodeId};

/// Constraint key: length of the leg ending at this waypoint, in metres.
pub const DIST_TO_PREV: &str = "dist_to_prev";

/// Constraint key: travel time of the leg ending at this waypoint.
pub const TIME_TO_PREV: &str = "time_to_prev";

/// Value stored in a waypoint's constraint map.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ConstraintValue {
    Int(i64),
    Float(f64),
}

impl ConstraintValue {
    pub fn as_f64(self) -> f64 {
        match self {
            ConstraintValue::Int(v) => v as f64,
            ConstraintValue::Float(v) => v,
        }
    }
}

impl fmt::Display for ConstraintValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstraintValue::Int(v) => write!(f, "{v}"),
            ConstraintValue::Float(v) => write!(f, "{v}"),
        }
    }
}

/// One waypoint: resolved node, requested position, constraints.
#[derive(Clone, Debug, PartialEq)]
pub struct RequestPoint {
    pub node:        NodeId,
    /// Position the client asked for (not necessarily the node's position).
    pub pos:         GeoPoint,
    pub constraints: FxHashMap<String, ConstraintValue>,
}

impl RequestPoint {
    pub fn new(node: NodeId, pos: GeoPoint) -> Self {
        Self { node, pos, constraints: FxHashMap::default() }
    }

    pub fn constraint(&self, key: &str) -> Option<ConstraintValue> {
        self.constraints.get(key).copied()
    }
}

/// Ordered waypoints of one request.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RequestPoints {
    points: Vec<RequestPoint>,
}

impl RequestPoints {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waypoints at the given nodes, positioned at the nodes' coordinates.
    pub fn from_nodes(graph: &ch_graph::GraphRep, nodes: &[NodeId]) -> Self {
        Self {
            points: nodes
                .iter()
                .map(|&node| RequestPoint::new(node, graph.coordinates(node)))
                .collect(),
        }
    }

    pub fn push(&mut self, point: RequestPoint) {
        self.points.push(point);
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[inline]
    pub fn node(&self, i: usize) -> NodeId {
        self.points[i].node
    }

    pub fn nodes(&self) -> Vec<NodeId> {
        self.points.iter().map(|p| p.node).collect()
    }

    pub fn get(&self, i: usize) -> &RequestPoint {
        &self.points[i]
    }

    pub fn constraints_mut(&mut self, i: usize) -> &mut FxHashMap<String, ConstraintValue> {
        &mut self.points[i].constraints
    }

    pub fn iter(&self) -> impl Iterator<Item = &RequestPoint> {
        self.points.iter()
    }

    /// Rearrange waypoints so that position `k` holds the old `order[k]`.
    ///
    /// # Panics
    /// Panics unless `order` is a permutation of `0..len()`.
    pub fn reorder(&mut self, order: &[usize]) {
        assert_eq!(order.len(), self.points.len(), "order must cover every waypoint");
        let mut slots: Vec<Option<RequestPoint>> = self.points.drain(..).map(Some).collect();
        self.points = order
            .iter()
            .map(|&i| slots[i].take().expect("order repeats a waypoint"))
            .collect();
    }
}

impl From<Vec<RequestPoint>> for RequestPoints {
    fn from(points: Vec<RequestPoint>) -> Self {
        Self { points }
    }
}

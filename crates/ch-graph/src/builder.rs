//! Incremental construction of a [`GraphRep`].

use std::cmp::Reverse;

use ch_core::{Dist, EdgeId, GeoPoint, NodeId};

use crate::{GraphError, GraphParts, GraphRep, GraphResult};

/// Handle to an edge added to a [`GraphRepBuilder`].
///
/// Keys follow insertion order; they are *not* the final `EdgeId`s, which
/// are only known after `build()` sorts edges by source.  Use
/// [`GraphRep`]'s own ids for queries.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct EdgeKey(pub u32);

/// Construct a [`GraphRep`] incrementally, then call [`build`](Self::build).
///
/// Nodes carry their CH rank; edges may be added in any order.  Shortcuts
/// refer to previously added edges by [`EdgeKey`].  `build()` sorts edges by
/// source (keeping insertion order within a node), rewrites shortcut
/// pointers to final `EdgeId`s, builds the incoming index with down-edges
/// first, and validates the result.
///
/// # Example
///
/// ```
/// use ch_core::GeoPoint;
/// use ch_graph::GraphRepBuilder;
///
/// let mut b = GraphRepBuilder::new();
/// let a = b.add_node(GeoPoint::new(487_758_000, 91_829_000), 245, 0);
/// let c = b.add_node(GeoPoint::new(487_800_000, 91_900_000), 250, 1);
/// b.add_road(a, c, 1_200, 1.0);
/// let graph = b.build().unwrap();
/// assert_eq!(graph.node_count(), 2);
/// assert_eq!(graph.edge_count(), 2); // bidirectional
/// ```
#[derive(Default)]
pub struct GraphRepBuilder {
    nodes:     Vec<RawNode>,
    raw_edges: Vec<RawEdge>,
}

struct RawNode {
    pos:       GeoPoint,
    elevation: i32,
    rank:      u32,
}

struct RawEdge {
    from:       NodeId,
    to:         NodeId,
    length:     Dist,
    multiplier: f32,
    parts:      Option<(EdgeKey, EdgeKey)>,
}

impl GraphRepBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-allocate for the expected number of nodes and edges.
    pub fn with_capacity(nodes: usize, edges: usize) -> Self {
        Self {
            nodes:     Vec::with_capacity(nodes),
            raw_edges: Vec::with_capacity(edges),
        }
    }

    /// Add a node and return its `NodeId` (sequential from 0).
    pub fn add_node(&mut self, pos: GeoPoint, elevation: i32, rank: u32) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(RawNode { pos, elevation, rank });
        id
    }

    /// Add a **directed** original edge.
    pub fn add_edge(&mut self, from: NodeId, to: NodeId, length: Dist, multiplier: f32) -> EdgeKey {
        self.push(RawEdge { from, to, length, multiplier, parts: None })
    }

    /// Add edges in **both directions**; returns `(a → b, b → a)`.
    pub fn add_road(&mut self, a: NodeId, b: NodeId, length: Dist, multiplier: f32) -> (EdgeKey, EdgeKey) {
        (
            self.add_edge(a, b, length, multiplier),
            self.add_edge(b, a, length, multiplier),
        )
    }

    /// Add a shortcut standing for `first` followed by `second`.
    ///
    /// Endpoints come from the parts; the length is their sum and the
    /// multiplier their length-weighted mean.  Both parts must already be in
    /// the builder.  Adjacency and rank consistency are checked in `build()`.
    pub fn add_shortcut(&mut self, first: EdgeKey, second: EdgeKey) -> GraphResult<EdgeKey> {
        let count = self.raw_edges.len();
        let (a, b) = match (self.raw_edges.get(first.0 as usize), self.raw_edges.get(second.0 as usize)) {
            (Some(a), Some(b)) => (a, b),
            (None, _) => return Err(GraphError::EdgeOutOfRange { edge: EdgeId(first.0), count }),
            (_, None) => return Err(GraphError::EdgeOutOfRange { edge: EdgeId(second.0), count }),
        };

        let length = a.length.saturating_add(b.length);
        let multiplier = if length == 0 {
            (a.multiplier + b.multiplier) * 0.5
        } else {
            (a.multiplier * a.length as f32 + b.multiplier * b.length as f32) / length as f32
        };
        let edge = RawEdge {
            from: a.from,
            to: b.to,
            length,
            multiplier,
            parts: Some((first, second)),
        };
        Ok(self.push(edge))
    }

    /// Endpoints and length of an edge added earlier.
    pub fn edge(&self, key: EdgeKey) -> (NodeId, NodeId, Dist) {
        let e = &self.raw_edges[key.0 as usize];
        (e.from, e.to, e.length)
    }

    pub fn rank(&self, node: NodeId) -> u32 {
        self.nodes[node.index()].rank
    }

    pub fn node_count(&self) -> usize { self.nodes.len() }
    pub fn edge_count(&self) -> usize { self.raw_edges.len() }

    fn push(&mut self, edge: RawEdge) -> EdgeKey {
        let key = EdgeKey(self.raw_edges.len() as u32);
        self.raw_edges.push(edge);
        key
    }

    /// Consume the builder and produce a validated [`GraphRep`].
    ///
    /// Time complexity: O(E log E) for the two edge sorts plus O(N + E)
    /// validation.
    pub fn build(self) -> GraphResult<GraphRep> {
        let node_count = self.nodes.len();
        let edge_count = self.raw_edges.len();

        for e in &self.raw_edges {
            for node in [e.from, e.to] {
                if node.index() >= node_count {
                    return Err(GraphError::NodeOutOfRange { node, count: node_count });
                }
            }
        }

        // Final order: grouped by source, insertion order within a group.
        let mut order: Vec<u32> = (0..edge_count as u32).collect();
        sort_by_key(&mut order, |&k| self.raw_edges[k as usize].from.0);

        let mut new_id = vec![EdgeId::INVALID; edge_count];
        for (pos, &key) in order.iter().enumerate() {
            new_id[key as usize] = EdgeId(pos as u32);
        }

        let sorted = || order.iter().map(|&k| &self.raw_edges[k as usize]);
        let edge_source: Vec<NodeId> = sorted().map(|e| e.from).collect();
        let edge_target: Vec<NodeId> = sorted().map(|e| e.to).collect();
        let edge_length: Vec<Dist>   = sorted().map(|e| e.length).collect();
        let edge_multiplier: Vec<f32> = sorted().map(|e| e.multiplier).collect();
        let edge_shortcut_first: Vec<EdgeId> = sorted()
            .map(|e| e.parts.map_or(EdgeId::INVALID, |(a, _)| new_id[a.0 as usize]))
            .collect();
        let edge_shortcut_second: Vec<EdgeId> = sorted()
            .map(|e| e.parts.map_or(EdgeId::INVALID, |(_, b)| new_id[b.0 as usize]))
            .collect();

        let out_offsets = row_pointer(node_count, edge_source.iter().copied());
        let in_offsets  = row_pointer(node_count, edge_target.iter().copied());

        // Incoming index: grouped by target, then sources of higher rank
        // first so down-edges of the backward walk precede up-edges.
        let rank = |v: NodeId| self.nodes[v.index()].rank;
        let mut in_edges: Vec<EdgeId> = (0..edge_count as u32).map(EdgeId).collect();
        sort_by_key(&mut in_edges, |&e| {
            (edge_target[e.index()].0, Reverse(rank(edge_source[e.index()])))
        });

        let (node_pos, (node_elevation, node_rank)) = self
            .nodes
            .iter()
            .map(|n| (n.pos, (n.elevation, n.rank)))
            .unzip();

        GraphRep::from_parts(GraphParts {
            node_pos,
            node_elevation,
            node_rank,
            out_offsets,
            edge_source,
            edge_target,
            edge_length,
            edge_multiplier,
            edge_shortcut_first,
            edge_shortcut_second,
            in_offsets,
            in_edges,
        })
    }
}

/// CSR row pointer from the grouping node of each edge.
fn row_pointer(node_count: usize, groups: impl Iterator<Item = NodeId>) -> Vec<u32> {
    let mut offsets = vec![0u32; node_count + 1];
    for v in groups {
        offsets[v.index() + 1] += 1;
    }
    for i in 1..=node_count {
        offsets[i] += offsets[i - 1];
    }
    offsets
}

/// Stable sort, on Rayon's pool with the `parallel` feature.
#[cfg(not(feature = "parallel"))]
fn sort_by_key<T, K: Ord>(items: &mut [T], key: impl Fn(&T) -> K) {
    items.sort_by_key(key);
}

#[cfg(feature = "parallel")]
fn sort_by_key<T: Send, K: Ord>(items: &mut [T], key: impl Fn(&T) -> K + Sync) {
    use rayon::slice::ParallelSliceMut;
    items.par_sort_by_key(key);
}

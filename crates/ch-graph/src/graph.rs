//! The ranked CH graph.
//!
//! # Data layout
//!
//! Outgoing edges use **Compressed Sparse Row (CSR)** format.  An `EdgeId`
//! is the edge's position in the source-grouped arrays, so the outgoing
//! edges of `NodeId n` are exactly the ids
//!
//! ```text
//! out_offsets[n] .. out_offsets[n+1]
//! ```
//!
//! Incoming edges are a second CSR index over the same edges: `in_edges`
//! holds `EdgeId`s grouped by target, delimited by `in_offsets`.  No edge
//! data is duplicated.
//!
//! # Up and down edges
//!
//! Every node carries a `rank` (its contraction order).  An edge is an
//! **up-edge** if `rank(source) <= rank(target)` and a **down-edge**
//! otherwise.  Nothing stores the classification; it is derived from the two
//! ranks on demand.
//!
//! Seen from the target during a backward walk, an incoming edge is worth
//! following when its source ranks at least as high as the target.  When
//! every node's incoming list has those edges first,
//! [`GraphRep::in_edges_down_first`] is `true` and the search may stop
//! scanning at the first edge that fails the test.

use std::fmt;
use std::ops::Range;

use ch_core::{Dist, EdgeId, GeoPoint, NodeId};

use crate::{GraphError, GraphResult};

// ── GraphParts ────────────────────────────────────────────────────────────────

/// Raw arrays of a [`GraphRep`], as produced by a loader.
///
/// Hand these to [`GraphRep::from_parts`], which validates every invariant
/// before the graph becomes usable.  Shortcut pointers use
/// `EdgeId::INVALID` for original edges.
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GraphParts {
    pub node_pos:             Vec<GeoPoint>,
    pub node_elevation:       Vec<i32>,
    pub node_rank:            Vec<u32>,
    pub out_offsets:          Vec<u32>,
    pub edge_source:          Vec<NodeId>,
    pub edge_target:          Vec<NodeId>,
    pub edge_length:          Vec<Dist>,
    pub edge_multiplier:      Vec<f32>,
    pub edge_shortcut_first:  Vec<EdgeId>,
    pub edge_shortcut_second: Vec<EdgeId>,
    pub in_offsets:           Vec<u32>,
    pub in_edges:             Vec<EdgeId>,
}

// ── GraphRep ──────────────────────────────────────────────────────────────────

/// Immutable contraction-hierarchy graph.
///
/// Construct with [`GraphRepBuilder`](crate::GraphRepBuilder) or
/// [`GraphRep::from_parts`]; both validate, so a `GraphRep` value is always
/// consistent.  It is `Send + Sync` and meant to be shared behind an `Arc`
/// by every search worker.
///
/// Accessors panic on out-of-range ids.
pub struct GraphRep {
    // ── Node data ─────────────────────────────────────────────────────────
    node_pos:       Vec<GeoPoint>,
    node_elevation: Vec<i32>,
    node_rank:      Vec<u32>,

    // ── Outgoing CSR (defines EdgeId order) ───────────────────────────────
    out_offsets: Vec<u32>,

    // ── Edge data (indexed by EdgeId) ─────────────────────────────────────
    edge_source:          Vec<NodeId>,
    edge_target:          Vec<NodeId>,
    edge_length:          Vec<Dist>,
    edge_multiplier:      Vec<f32>,
    edge_shortcut_first:  Vec<EdgeId>,
    edge_shortcut_second: Vec<EdgeId>,

    // ── Incoming CSR index ────────────────────────────────────────────────
    in_offsets: Vec<u32>,
    in_edges:   Vec<EdgeId>,

    in_edges_down_first: bool,
}

impl GraphRep {
    /// Validate loader-produced arrays and wrap them in a `GraphRep`.
    ///
    /// Checks array lengths, both CSR row pointers, node/edge id ranges,
    /// grouping of both edge indexes, and shortcut consistency: a shortcut
    /// `(u, w)` must point at parts `(u, v)` and `(v, w)` with
    /// `rank(v) < min(rank(u), rank(w))`, which bounds unpacking depth, and
    /// its length must equal the sum of the parts' lengths.
    pub fn from_parts(parts: GraphParts) -> GraphResult<Self> {
        let n = parts.node_pos.len();
        let m = parts.edge_source.len();

        check_len("node_elevation", n, parts.node_elevation.len())?;
        check_len("node_rank", n, parts.node_rank.len())?;
        check_len("edge_target", m, parts.edge_target.len())?;
        check_len("edge_length", m, parts.edge_length.len())?;
        check_len("edge_multiplier", m, parts.edge_multiplier.len())?;
        check_len("edge_shortcut_first", m, parts.edge_shortcut_first.len())?;
        check_len("edge_shortcut_second", m, parts.edge_shortcut_second.len())?;
        check_len("in_edges", m, parts.in_edges.len())?;
        check_offsets("out", &parts.out_offsets, n, m)?;
        check_offsets("in", &parts.in_offsets, n, m)?;

        for e in 0..m {
            for node in [parts.edge_source[e], parts.edge_target[e]] {
                if node.index() >= n {
                    return Err(GraphError::NodeOutOfRange { node, count: n });
                }
            }
        }

        // Out-array grouping: every edge in node v's range starts at v.
        for v in 0..n {
            let range = parts.out_offsets[v] as usize..parts.out_offsets[v + 1] as usize;
            for e in range {
                if parts.edge_source[e].index() != v {
                    return Err(GraphError::Ungrouped { what: "outgoing", edge: EdgeId(e as u32) });
                }
            }
        }

        // In-index grouping, plus "each edge exactly once".
        let mut seen = vec![false; m];
        for v in 0..n {
            let range = parts.in_offsets[v] as usize..parts.in_offsets[v + 1] as usize;
            for &edge in &parts.in_edges[range] {
                if edge.index() >= m {
                    return Err(GraphError::EdgeOutOfRange { edge, count: m });
                }
                if parts.edge_target[edge.index()].index() != v {
                    return Err(GraphError::Ungrouped { what: "incoming", edge });
                }
                if std::mem::replace(&mut seen[edge.index()], true) {
                    return Err(GraphError::InEdgeMismatch(edge));
                }
            }
        }

        for e in 0..m {
            check_shortcut(&parts, EdgeId(e as u32))?;
        }

        let in_edges_down_first = (0..n).all(|v| !in_list_has_down_after_up(&parts, v));

        Ok(Self {
            node_pos:             parts.node_pos,
            node_elevation:       parts.node_elevation,
            node_rank:            parts.node_rank,
            out_offsets:          parts.out_offsets,
            edge_source:          parts.edge_source,
            edge_target:          parts.edge_target,
            edge_length:          parts.edge_length,
            edge_multiplier:      parts.edge_multiplier,
            edge_shortcut_first:  parts.edge_shortcut_first,
            edge_shortcut_second: parts.edge_shortcut_second,
            in_offsets:           parts.in_offsets,
            in_edges:             parts.in_edges,
            in_edges_down_first,
        })
    }

    /// Give back the raw arrays (e.g. for a binary dump writer).
    pub fn into_parts(self) -> GraphParts {
        GraphParts {
            node_pos:             self.node_pos,
            node_elevation:       self.node_elevation,
            node_rank:            self.node_rank,
            out_offsets:          self.out_offsets,
            edge_source:          self.edge_source,
            edge_target:          self.edge_target,
            edge_length:          self.edge_length,
            edge_multiplier:      self.edge_multiplier,
            edge_shortcut_first:  self.edge_shortcut_first,
            edge_shortcut_second: self.edge_shortcut_second,
            in_offsets:           self.in_offsets,
            in_edges:             self.in_edges,
        }
    }

    // ── Graph dimensions ──────────────────────────────────────────────────

    pub fn node_count(&self) -> usize {
        self.node_pos.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_source.len()
    }

    pub fn is_empty(&self) -> bool {
        self.node_pos.is_empty()
    }

    /// `true` when every node's incoming edges are stored with all edges
    /// from higher-or-equal-ranked sources before the rest.
    #[inline]
    pub fn in_edges_down_first(&self) -> bool {
        self.in_edges_down_first
    }

    // ── Graph traversal ───────────────────────────────────────────────────

    /// Outgoing `EdgeId`s of `node`, a contiguous id range.
    #[inline]
    pub fn out_edges(&self, node: NodeId) -> impl Iterator<Item = EdgeId> + use<> {
        self.out_range(node).map(|i| EdgeId(i as u32))
    }

    /// Incoming `EdgeId`s of `node`, in stored order.
    #[inline]
    pub fn in_edges(&self, node: NodeId) -> &[EdgeId] {
        let start = self.in_offsets[node.index()] as usize;
        let end   = self.in_offsets[node.index() + 1] as usize;
        &self.in_edges[start..end]
    }

    #[inline]
    pub fn out_degree(&self, node: NodeId) -> usize {
        self.out_range(node).len()
    }

    #[inline]
    pub fn in_degree(&self, node: NodeId) -> usize {
        self.in_edges(node).len()
    }

    #[inline]
    fn out_range(&self, node: NodeId) -> Range<usize> {
        let start = self.out_offsets[node.index()] as usize;
        let end   = self.out_offsets[node.index() + 1] as usize;
        start..end
    }

    // ── Edge accessors ────────────────────────────────────────────────────

    #[inline]
    pub fn source(&self, edge: EdgeId) -> NodeId {
        self.edge_source[edge.index()]
    }

    #[inline]
    pub fn target(&self, edge: EdgeId) -> NodeId {
        self.edge_target[edge.index()]
    }

    /// Length in metres.  For a shortcut, the sum of the parts.
    #[inline]
    pub fn length(&self, edge: EdgeId) -> Dist {
        self.edge_length[edge.index()]
    }

    /// Travel-cost multiplier carried through from the loader.
    #[inline]
    pub fn multiplier(&self, edge: EdgeId) -> f32 {
        self.edge_multiplier[edge.index()]
    }

    /// The two edges a shortcut stands for, or `None` for an original edge.
    #[inline]
    pub fn shortcut_parts(&self, edge: EdgeId) -> Option<(EdgeId, EdgeId)> {
        let first = self.edge_shortcut_first[edge.index()];
        first
            .is_valid()
            .then(|| (first, self.edge_shortcut_second[edge.index()]))
    }

    #[inline]
    pub fn is_shortcut(&self, edge: EdgeId) -> bool {
        self.edge_shortcut_first[edge.index()].is_valid()
    }

    /// `rank(source) <= rank(target)`.
    #[inline]
    pub fn is_up_edge(&self, edge: EdgeId) -> bool {
        self.rank(self.source(edge)) <= self.rank(self.target(edge))
    }

    // ── Node accessors ────────────────────────────────────────────────────

    #[inline]
    pub fn rank(&self, node: NodeId) -> u32 {
        self.node_rank[node.index()]
    }

    #[inline]
    pub fn coordinates(&self, node: NodeId) -> GeoPoint {
        self.node_pos[node.index()]
    }

    #[inline]
    pub fn elevation(&self, node: NodeId) -> i32 {
        self.node_elevation[node.index()]
    }
}

impl fmt::Debug for GraphRep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphRep")
            .field("nodes", &self.node_count())
            .field("edges", &self.edge_count())
            .field("shortcuts", &self.edge_shortcut_first.iter().filter(|e| e.is_valid()).count())
            .field("in_edges_down_first", &self.in_edges_down_first)
            .finish()
    }
}

// ── Validation helpers ────────────────────────────────────────────────────────

fn check_len(what: &'static str, expected: usize, got: usize) -> GraphResult<()> {
    if expected != got {
        return Err(GraphError::LengthMismatch { what, expected, got });
    }
    Ok(())
}

fn check_offsets(what: &'static str, offsets: &[u32], n: usize, m: usize) -> GraphResult<()> {
    let bad = |reason: String| Err(GraphError::BadOffsets { what, reason });
    if offsets.len() != n + 1 {
        return bad(format!("length {} for {n} nodes", offsets.len()));
    }
    if offsets[0] != 0 {
        return bad(format!("first offset is {}", offsets[0]));
    }
    if offsets[n] as usize != m {
        return bad(format!("last offset is {} for {m} edges", offsets[n]));
    }
    if let Some(i) = offsets.windows(2).position(|w| w[0] > w[1]) {
        return bad(format!("offset {i} exceeds offset {}", i + 1));
    }
    Ok(())
}

fn check_shortcut(parts: &GraphParts, edge: EdgeId) -> GraphResult<()> {
    let m = parts.edge_source.len();
    let first  = parts.edge_shortcut_first[edge.index()];
    let second = parts.edge_shortcut_second[edge.index()];
    let broken = |reason| Err(GraphError::BrokenShortcut { edge, reason });

    match (first.is_valid(), second.is_valid()) {
        (false, false) => return Ok(()),
        (true, true) => {}
        _ => return broken("only one part pointer is set"),
    }
    for part in [first, second] {
        if part.index() >= m {
            return Err(GraphError::EdgeOutOfRange { edge: part, count: m });
        }
    }

    let (src, dst) = (parts.edge_source[edge.index()], parts.edge_target[edge.index()]);
    let via = parts.edge_target[first.index()];
    if parts.edge_source[first.index()] != src {
        return broken("first part does not start at the shortcut source");
    }
    if parts.edge_source[second.index()] != via {
        return broken("parts are not adjacent");
    }
    if parts.edge_target[second.index()] != dst {
        return broken("second part does not end at the shortcut target");
    }
    let rank = |v: NodeId| parts.node_rank[v.index()];
    if rank(via) >= rank(src).min(rank(dst)) {
        return broken("bypassed node does not rank below both endpoints");
    }
    let parts_length = parts.edge_length[first.index()].saturating_add(parts.edge_length[second.index()]);
    if parts.edge_length[edge.index()] != parts_length {
        return broken("length is not the sum of its parts");
    }
    Ok(())
}

/// `true` if some down-edge of `v`'s incoming list comes after an up-edge.
fn in_list_has_down_after_up(parts: &GraphParts, v: usize) -> bool {
    let range = parts.in_offsets[v] as usize..parts.in_offsets[v + 1] as usize;
    let rank = parts.node_rank[v];
    let mut seen_up = false;
    for &edge in &parts.in_edges[range] {
        let down = parts.node_rank[parts.edge_source[edge.index()].index()] >= rank;
        if down && seen_up {
            return true;
        }
        seen_up |= !down;
    }
    false
}

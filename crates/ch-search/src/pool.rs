//! Per-worker scratch buffers for the search.
//!
//! # Borrow discipline
//!
//! Every buffer kind lives in an `Option` slot.  `borrow_*` moves the
//! buffer out and `return_*` moves it back, so a search owns its buffers
//! outright while it runs and the borrow checker never has to reason about
//! the pool.  At most one buffer of each kind is out at a time; borrowing a
//! kind twice, or returning one that was never borrowed, is a bug in the
//! caller and panics.
//!
//! # Reset cost
//!
//! Buffers are cleaned on return, and only where the search wrote:
//!
//! | Buffer       | Reset on return                                       |
//! |--------------|-------------------------------------------------------|
//! | `DistArray`  | touched indices back to `INFINITY` (or all, on request) |
//! | marked set   | dirtied words                                         |
//! | visited set  | dirtied words                                         |
//! | deque, heap  | `clear()` (capacity kept)                             |
//! | prev array   | none; only entries of nodes reached by the current search are read |

use std::collections::VecDeque;
use std::ops::Index;

use ch_core::{Dist, EdgeId, INFINITY, NodeId};
use ch_graph::GraphRep;

use crate::{BitSet, MinHeap};

// ── DistArray ─────────────────────────────────────────────────────────────────

/// Tentative distance per node, `INFINITY` when unreached.
///
/// Remembers every node it moved away from `INFINITY` so
/// [`reset_touched`](Self::reset_touched) costs O(reached nodes) instead of
/// O(node count).
#[derive(Clone, Debug)]
pub struct DistArray {
    values:  Vec<Dist>,
    touched: Vec<NodeId>,
}

impl DistArray {
    pub fn new(node_count: usize) -> Self {
        Self { values: vec![INFINITY; node_count], touched: Vec::new() }
    }

    #[inline]
    pub fn get(&self, node: NodeId) -> Dist {
        self.values[node.index()]
    }

    #[inline]
    pub fn set(&mut self, node: NodeId, dist: Dist) {
        let slot = &mut self.values[node.index()];
        if *slot == INFINITY {
            self.touched.push(node);
        }
        *slot = dist;
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Nodes written since the last reset.
    pub fn touched(&self) -> &[NodeId] {
        &self.touched
    }

    pub fn reset_touched(&mut self) {
        for node in self.touched.drain(..) {
            self.values[node.index()] = INFINITY;
        }
    }

    pub fn reset_full(&mut self) {
        self.values.fill(INFINITY);
        self.touched.clear();
    }
}

impl Index<NodeId> for DistArray {
    type Output = Dist;

    #[inline]
    fn index(&self, node: NodeId) -> &Dist {
        &self.values[node.index()]
    }
}

// ── ResourcePool ──────────────────────────────────────────────────────────────

/// One worker's reusable search buffers.
///
/// Built once at worker start-up with the graph's dimensions and never
/// shared across threads.
#[derive(Debug)]
pub struct ResourcePool {
    node_count: usize,
    edge_count: usize,
    dists:      Option<DistArray>,
    prev:       Option<Vec<EdgeId>>,
    marked:     Option<BitSet>,
    visited:    Option<BitSet>,
    deque:      Option<VecDeque<u32>>,
    heap:       Option<MinHeap>,
}

impl ResourcePool {
    pub fn new(node_count: usize, edge_count: usize) -> Self {
        Self {
            node_count,
            edge_count,
            dists:   Some(DistArray::new(node_count)),
            prev:    Some(vec![EdgeId::INVALID; node_count]),
            marked:  Some(BitSet::new(edge_count)),
            visited: Some(BitSet::new(node_count)),
            deque:   Some(VecDeque::new()),
            heap:    Some(MinHeap::new()),
        }
    }

    /// Pool sized for `graph`.
    pub fn for_graph(graph: &GraphRep) -> Self {
        Self::new(graph.node_count(), graph.edge_count())
    }

    pub fn node_count(&self) -> usize {
        self.node_count
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    // ── Distance array ────────────────────────────────────────────────────

    pub fn borrow_dist_array(&mut self) -> DistArray {
        take(&mut self.dists, "distance array")
    }

    /// Give the distance array back.  With `full_reset` every entry is
    /// rewritten; otherwise only the touched ones.
    pub fn return_dist_array(&mut self, mut dists: DistArray, full_reset: bool) {
        assert_eq!(dists.len(), self.node_count, "distance array from a different pool");
        if full_reset {
            dists.reset_full();
        } else {
            dists.reset_touched();
        }
        put(&mut self.dists, dists, "distance array");
    }

    // ── Predecessor array ─────────────────────────────────────────────────

    pub fn borrow_prev_array(&mut self) -> Vec<EdgeId> {
        take(&mut self.prev, "predecessor array")
    }

    pub fn return_prev_array(&mut self, prev: Vec<EdgeId>) {
        assert_eq!(prev.len(), self.node_count, "predecessor array from a different pool");
        put(&mut self.prev, prev, "predecessor array");
    }

    // ── Bit sets ──────────────────────────────────────────────────────────

    pub fn borrow_marked_set(&mut self) -> BitSet {
        take(&mut self.marked, "marked-edge set")
    }

    pub fn return_marked_set(&mut self, mut marked: BitSet) {
        assert_eq!(marked.len(), self.edge_count, "marked-edge set from a different pool");
        marked.clear_touched();
        put(&mut self.marked, marked, "marked-edge set");
    }

    pub fn borrow_visited_set(&mut self) -> BitSet {
        take(&mut self.visited, "visited-node set")
    }

    pub fn return_visited_set(&mut self, mut visited: BitSet) {
        assert_eq!(visited.len(), self.node_count, "visited-node set from a different pool");
        visited.clear_touched();
        put(&mut self.visited, visited, "visited-node set");
    }

    // ── Deque & heap ──────────────────────────────────────────────────────

    pub fn borrow_deque(&mut self) -> VecDeque<u32> {
        take(&mut self.deque, "deque")
    }

    pub fn return_deque(&mut self, mut deque: VecDeque<u32>) {
        deque.clear();
        put(&mut self.deque, deque, "deque");
    }

    pub fn borrow_heap(&mut self) -> MinHeap {
        take(&mut self.heap, "heap")
    }

    pub fn return_heap(&mut self, mut heap: MinHeap) {
        heap.clear();
        put(&mut self.heap, heap, "heap");
    }

    /// `true` when every buffer is back in the pool.
    pub fn is_idle(&self) -> bool {
        self.dists.is_some()
            && self.prev.is_some()
            && self.marked.is_some()
            && self.visited.is_some()
            && self.deque.is_some()
            && self.heap.is_some()
    }
}

fn take<T>(slot: &mut Option<T>, what: &str) -> T {
    match slot.take() {
        Some(buffer) => buffer,
        None => panic!("resource pool: {what} borrowed while already borrowed"),
    }
}

fn put<T>(slot: &mut Option<T>, buffer: T, what: &str) {
    assert!(slot.is_none(), "resource pool: {what} returned without being borrowed");
    *slot = Some(buffer);
}

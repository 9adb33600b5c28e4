//! The contraction-hierarchy search.
//!
//! # Why the marking pass works
//!
//! Every shortest path in a CH graph can be split at its highest-ranked node
//! into an *up* part (ranks increasing) and a *down* part (ranks
//! decreasing).  The down part arrives at the destination, so walking
//! incoming edges backwards from the destination and following only edges
//! whose source ranks at least as high as their target reaches every edge
//! such a down part can use.  The forward Dijkstra then relaxes up-edges
//! everywhere and down-edges only where they were marked, which prunes
//! almost the whole graph.  Because the restricted graph is a subgraph of
//! the real one containing an optimal path, the search may stop as soon as
//! the destination is popped.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;

use log::{debug, trace};

use ch_core::{Dist, EdgeId, EngineConfig, NodeId};
use ch_graph::GraphRep;

use crate::{
    BitSet, ConstraintValue, DistArray, DistanceMatrix, RequestPoints, ResourcePool, SearchError,
    SearchResult, Way, DIST_TO_PREV, TIME_TO_PREV,
};

// ── SearchStats ───────────────────────────────────────────────────────────────

/// Work counters for the most recent leg or matrix computation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SearchStats {
    /// Nodes expanded by the backward marking pass.
    pub bfs_nodes: u64,
    /// Edges marked by the backward marking pass.
    pub bfs_edges: u64,
    /// Nodes settled by the forward search.
    pub settled_nodes: u64,
}

// ── ShortestPathEngine ────────────────────────────────────────────────────────

/// CH query engine bound to one graph and one scratch pool.
///
/// Not `Sync` in spirit: give every worker thread its own engine.
pub struct ShortestPathEngine {
    graph:  Arc<GraphRep>,
    pool:   ResourcePool,
    config: EngineConfig,
    stats:  SearchStats,
}

impl ShortestPathEngine {
    pub fn new(graph: Arc<GraphRep>, config: EngineConfig) -> Self {
        let pool = ResourcePool::for_graph(&graph);
        Self { graph, pool, config, stats: SearchStats::default() }
    }

    pub fn graph(&self) -> &GraphRep {
        &self.graph
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn stats(&self) -> SearchStats {
        self.stats
    }

    /// The engine's scratch pool, for callers composing the low-level steps
    /// themselves.
    pub fn pool_mut(&mut self) -> &mut ResourcePool {
        &mut self.pool
    }

    // ── Step ①: backward marking ──────────────────────────────────────────

    /// Mark every edge that can lie on the down part of a shortest path
    /// ending at `target`.
    pub fn bfs_mark(&mut self, marked: &mut BitSet, target: NodeId) {
        self.bfs_mark_all(marked, &[target]);
    }

    /// [`bfs_mark`](Self::bfs_mark) from several targets in one sweep.  Used
    /// for distance matrices, where one marked set serves every row.
    pub fn bfs_mark_all(&mut self, marked: &mut BitSet, targets: &[NodeId]) {
        let mut deque = self.pool.borrow_deque();
        let mut visited = self.pool.borrow_visited_set();
        for &target in targets {
            if visited.insert(target.index()) {
                deque.push_front(target.0);
            }
        }
        self.mark_down_edges(marked, &mut deque, &mut visited);
        self.pool.return_visited_set(visited);
        self.pool.return_deque(deque);
    }

    fn mark_down_edges(&mut self, marked: &mut BitSet, deque: &mut VecDeque<u32>, visited: &mut BitSet) {
        let graph = &*self.graph;
        // Breaking early is only sound when storage puts down-edges first.
        let early_exit = self.config.early_exit_in_edges && graph.in_edges_down_first();

        while let Some(raw) = deque.pop_back() {
            let node = NodeId(raw);
            let rank = graph.rank(node);
            self.stats.bfs_nodes += 1;

            for &edge in graph.in_edges(node) {
                let source = graph.source(edge);
                if graph.rank(source) >= rank {
                    self.stats.bfs_edges += 1;
                    marked.insert(edge.index());
                    if visited.insert(source.index()) {
                        deque.push_front(source.0);
                    }
                } else if early_exit {
                    break;
                }
            }
        }
    }

    // ── Step ②: forward pruned Dijkstra ───────────────────────────────────

    /// Dijkstra from `src` over up-edges and `marked` edges, stopping when
    /// `dest` is popped.  Fills `dists` and `prev` for every reached node.
    ///
    /// Returns `false` if the heap runs empty first (no path).
    pub fn dijkstra_stop_at_dest(
        &mut self,
        dists:  &mut DistArray,
        prev:   &mut [EdgeId],
        marked: &BitSet,
        src:    NodeId,
        dest:   NodeId,
    ) -> bool {
        let graph = &*self.graph;
        let mut heap = self.pool.borrow_heap();
        dists.set(src, 0);
        heap.insert(src, 0);

        let mut found = false;
        while let Some((node, dist)) = heap.pop_min() {
            if node == dest {
                found = true;
                break;
            }
            // Skip stale heap entries.
            if dist > dists.get(node) {
                continue;
            }
            self.stats.settled_nodes += 1;

            let rank = graph.rank(node);
            for edge in graph.out_edges(node) {
                let next = graph.target(edge);
                if marked.contains(edge.index()) || rank <= graph.rank(next) {
                    let candidate = dist.saturating_add(graph.length(edge));
                    if candidate < dists.get(next) {
                        dists.set(next, candidate);
                        prev[next.index()] = edge;
                        heap.insert(next, candidate);
                    }
                }
            }
        }

        self.pool.return_heap(heap);
        found
    }

    /// Same pruned search as [`dijkstra_stop_at_dest`](Self::dijkstra_stop_at_dest)
    /// but runs until the heap is empty and records distances only.
    pub fn dijkstra_stop_at_empty_dist_only(&mut self, dists: &mut DistArray, marked: &BitSet, src: NodeId) {
        let graph = &*self.graph;
        let mut heap = self.pool.borrow_heap();
        dists.set(src, 0);
        heap.insert(src, 0);

        while let Some((node, dist)) = heap.pop_min() {
            if dist > dists.get(node) {
                continue;
            }
            self.stats.settled_nodes += 1;

            let rank = graph.rank(node);
            for edge in graph.out_edges(node) {
                let next = graph.target(edge);
                if marked.contains(edge.index()) || rank <= graph.rank(next) {
                    let candidate = dist.saturating_add(graph.length(edge));
                    if candidate < dists.get(next) {
                        dists.set(next, candidate);
                        heap.insert(next, candidate);
                    }
                }
            }
        }

        self.pool.return_heap(heap);
    }

    // ── Step ③: backtracking & shortcut unpacking ─────────────────────────

    /// Walk `prev` back from `dest` to `src`, unpack shortcuts, and append
    /// the coordinates of every original edge's source followed by `dest`'s
    /// coordinates to `way`.  Sets `way.distance` to the summed lengths.
    pub fn backtrack(&mut self, prev: &[EdgeId], way: &mut Way, src: NodeId, dest: NodeId) {
        let graph = Arc::clone(&self.graph);
        let mut length = 0u64;
        self.unpack(prev, src, dest, |edge| {
            way.push_point(graph.coordinates(graph.source(edge)));
            length += graph.length(edge) as u64;
        });
        way.push_point(graph.coordinates(dest));
        way.distance = length;
    }

    /// The unpacked original edges from `src` to `dest`, in path order.
    pub fn path_edges(&mut self, prev: &[EdgeId], src: NodeId, dest: NodeId) -> Vec<EdgeId> {
        let mut edges = Vec::new();
        self.unpack(prev, src, dest, |edge| edges.push(edge));
        edges
    }

    fn unpack(&mut self, prev: &[EdgeId], src: NodeId, dest: NodeId, mut visit: impl FnMut(EdgeId)) {
        let graph = &*self.graph;
        // Used as a stack: the front is the next edge in path order.
        let mut deque = self.pool.borrow_deque();

        let mut current = dest;
        while current != src {
            let edge = prev[current.index()];
            deque.push_front(edge.0);
            current = graph.source(edge);
        }
        trace!("unpacking {} search edges", deque.len());

        while let Some(raw) = deque.pop_front() {
            let edge = EdgeId(raw);
            match graph.shortcut_parts(edge) {
                Some((first, second)) => {
                    deque.push_front(second.0);
                    deque.push_front(first.0);
                }
                None => visit(edge),
            }
        }

        self.pool.return_deque(deque);
    }

    // ── Legs & multi-waypoint routes ──────────────────────────────────────

    /// Route one leg.  `None` if `dest` is unreachable from `src`.
    pub fn route_leg(&mut self, src: NodeId, dest: NodeId) -> Option<Way> {
        self.stats = SearchStats::default();
        let mut dists = self.pool.borrow_dist_array();
        let mut prev = self.pool.borrow_prev_array();
        let mut marked = self.pool.borrow_marked_set();

        let start = Instant::now();
        self.bfs_mark(&mut marked, dest);
        let bfs_done = Instant::now();
        let found = self.dijkstra_stop_at_dest(&mut dists, &mut prev, &marked, src, dest);
        let dijkstra_done = Instant::now();

        let way = found.then(|| {
            let mut way = Way::new();
            self.backtrack(&prev, &mut way, src, dest);
            way.travel_time = dists.get(dest) as f64 * self.config.travel_time_constant;
            way
        });

        if let Some(way) = &way {
            let direct = self.graph.coordinates(src).distance_m(self.graph.coordinates(dest));
            debug!(
                "leg {src} -> {dest}: {:.3} km (direct {:.3} km); bfs {:?} over {} nodes / {} edges, \
                 dijkstra {:?} settling {} nodes, backtrack {:?}",
                way.distance as f64 / 1000.0,
                direct / 1000.0,
                bfs_done - start,
                self.stats.bfs_nodes,
                self.stats.bfs_edges,
                dijkstra_done - bfs_done,
                self.stats.settled_nodes,
                dijkstra_done.elapsed(),
            );
        } else {
            debug!("no path from {src} to {dest}");
        }

        self.pool.return_dist_array(dists, false);
        self.pool.return_prev_array(prev);
        self.pool.return_marked_set(marked);
        way
    }

    /// Route `points[0] → points[1] → … → points[n-1]` (and back to
    /// `points[0]` when `tour`), appending one [`Way`] per leg to `ways`.
    ///
    /// Each leg's distance and travel time are written to the constraint map
    /// of waypoint `(i + 1) % n`.  That index wraps in non-tour routes too,
    /// so for `[a, b]` only `b` is written.
    ///
    /// Returns the summed distance.  If any leg has no path, nothing is
    /// appended, no constraint is written, and the failing leg is reported.
    pub fn shortest_path(&mut self, points: &mut RequestPoints, ways: &mut Vec<Way>, tour: bool) -> SearchResult<u64> {
        let n = points.len();
        let mut legs = Vec::with_capacity(n);

        for i in 0..n {
            let src = points.node(i);
            let dest = if i + 1 < n {
                points.node(i + 1)
            } else if tour {
                points.node(0)
            } else {
                break;
            };

            match self.route_leg(src, dest) {
                Some(way) => legs.push(way),
                None => return Err(SearchError::NoPathFound { leg: i, from: src, to: dest }),
            }
        }

        let mut total = 0u64;
        for (i, way) in legs.iter().enumerate() {
            total += way.distance;
            let constraints = points.constraints_mut((i + 1) % n);
            constraints.insert(DIST_TO_PREV.to_string(), ConstraintValue::Int(way.distance as i64));
            constraints.insert(TIME_TO_PREV.to_string(), ConstraintValue::Float(way.travel_time));
        }
        ways.extend(legs);
        Ok(total)
    }

    /// Settled distance from `src` to `dest`, without building a way.
    pub fn distance(&mut self, src: NodeId, dest: NodeId) -> Option<Dist> {
        self.stats = SearchStats::default();
        let mut dists = self.pool.borrow_dist_array();
        let mut prev = self.pool.borrow_prev_array();
        let mut marked = self.pool.borrow_marked_set();

        self.bfs_mark(&mut marked, dest);
        let found = self.dijkstra_stop_at_dest(&mut dists, &mut prev, &marked, src, dest);
        let dist = found.then(|| dists.get(dest));

        self.pool.return_dist_array(dists, false);
        self.pool.return_prev_array(prev);
        self.pool.return_marked_set(marked);
        dist
    }

    // ── All-pairs ─────────────────────────────────────────────────────────

    /// Distances between every ordered pair of `nodes`.
    ///
    /// Marks once from all nodes, then runs one exhaustive pruned search per
    /// row, so the cost is one backward sweep plus `n` forward searches.
    pub fn distance_matrix(&mut self, nodes: &[NodeId]) -> DistanceMatrix {
        self.stats = SearchStats::default();
        let mut matrix = DistanceMatrix::new(nodes.len());
        let mut marked = self.pool.borrow_marked_set();
        self.bfs_mark_all(&mut marked, nodes);

        for (i, &src) in nodes.iter().enumerate() {
            let mut dists = self.pool.borrow_dist_array();
            self.dijkstra_stop_at_empty_dist_only(&mut dists, &marked, src);
            for (j, &dest) in nodes.iter().enumerate() {
                matrix.set(i, j, dists.get(dest));
            }
            self.pool.return_dist_array(dists, false);
        }

        self.pool.return_marked_set(marked);
        debug!(
            "distance matrix over {} points: {} marked edges, {} settled nodes",
            nodes.len(),
            self.stats.bfs_edges,
            self.stats.settled_nodes,
        );
        matrix
    }
}

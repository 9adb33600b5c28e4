//! Lazy-deletion binary min-heap keyed by tentative distance.
//!
//! There is no decrease-key: improving a node's distance pushes a second
//! entry.  The search keeps the authoritative distances in a separate array
//! and drops popped entries whose key is larger than that value.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use ch_core::{Dist, NodeId};

#[derive(Debug, Default)]
pub struct MinHeap {
    // Reverse turns BinaryHeap (max) into a min-heap.  NodeId as secondary
    // key makes tie-breaking deterministic.
    inner: BinaryHeap<Reverse<(Dist, NodeId)>>,
}

impl MinHeap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { inner: BinaryHeap::with_capacity(capacity) }
    }

    #[inline]
    pub fn insert(&mut self, node: NodeId, dist: Dist) {
        self.inner.push(Reverse((dist, node)));
    }

    /// Remove the entry with the smallest distance.
    #[inline]
    pub fn pop_min(&mut self) -> Option<(NodeId, Dist)> {
        self.inner.pop().map(|Reverse((dist, node))| (node, dist))
    }

    #[inline]
    pub fn peek_min(&self) -> Option<(NodeId, Dist)> {
        self.inner.peek().map(|&Reverse((dist, node))| (node, dist))
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Drop all entries, keeping the allocation.
    pub fn clear(&mut self) {
        self.inner.clear();
    }
}

//! Synthetic street grid with a small contraction hierarchy on top.
//!
//! Real deployments load a graph that was contracted offline.  The demo
//! contracts its own grid with the simplest possible rule: when a node is
//! contracted, every `u → v → w` through it gets a shortcut unless a direct
//! `u → w` edge at least as short already exists.  No witness search, so
//! it only suits small graphs.

use ch_core::{Dist, GeoPoint, NodeId};
use ch_graph::{EdgeKey, GraphRep, GraphRepBuilder, GraphResult};

/// South-west corner, roughly downtown Stuttgart.
const ORIGIN: (f64, f64) = (48.770, 9.170);

/// Spacing between grid streets, in degrees.
const STEP: f64 = 0.004;

/// Build a `width × height` grid of two-way streets.
///
/// Node `(x, y)` gets id `y * width + x`.  Every third street in either
/// direction is an arterial with a lower travel-cost multiplier.
pub fn build_grid(width: usize, height: usize) -> GraphResult<GraphRep> {
    let order = contraction_order(width, height);
    let mut rank = vec![0u32; width * height];
    for (r, &v) in order.iter().enumerate() {
        rank[v] = r as u32;
    }

    let mut b = GraphRepBuilder::with_capacity(width * height, 8 * width * height);
    let mut pos = Vec::with_capacity(width * height);
    for y in 0..height {
        for x in 0..width {
            let p = GeoPoint::from_degrees(ORIGIN.0 + y as f64 * STEP, ORIGIN.1 + x as f64 * STEP);
            pos.push(p);
            b.add_node(p, 240 + (x * 3 + y * 5) as i32 % 40, rank[y * width + x]);
        }
    }

    let mut adjacency = Adjacency::new(width * height);
    for y in 0..height {
        for x in 0..width {
            let v = y * width + x;
            if x + 1 < width {
                let multiplier = if y % 3 == 0 { 0.7 } else { 1.0 };
                adjacency.add_road(&mut b, &pos, v, v + 1, multiplier);
            }
            if y + 1 < height {
                let multiplier = if x % 3 == 0 { 0.7 } else { 1.0 };
                adjacency.add_road(&mut b, &pos, v, v + width, multiplier);
            }
        }
    }

    let mut contracted = vec![false; width * height];
    for &v in &order {
        adjacency.contract(&mut b, &contracted, v)?;
        contracted[v] = true;
    }
    b.build()
}

/// Nodes on streets whose index has more trailing zeros are contracted
/// later, so long straight runs end up high in the hierarchy.
fn contraction_order(width: usize, height: usize) -> Vec<usize> {
    let level = |v: usize| {
        let (x, y) = (v % width, v / width);
        (x + 1).trailing_zeros() + (y + 1).trailing_zeros()
    };
    let mut order: Vec<usize> = (0..width * height).collect();
    order.sort_by_key(|&v| (level(v), v));
    order
}

#[derive(Copy, Clone)]
struct Link {
    to:     usize,
    length: Dist,
    key:    EdgeKey,
}

/// Forward and backward adjacency of the graph being contracted.
struct Adjacency {
    out: Vec<Vec<Link>>,
    inc: Vec<Vec<Link>>,
}

impl Adjacency {
    fn new(n: usize) -> Self {
        Self { out: vec![Vec::new(); n], inc: vec![Vec::new(); n] }
    }

    fn add_road(&mut self, b: &mut GraphRepBuilder, pos: &[GeoPoint], u: usize, w: usize, multiplier: f32) {
        let length = pos[u].distance_m(pos[w]).round() as Dist;
        let (uw, wu) = b.add_road(NodeId(u as u32), NodeId(w as u32), length, multiplier);
        self.link(u, w, length, uw);
        self.link(w, u, length, wu);
    }

    fn link(&mut self, from: usize, to: usize, length: Dist, key: EdgeKey) {
        self.out[from].push(Link { to, length, key });
        self.inc[to].push(Link { to: from, length, key });
    }

    fn contract(&mut self, b: &mut GraphRepBuilder, contracted: &[bool], v: usize) -> GraphResult<()> {
        let ins: Vec<Link> = self.inc[v].iter().filter(|a| !contracted[a.to]).copied().collect();
        let outs: Vec<Link> = self.out[v].iter().filter(|a| !contracted[a.to]).copied().collect();
        for first in &ins {
            for second in &outs {
                let (u, w) = (first.to, second.to);
                if u == w {
                    continue;
                }
                let length = first.length.saturating_add(second.length);
                if self.out[u].iter().any(|a| a.to == w && a.length <= length) {
                    continue;
                }
                let key = b.add_shortcut(first.key, second.key)?;
                self.link(u, w, length, key);
            }
        }
        Ok(())
    }
}

//! Dense distance matrix over a small set of waypoints.

use ch_core::{Dist, INFINITY};

/// Row-major `size × size` matrix of shortest-path distances.
/// Unreachable pairs hold `INFINITY`.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DistanceMatrix {
    size:   usize,
    values: Vec<Dist>,
}

impl DistanceMatrix {
    pub fn new(size: usize) -> Self {
        Self { size, values: vec![INFINITY; size * size] }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn get(&self, from: usize, to: usize) -> Dist {
        self.values[from * self.size + to]
    }

    #[inline]
    pub fn set(&mut self, from: usize, to: usize, dist: Dist) {
        self.values[from * self.size + to] = dist;
    }

    pub fn row(&self, from: usize) -> &[Dist] {
        &self.values[from * self.size..(from + 1) * self.size]
    }

    pub fn is_symmetric(&self) -> bool {
        (0..self.size).all(|i| (0..i).all(|j| self.get(i, j) == self.get(j, i)))
    }

    /// Greedy tour order: start at 0, then repeatedly go to the closest
    /// waypoint not yet visited.  Ties go to the lower index; unreachable
    /// waypoints are appended in index order once nothing reachable is left.
    pub fn nearest_neighbor_order(&self) -> Vec<usize> {
        if self.size == 0 {
            return Vec::new();
        }
        let mut visited = vec![false; self.size];
        let mut order = Vec::with_capacity(self.size);
        let mut current = 0;
        visited[0] = true;
        order.push(0);

        while let Some(next) = (0..self.size)
            .filter(|&i| !visited[i])
            .min_by_key(|&i| (self.get(current, i), i))
        {
            visited[next] = true;
            order.push(next);
            current = next;
        }
        order
    }
}

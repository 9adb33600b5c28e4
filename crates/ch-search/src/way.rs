//! One routed leg between two consecutive waypoints.

use ch_core::GeoPoint;

/// Coordinates of a leg from source to destination plus its totals.
///
/// Points are appended in path order by the engine's backtracking step; the
/// way is complete (and never modified again) once the engine hands it out.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Way {
    points: Vec<GeoPoint>,
    /// Sum of the original edge lengths along the leg, in metres.
    pub distance: u64,
    /// Settled distance scaled by the engine's travel-time constant.
    pub travel_time: f64,
}

impl Way {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn push_point(&mut self, point: GeoPoint) {
        self.points.push(point);
    }

    pub fn points(&self) -> &[GeoPoint] {
        &self.points
    }

    pub fn point(&self, i: usize) -> GeoPoint {
        self.points[i]
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

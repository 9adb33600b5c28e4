//! Fixed-point geographic coordinates.
//!
//! Graph files store latitude and longitude as integers scaled by 10⁷
//! (≈ 1 cm at the equator).  Keeping them as `i32` makes the per-node arrays
//! compact and lets way points be compared exactly in tests.

/// Scale factor between degrees and the stored fixed-point integers.
pub const FIXED_POINT_SCALE: f64 = 10_000_000.0;

/// A WGS-84 coordinate in fixed-point degrees × 10⁷.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GeoPoint {
    pub lat: i32,
    pub lon: i32,
}

impl GeoPoint {
    #[inline]
    pub fn new(lat: i32, lon: i32) -> Self {
        Self { lat, lon }
    }

    /// Build from floating-point degrees, rounding to the nearest unit.
    pub fn from_degrees(lat: f64, lon: f64) -> Self {
        Self {
            lat: (lat * FIXED_POINT_SCALE).round() as i32,
            lon: (lon * FIXED_POINT_SCALE).round() as i32,
        }
    }

    #[inline]
    pub fn lat_degrees(self) -> f64 {
        self.lat as f64 / FIXED_POINT_SCALE
    }

    #[inline]
    pub fn lon_degrees(self) -> f64 {
        self.lon as f64 / FIXED_POINT_SCALE
    }

    /// Haversine great-circle distance in metres.
    ///
    /// Only used for diagnostics (direct vs. routed distance); routing itself
    /// relies on the edge lengths stored in the graph.
    pub fn distance_m(self, other: GeoPoint) -> f64 {
        const R: f64 = 6_371_000.0; // mean Earth radius, metres

        let d_lat = (other.lat_degrees() - self.lat_degrees()).to_radians();
        let d_lon = (other.lon_degrees() - self.lon_degrees()).to_radians();

        let lat1 = self.lat_degrees().to_radians();
        let lat2 = other.lat_degrees().to_radians();

        let a = (d_lat * 0.5).sin().powi(2)
            + lat1.cos() * lat2.cos() * (d_lon * 0.5).sin().powi(2);

        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
        R * c
    }
}

impl std::fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.7}, {:.7})", self.lat_degrees(), self.lon_degrees())
    }
}

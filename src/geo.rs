use crate::Cost;

/// Mean earth radius in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Coord {
    pub lat: f64,
    pub lon: f64,
}

impl Coord {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Finite, with latitude in [-90, 90] and longitude in [-180, 180].
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lon)
    }
}

impl From<(f64, f64)> for Coord {
    fn from((lat, lon): (f64, f64)) -> Self {
        Self { lat, lon }
    }
}

/// Great-circle distance between `a` and `b` in kilometres.
pub fn haversine(a: Coord, b: Coord) -> Cost {
    let d_lat = (a.lat - b.lat).to_radians();
    let d_lon = (a.lon - b.lon).to_radians();
    let h = (d_lat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_KM * c
}

/// Edge costs and remaining-cost estimates used by the search.
///
/// `estimate` must be consistent with `edge_cost`, i.e.
/// `estimate(u, goal) <= edge_cost(u, v) + estimate(v, goal)` for every edge,
/// otherwise closed nodes may hold non-optimal costs.
pub trait CostModel {
    fn edge_cost(&self, from: Coord, to: Coord) -> Cost;
    fn estimate(&self, from: Coord, goal: Coord) -> Cost;
}

/// Straight-line distance over the earth surface, for both edges and estimates.
#[derive(Debug, Clone, Copy, Default)]
pub struct GreatCircle;

impl CostModel for GreatCircle {
    fn edge_cost(&self, from: Coord, to: Coord) -> Cost {
        haversine(from, to)
    }

    fn estimate(&self, from: Coord, goal: Coord) -> Cost {
        haversine(from, goal)
    }
}

//! Grid point definitions
//!
//! A grid point is one lattice coordinate used as the center of a provider query.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// A latitude/longitude pair on the search lattice
///
/// Identity is exact value equality on the coordinate bits. Two points that
/// are merely close together are different points.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct GridPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GridPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Formats the point the way the provider expects it: `"lat,lng"`
    pub fn location(&self) -> String {
        format!("{},{}", self.latitude, self.longitude)
    }
}

impl PartialEq for GridPoint {
    fn eq(&self, other: &Self) -> bool {
        self.latitude.to_bits() == other.latitude.to_bits()
            && self.longitude.to_bits() == other.longitude.to_bits()
    }
}

impl Eq for GridPoint {}

impl Hash for GridPoint {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.latitude.to_bits().hash(state);
        self.longitude.to_bits().hash(state);
    }
}

// Row-major: latitude first, then longitude
impl Ord for GridPoint {
    fn cmp(&self, other: &Self) -> Ordering {
        self.latitude
            .total_cmp(&other.latitude)
            .then_with(|| self.longitude.total_cmp(&other.longitude))
    }
}

impl PartialOrd for GridPoint {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl From<[f64; 2]> for GridPoint {
    fn from(pair: [f64; 2]) -> Self {
        Self::new(pair[0], pair[1])
    }
}

impl From<GridPoint> for [f64; 2] {
    fn from(point: GridPoint) -> Self {
        [point.latitude, point.longitude]
    }
}

impl fmt::Display for GridPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}, {:.6})", self.latitude, self.longitude)
    }
}

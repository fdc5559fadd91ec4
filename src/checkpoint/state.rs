//! In-memory crawl progress

use crate::grid::GridPoint;
use std::collections::HashSet;

/// Progress of the current logical crawl
///
/// `batch_offset` is the index into the grid sequence where the next batch
/// starts. It only moves forward once every point of the batch it covers has
/// been attempted successfully. `processed_points` only ever grows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CheckpointState {
    pub batch_offset: usize,
    processed_points: HashSet<GridPoint>,
}

impl CheckpointState {
    /// Creates an empty state (offset 0, nothing processed)
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a state from persisted parts
    pub fn from_parts(batch_offset: usize, points: impl IntoIterator<Item = GridPoint>) -> Self {
        Self {
            batch_offset,
            processed_points: points.into_iter().collect(),
        }
    }

    /// Returns true if the point was confirmed processed in this run
    pub fn is_processed(&self, point: &GridPoint) -> bool {
        self.processed_points.contains(point)
    }

    /// Records a point as processed
    ///
    /// Returns true if the point was not already recorded.
    pub fn mark_processed(&mut self, point: GridPoint) -> bool {
        self.processed_points.insert(point)
    }

    /// Number of processed points
    pub fn processed_count(&self) -> usize {
        self.processed_points.len()
    }

    /// Processed points in row-major order, for stable serialization
    pub fn sorted_points(&self) -> Vec<GridPoint> {
        let mut points: Vec<GridPoint> = self.processed_points.iter().copied().collect();
        points.sort();
        points
    }
}

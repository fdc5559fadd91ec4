//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::places::PlaceRecord;
use crate::storage::{RunRecord, RunStatus};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("Storage lock poisoned")]
    LockPoisoned,

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// Covers the three durable stores the crawler needs: the place catalog,
/// the search ledger, and the crawl run history. Writes are single-row
/// upserts keyed by unique identifiers, so concurrent point pipelines never
/// need to coordinate beyond the backend's own row-level guarantees.
pub trait Storage {
    // ===== Run Management =====

    /// Creates a new crawl run
    ///
    /// # Arguments
    ///
    /// * `config_hash` - Hash of the configuration file
    /// * `points_total` - Number of points in the grid being crawled
    ///
    /// # Returns
    ///
    /// The ID of the newly created run
    fn create_run(&mut self, config_hash: &str, points_total: usize) -> StorageResult<i64>;

    /// Gets a run by ID
    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    /// Gets the most recent run
    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>>;

    /// Updates the status of a run, stamping the finish time for terminal statuses
    fn update_run_status(&mut self, run_id: i64, status: RunStatus) -> StorageResult<()>;

    /// Marks a run as completed with a finish timestamp
    fn complete_run(&mut self, run_id: i64) -> StorageResult<()> {
        self.update_run_status(run_id, RunStatus::Completed)
    }

    // ===== Catalog =====

    /// Inserts a place or overwrites every field of the existing row with the same id
    fn upsert_place(&mut self, place: &PlaceRecord) -> StorageResult<()>;

    /// Gets a place by provider id
    fn get_place(&self, place_id: &str) -> StorageResult<Option<PlaceRecord>>;

    /// Counts catalog entries
    fn count_places(&self) -> StorageResult<u64>;

    /// Gets the most common categories with their place counts, largest first
    fn get_category_breakdown(&self, limit: usize) -> StorageResult<Vec<(String, u64)>>;

    /// Average rating across rated places
    fn get_average_rating(&self) -> StorageResult<Option<f64>>;

    // ===== Search Ledger =====

    /// Records that the full pagination chain for (point, radius) was exhausted
    fn mark_searched(&mut self, latitude: f64, longitude: f64, radius: u32)
        -> StorageResult<()>;

    /// Checks whether (point, radius) has been fully searched in any run
    fn is_searched(&self, latitude: f64, longitude: f64, radius: u32) -> StorageResult<bool>;

    /// Counts ledger entries for a radius
    fn count_searched(&self, radius: u32) -> StorageResult<u64>;
}

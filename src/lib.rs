//! Plan-Ville: a resumable grid crawler for place-search providers
//!
//! This crate enumerates a lattice of search points over a circular area,
//! queries a nearby-search provider at each point (following pagination),
//! and stores the places it finds in a local SQLite catalog. Progress is
//! checkpointed after every batch so an interrupted crawl resumes where it
//! stopped without re-querying points that were already searched.

pub mod checkpoint;
pub mod config;
pub mod crawler;
pub mod grid;
pub mod output;
pub mod places;
pub mod storage;

use thiserror::Error;

/// Main error type for Plan-Ville operations
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Provider error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Checkpoint error: {0}")]
    Checkpoint(#[from] checkpoint::CheckpointError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Batch at offset {offset} failed ({failed} point(s)): {first_error}")]
    BatchFailed {
        offset: usize,
        failed: usize,
        first_error: Box<ScanError>,
    },
}

impl ScanError {
    /// Returns true if re-running the crawl may succeed without intervention
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Fetch(_) => true,
            Self::BatchFailed { first_error, .. } => first_error.is_retryable(),
            _ => false,
        }
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid endpoint URL in config: {0}")]
    InvalidUrl(String),

    #[error("Environment variable {0} is not set")]
    MissingCredential(String),
}

/// Errors raised while talking to the place-search provider
///
/// Every variant is point-scoped and retryable: the point is left unsearched
/// and will be queried again on the next run.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request for {location} failed: {source}")]
    Transport {
        location: String,
        source: reqwest::Error,
    },

    #[error("Provider returned HTTP {status} for {location}")]
    Status { location: String, status: u16 },

    #[error("Undecodable response for {location}: {source}")]
    Decode {
        location: String,
        source: reqwest::Error,
    },
}

/// Result type alias for Plan-Ville operations
pub type Result<T> = std::result::Result<T, ScanError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use checkpoint::{CheckpointState, CheckpointStore};
pub use config::Config;
pub use crawler::{Coordinator, PlaceFetcher, RateLimiter};
pub use grid::{generate_grid, GridPoint};
pub use places::PlaceRecord;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_failure_retryable_when_cause_is_fetch() {
        let err = ScanError::BatchFailed {
            offset: 50,
            failed: 1,
            first_error: Box::new(ScanError::Fetch(FetchError::Status {
                location: "1,2".to_string(),
                status: 503,
            })),
        };
        assert!(err.is_retryable());
    }

    #[test]
    fn test_storage_failure_not_retryable() {
        let err = ScanError::Storage(storage::StorageError::LockPoisoned);
        assert!(!err.is_retryable());
    }
}

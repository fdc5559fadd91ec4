//! File-backed checkpoint persistence
//!
//! The checkpoint is a single JSON document that is replaced wholesale on
//! every save. Writes go to a temporary file in the same directory which is
//! then renamed over the target, so a crash mid-write leaves the previous
//! checkpoint intact.

use crate::checkpoint::state::CheckpointState;
use crate::grid::GridPoint;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;

/// Errors that can occur while persisting a checkpoint
#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Failed to replace checkpoint file: {0}")]
    Persist(#[from] tempfile::PersistError),
}

/// On-disk checkpoint layout
#[derive(Debug, Serialize, Deserialize)]
struct CheckpointFile {
    batch_offset: usize,
    processed_points: Vec<GridPoint>,
    timestamp: DateTime<Utc>,
}

/// Loads and saves [`CheckpointState`] at a fixed path
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    path: PathBuf,
}

impl CheckpointStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the checkpoint, falling back to a fresh state
    ///
    /// A missing file is the normal first-run case. An unreadable or
    /// malformed file is logged and treated as a fresh start; it never
    /// aborts the crawl.
    pub fn load(&self) -> CheckpointState {
        match self.try_load() {
            Ok(Some(state)) => {
                tracing::info!(
                    "Loaded checkpoint from {}: offset {}, {} processed point(s)",
                    self.path.display(),
                    state.batch_offset,
                    state.processed_count()
                );
                state
            }
            Ok(None) => {
                tracing::info!("No checkpoint at {}, starting fresh", self.path.display());
                CheckpointState::new()
            }
            Err(e) => {
                tracing::warn!(
                    "Ignoring unreadable checkpoint {}: {}",
                    self.path.display(),
                    e
                );
                CheckpointState::new()
            }
        }
    }

    /// Loads the checkpoint, reporting why it could not be read
    ///
    /// Returns `Ok(None)` if no checkpoint file exists.
    pub fn try_load(&self) -> Result<Option<CheckpointState>, CheckpointError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let file: CheckpointFile = serde_json::from_str(&content)?;
        Ok(Some(CheckpointState::from_parts(
            file.batch_offset,
            file.processed_points,
        )))
    }

    /// Atomically replaces the checkpoint with `state`
    pub fn save(&self, state: &CheckpointState) -> Result<(), CheckpointError> {
        let file = CheckpointFile {
            batch_offset: state.batch_offset,
            processed_points: state.sorted_points(),
            timestamp: Utc::now(),
        };
        let json = serde_json::to_vec(&file)?;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(&json)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path)?;

        tracing::debug!(
            "Saved checkpoint: offset {}, {} processed point(s)",
            state.batch_offset,
            state.processed_count()
        );
        Ok(())
    }
}

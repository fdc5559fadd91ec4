//! Checkpoint module for resumable crawls
//!
//! This module tracks how far a crawl has progressed through the grid:
//!
//! - `CheckpointState`: the batch offset to resume from and the set of points
//!   confirmed processed in this logical run
//! - `CheckpointStore`: atomic JSON persistence of that state

mod state;
mod store;

pub use state::CheckpointState;
pub use store::{CheckpointError, CheckpointStore};

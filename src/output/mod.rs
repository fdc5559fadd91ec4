//! Output module for reporting crawl progress and results
//!
//! This module handles:
//! - Pre-flight estimates of remaining points, provider calls and cost
//! - Catalog and run statistics for `--stats`

mod estimate;
pub mod stats;

pub use estimate::{estimate, print_grid_info, GridInfo};
pub use stats::{load_statistics, print_statistics, CrawlStatistics};

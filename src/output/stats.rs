//! Statistics generation from the catalog database
//!
//! This module provides functionality for extracting and displaying
//! catalog, ledger and run statistics from the storage layer.

use crate::storage::{RunRecord, Storage};
use crate::ScanError;
use chrono::{DateTime, Utc};

/// Number of categories listed in the breakdown
pub const TOP_CATEGORIES: usize = 10;

/// Catalog statistics summary
#[derive(Debug, Clone)]
pub struct CrawlStatistics {
    /// Distinct places in the catalog
    pub total_places: u64,

    /// Ledger entries at the queried radius
    pub searched_points: u64,

    /// Most common categories, largest first
    pub categories: Vec<(String, u64)>,

    /// Mean rating over places that have one
    pub average_rating: Option<f64>,

    /// The most recent crawl run, if any
    pub latest_run: Option<RunRecord>,
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `storage` - The storage backend to query
/// * `radius` - Search radius the ledger count is taken at
///
/// # Returns
///
/// * `Ok(CrawlStatistics)` - Successfully loaded statistics
/// * `Err(ScanError)` - Failed to query statistics
pub fn load_statistics(storage: &dyn Storage, radius: u32) -> Result<CrawlStatistics, ScanError> {
    Ok(CrawlStatistics {
        total_places: storage.count_places()?,
        searched_points: storage.count_searched(radius)?,
        categories: storage.get_category_breakdown(TOP_CATEGORIES)?,
        average_rating: storage.get_average_rating()?,
        latest_run: storage.get_latest_run()?,
    })
}

/// Wall-clock duration of a finished run, in seconds
pub fn run_duration_seconds(run: &RunRecord) -> Option<i64> {
    let started = run.started_at.parse::<DateTime<Utc>>().ok()?;
    let finished = run.finished_at.as_ref()?.parse::<DateTime<Utc>>().ok()?;
    Some((finished - started).num_seconds())
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Catalog Statistics ===\n");

    println!("Overview:");
    println!("  Places in catalog: {}", stats.total_places);
    println!("  Points searched: {}", stats.searched_points);
    match stats.average_rating {
        Some(rating) => println!("  Average rating: {:.2}", rating),
        None => println!("  Average rating: n/a"),
    }
    println!();

    if !stats.categories.is_empty() {
        println!("Top Categories:");
        for (category, count) in &stats.categories {
            let percentage = if stats.total_places > 0 {
                (*count as f64 / stats.total_places as f64) * 100.0
            } else {
                0.0
            };
            println!("  {}: {} ({:.1}%)", category, count, percentage);
        }
        println!();
    }

    match &stats.latest_run {
        Some(run) => {
            println!("Latest Run:");
            println!("  Id: {}", run.id);
            println!("  Status: {}", run.status.to_db_string());
            println!("  Started: {}", run.started_at);
            if let Some(finished) = &run.finished_at {
                println!("  Finished: {}", finished);
            }
            if let Some(seconds) = run_duration_seconds(run) {
                println!("  Duration: {}s", seconds);
            }
            println!("  Grid points: {}", run.points_total);
        }
        None => println!("No crawl runs recorded"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::places::PlaceRecord;
    use crate::storage::{RunStatus, SqliteStorage};

    fn place(id: &str, category: &str, rating: Option<f64>) -> PlaceRecord {
        PlaceRecord {
            id: id.to_string(),
            name: format!("Place {}", id),
            address: "unknown".to_string(),
            latitude: None,
            longitude: None,
            category: category.to_string(),
            rating,
            rating_count: None,
        }
    }

    #[test]
    fn test_empty_database() {
        let storage = SqliteStorage::new_in_memory().unwrap();
        let stats = load_statistics(&storage, 100).unwrap();

        assert_eq!(stats.total_places, 0);
        assert_eq!(stats.searched_points, 0);
        assert!(stats.categories.is_empty());
        assert!(stats.average_rating.is_none());
        assert!(stats.latest_run.is_none());
    }

    #[test]
    fn test_statistics_reflect_catalog() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        storage.upsert_place(&place("a", "cafe", Some(4.0))).unwrap();
        storage.upsert_place(&place("b", "cafe", Some(5.0))).unwrap();
        storage.upsert_place(&place("c", "bar", None)).unwrap();
        storage.mark_searched(1.0, 2.0, 100).unwrap();
        storage.mark_searched(1.0, 2.0, 250).unwrap();
        let run_id = storage.create_run("hash", 12).unwrap();
        storage.complete_run(run_id).unwrap();

        let stats = load_statistics(&storage, 100).unwrap();

        assert_eq!(stats.total_places, 3);
        assert_eq!(stats.searched_points, 1);
        assert_eq!(stats.categories[0], ("cafe".to_string(), 2));
        assert!((stats.average_rating.unwrap() - 4.5).abs() < 1e-9);

        let run = stats.latest_run.unwrap();
        assert_eq!(run.status, RunStatus::Completed);
        assert!(run_duration_seconds(&run).is_some());
    }

    #[test]
    fn test_unfinished_run_has_no_duration() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let run_id = storage.create_run("hash", 1).unwrap();

        let run = storage.get_run(run_id).unwrap();
        assert_eq!(run_duration_seconds(&run), None);
    }
}

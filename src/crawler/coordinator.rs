//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the batch loop that drives a crawl over the grid:
//! - Opening the catalog/ledger database and loading the checkpoint
//! - Skipping points already processed (checkpoint first, then ledger)
//! - Searching the remaining points of each batch concurrently
//! - Persisting the checkpoint after every batch, successful or not
//! - Recording the run in the run history

use crate::checkpoint::{CheckpointState, CheckpointStore};
use crate::config::Config;
use crate::crawler::{build_http_client, PlaceFetcher, RateLimiter};
use crate::grid::{generate_grid, GridPoint};
use crate::output::{estimate, GridInfo};
use crate::storage::{RunStatus, SqliteStorage, Storage, StorageError};
use crate::{Result, ScanError};
use futures::future::join_all;
use futures::TryStreamExt;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// Why a point needed no provider call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Already in the checkpoint's processed set
    Checkpoint,
    /// Found in the search ledger from an earlier run
    Ledger,
}

/// Totals for one invocation of [`Coordinator::run`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlReport {
    pub run_id: i64,
    pub points_total: usize,
    pub points_searched: usize,
    pub points_skipped: usize,
    pub places_stored: usize,
    pub batches: usize,
}

/// Outcome of a single batch
#[derive(Debug, Default)]
struct BatchOutcome {
    searched: usize,
    skipped: usize,
    places: usize,
    failures: Vec<(GridPoint, ScanError)>,
}

/// Main crawler coordinator structure
pub struct Coordinator {
    config: Arc<Config>,
    storage: Arc<Mutex<SqliteStorage>>,
    checkpoints: CheckpointStore,
    state: CheckpointState,
    fetcher: PlaceFetcher,
    grid: Vec<GridPoint>,
    config_hash: String,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `config` - The crawl configuration
    /// * `api_key` - Provider credential
    /// * `fresh` - Ignore the checkpoint and start at offset 0 (the search
    ///   ledger is still honoured). The file on disk is only replaced by the
    ///   first checkpoint saved during [`Coordinator::run`].
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(ScanError)` - Failed to open the database or build the client
    pub fn new(config: Config, api_key: impl Into<String>, fresh: bool) -> Result<Self> {
        let storage = SqliteStorage::new(Path::new(&config.output.database_path))?;
        let checkpoints = CheckpointStore::new(&config.output.checkpoint_path);

        let state = if fresh {
            tracing::info!("Ignoring checkpoint at {}", checkpoints.path().display());
            CheckpointState::new()
        } else {
            checkpoints.load()
        };

        let grid = generate_grid(
            config.area.center_lat,
            config.area.center_lng,
            config.area.radius_km,
            config.grid.spacing_meters,
        );

        if state.batch_offset > grid.len() {
            tracing::warn!(
                "Checkpoint offset {} is past the end of the grid ({} points)",
                state.batch_offset,
                grid.len()
            );
        }

        let client = build_http_client(config.search.request_timeout_secs)?;
        let limiter = Arc::new(RateLimiter::new(config.search.calls_per_minute));
        let fetcher = PlaceFetcher::new(client, &config.search, api_key, limiter);

        Ok(Self {
            config: Arc::new(config),
            storage: Arc::new(Mutex::new(storage)),
            checkpoints,
            state,
            fetcher,
            grid,
            config_hash: String::from("unspecified"),
        })
    }

    /// Sets the config hash recorded with each run
    pub fn with_config_hash(mut self, hash: impl Into<String>) -> Self {
        self.config_hash = hash.into();
        self
    }

    pub fn grid(&self) -> &[GridPoint] {
        &self.grid
    }

    /// Current in-memory checkpoint state
    pub fn checkpoint(&self) -> &CheckpointState {
        &self.state
    }

    /// Estimates the remaining work
    ///
    /// A point counts as processed when it is in the checkpoint set or the
    /// ledger holds it at the configured radius.
    pub fn grid_info(&self) -> Result<GridInfo> {
        let radius = self.config.search.radius_meters;
        let storage = self.lock_storage()?;

        let mut processed = 0;
        for point in &self.grid {
            if self.state.is_processed(point)
                || storage.is_searched(point.latitude, point.longitude, radius)?
            {
                processed += 1;
            }
        }

        Ok(estimate(self.grid.len(), processed, &self.config.cost))
    }

    /// Runs the batch loop from the checkpoint offset to the end of the grid
    ///
    /// Batches run strictly in sequence. A batch in which any point fails
    /// stops the run: the checkpoint is saved with the batch offset unchanged
    /// (but including the points that did succeed) and
    /// [`ScanError::BatchFailed`] is returned.
    pub async fn run(&mut self) -> Result<CrawlReport> {
        let total = self.grid.len();
        let batch_size = self.config.search.batch_size.max(1);
        let pause = Duration::from_millis(self.config.search.batch_pause_ms);

        let run_id = self.lock_storage()?.create_run(&self.config_hash, total)?;
        tracing::info!(
            "Starting crawl run {}: {} points, resuming at offset {} ({} already processed)",
            run_id,
            total,
            self.state.batch_offset,
            self.state.processed_count()
        );

        let mut report = CrawlReport {
            run_id,
            points_total: total,
            ..CrawlReport::default()
        };

        let mut offset = self.state.batch_offset;
        while offset < total {
            let batch = self.run_batch(offset, batch_size).await;
            report.batches += 1;
            report.points_searched += batch.searched;
            report.points_skipped += batch.skipped;
            report.places_stored += batch.places;

            let failed = batch.failures.len();
            if let Some((_, first_error)) = batch.failures.into_iter().next() {
                return Err(self.fail_batch(run_id, offset, failed, first_error));
            }

            offset += batch_size;
            self.state.batch_offset = offset;
            self.save_checkpoint();

            let done = offset.min(total);
            tracing::info!(
                "Progress: {}/{} points ({:.1}%), {} places stored this run",
                done,
                total,
                done as f64 / total as f64 * 100.0,
                report.places_stored
            );

            if offset < total && !pause.is_zero() {
                tokio::time::sleep(pause).await;
            }
        }

        self.lock_storage()?.complete_run(run_id)?;
        tracing::info!(
            "Crawl run {} completed: {} points searched, {} skipped, {} places stored",
            run_id,
            report.points_searched,
            report.points_skipped,
            report.places_stored
        );

        Ok(report)
    }

    /// Processes the points in `[offset, offset + batch_size)`
    async fn run_batch(&mut self, offset: usize, batch_size: usize) -> BatchOutcome {
        let end = (offset + batch_size).min(self.grid.len());
        let mut outcome = BatchOutcome::default();
        let mut pending = Vec::new();

        for index in offset..end {
            let point = self.grid[index];
            match self.skip_reason(&point) {
                Some(SkipReason::Checkpoint) => {
                    outcome.skipped += 1;
                }
                Some(SkipReason::Ledger) => {
                    tracing::debug!("{} already searched in an earlier run", point);
                    self.state.mark_processed(point);
                    outcome.skipped += 1;
                }
                None => pending.push(point),
            }
        }

        tracing::debug!(
            "Batch at offset {}: {} to search, {} skipped",
            offset,
            pending.len(),
            outcome.skipped
        );

        let results = join_all(pending.iter().map(|&point| self.search_point(point))).await;

        for (point, result) in pending.into_iter().zip(results) {
            match result {
                Ok(places) => {
                    tracing::debug!("{} done: {} places", point, places);
                    self.state.mark_processed(point);
                    outcome.searched += 1;
                    outcome.places += places;
                }
                Err(e) => {
                    tracing::warn!("{} failed: {}", point, e);
                    outcome.failures.push((point, e));
                }
            }
        }

        outcome
    }

    /// Returns why `point` needs no search, if it doesn't
    fn skip_reason(&self, point: &GridPoint) -> Option<SkipReason> {
        if self.state.is_processed(point) {
            return Some(SkipReason::Checkpoint);
        }

        let radius = self.config.search.radius_meters;
        let searched = self
            .lock_storage()
            .and_then(|storage| storage.is_searched(point.latitude, point.longitude, radius));

        match searched {
            Ok(true) => Some(SkipReason::Ledger),
            Ok(false) => None,
            Err(e) => {
                tracing::warn!("Ledger lookup failed for {}, searching it: {}", point, e);
                None
            }
        }
    }

    /// Fetches every page for `point`, storing each page before the next
    /// request, then records the point in the ledger
    ///
    /// Returns the number of places stored.
    async fn search_point(&self, point: GridPoint) -> Result<usize> {
        let radius = self.config.search.radius_meters;
        let pages = self.fetcher.fetch(point, radius);
        futures::pin_mut!(pages);

        let mut stored = 0;
        while let Some(page) = pages.try_next().await? {
            let mut storage = self.lock_storage()?;
            for place in &page {
                match storage.upsert_place(place) {
                    Ok(()) => stored += 1,
                    Err(e) => tracing::warn!("Skipping place {}: {}", place.id, e),
                }
            }
        }

        self.lock_storage()?
            .mark_searched(point.latitude, point.longitude, radius)?;

        Ok(stored)
    }

    /// Persists partial progress and builds the error for a failed batch
    fn fail_batch(
        &mut self,
        run_id: i64,
        offset: usize,
        failed: usize,
        first_error: ScanError,
    ) -> ScanError {
        self.state.batch_offset = offset;
        self.save_checkpoint();

        let marked = self
            .lock_storage()
            .and_then(|mut storage| storage.update_run_status(run_id, RunStatus::Failed));
        if let Err(e) = marked {
            tracing::warn!("Failed to mark run {} as failed: {}", run_id, e);
        }

        tracing::error!(
            "Batch at offset {} failed for {} point(s); {} points processed so far",
            offset,
            failed,
            self.state.processed_count()
        );

        ScanError::BatchFailed {
            offset,
            failed,
            first_error: Box::new(first_error),
        }
    }

    /// Writes the checkpoint, logging rather than propagating failures
    fn save_checkpoint(&self) {
        if let Err(e) = self.checkpoints.save(&self.state) {
            tracing::warn!(
                "Failed to save checkpoint to {}: {}",
                self.checkpoints.path().display(),
                e
            );
        }
    }

    fn lock_storage(&self) -> std::result::Result<MutexGuard<'_, SqliteStorage>, StorageError> {
        self.storage.lock().map_err(|_| StorageError::LockPoisoned)
    }
}

/// Runs a complete crawl from the saved checkpoint
///
/// # Example
///
/// ```no_run
/// use plan_ville::config::{load_api_key, load_config};
/// use plan_ville::crawler::run_crawl;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("config.toml"))?;
/// let key = load_api_key(&config.search.api_key_env)?;
/// run_crawl(config, key).await?;
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(config: Config, api_key: String) -> Result<CrawlReport> {
    let mut coordinator = Coordinator::new(config, api_key, false)?;
    coordinator.run().await
}

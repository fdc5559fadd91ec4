//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::places::PlaceRecord;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{RunRecord, RunStatus};
use crate::ScanError;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(ScanError)` - Failed to open database
    pub fn new(path: &Path) -> Result<Self, ScanError> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> Result<Self, ScanError> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

fn run_from_row(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
    Ok(RunRecord {
        id: row.get(0)?,
        started_at: row.get(1)?,
        finished_at: row.get(2)?,
        config_hash: row.get(3)?,
        status: RunStatus::from_db_string(&row.get::<_, String>(4)?)
            .unwrap_or(RunStatus::Failed),
        points_total: row.get::<_, i64>(5)? as usize,
    })
}

fn place_from_row(row: &Row<'_>) -> rusqlite::Result<PlaceRecord> {
    Ok(PlaceRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        address: row.get(2)?,
        latitude: row.get(3)?,
        longitude: row.get(4)?,
        category: row.get(5)?,
        rating: row.get(6)?,
        rating_count: row.get(7)?,
    })
}

impl Storage for SqliteStorage {
    // ===== Run Management =====

    fn create_run(&mut self, config_hash: &str, points_total: usize) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (started_at, config_hash, status, points_total) VALUES (?1, ?2, ?3, ?4)",
            params![
                now,
                config_hash,
                RunStatus::Running.to_db_string(),
                points_total as i64
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        self.conn
            .query_row(
                "SELECT id, started_at, finished_at, config_hash, status, points_total
                 FROM runs WHERE id = ?1",
                params![run_id],
                run_from_row,
            )
            .optional()?
            .ok_or(StorageError::RunNotFound(run_id))
    }

    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>> {
        let run = self
            .conn
            .query_row(
                "SELECT id, started_at, finished_at, config_hash, status, points_total
                 FROM runs ORDER BY id DESC LIMIT 1",
                [],
                run_from_row,
            )
            .optional()?;
        Ok(run)
    }

    fn update_run_status(&mut self, run_id: i64, status: RunStatus) -> StorageResult<()> {
        let finished_at = match status {
            RunStatus::Running => None,
            RunStatus::Completed | RunStatus::Failed => Some(Utc::now().to_rfc3339()),
        };

        let updated = self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2 WHERE id = ?3",
            params![status.to_db_string(), finished_at, run_id],
        )?;

        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }

    // ===== Catalog =====

    fn upsert_place(&mut self, place: &PlaceRecord) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO places
             (place_id, name, address, latitude, longitude, category, rating, rating_count, last_updated)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             ON CONFLICT(place_id) DO UPDATE SET
                name = excluded.name,
                address = excluded.address,
                latitude = excluded.latitude,
                longitude = excluded.longitude,
                category = excluded.category,
                rating = excluded.rating,
                rating_count = excluded.rating_count,
                last_updated = excluded.last_updated",
            params![
                place.id,
                place.name,
                place.address,
                place.latitude,
                place.longitude,
                place.category,
                place.rating,
                place.rating_count,
                now
            ],
        )?;
        Ok(())
    }

    fn get_place(&self, place_id: &str) -> StorageResult<Option<PlaceRecord>> {
        let place = self
            .conn
            .query_row(
                "SELECT place_id, name, address, latitude, longitude, category, rating, rating_count
                 FROM places WHERE place_id = ?1",
                params![place_id],
                place_from_row,
            )
            .optional()?;
        Ok(place)
    }

    fn count_places(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM places", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn get_category_breakdown(&self, limit: usize) -> StorageResult<Vec<(String, u64)>> {
        let mut stmt = self.conn.prepare(
            "SELECT category, COUNT(*) AS n FROM places
             GROUP BY category ORDER BY n DESC, category ASC LIMIT ?1",
        )?;

        let rows = stmt
            .query_map(params![limit as i64], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as u64))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    fn get_average_rating(&self) -> StorageResult<Option<f64>> {
        let avg: Option<f64> = self.conn.query_row(
            "SELECT AVG(rating) FROM places WHERE rating IS NOT NULL",
            [],
            |row| row.get(0),
        )?;
        Ok(avg)
    }

    // ===== Search Ledger =====

    fn mark_searched(
        &mut self,
        latitude: f64,
        longitude: f64,
        radius: u32,
    ) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO search_points (latitude, longitude, radius, searched_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(latitude, longitude, radius) DO UPDATE SET searched_at = excluded.searched_at",
            params![latitude, longitude, radius, now],
        )?;
        Ok(())
    }

    fn is_searched(&self, latitude: f64, longitude: f64, radius: u32) -> StorageResult<bool> {
        let found: Option<i64> = self
            .conn
            .query_row(
                "SELECT 1 FROM search_points WHERE latitude = ?1 AND longitude = ?2 AND radius = ?3",
                params![latitude, longitude, radius],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn count_searched(&self, radius: u32) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM search_points WHERE radius = ?1",
            params![radius],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}

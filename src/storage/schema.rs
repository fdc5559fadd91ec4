//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the Plan-Ville database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Track crawl runs
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    config_hash TEXT NOT NULL,
    status TEXT NOT NULL,
    points_total INTEGER NOT NULL DEFAULT 0
);

-- Place catalog, keyed by provider id
CREATE TABLE IF NOT EXISTS places (
    place_id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    address TEXT NOT NULL,
    latitude REAL,
    longitude REAL,
    category TEXT NOT NULL,
    rating REAL,
    rating_count INTEGER,
    last_updated TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_places_category ON places(category);

-- Search ledger: grid points whose pagination chain was fully exhausted
CREATE TABLE IF NOT EXISTS search_points (
    latitude REAL NOT NULL,
    longitude REAL NOT NULL,
    radius INTEGER NOT NULL,
    searched_at TEXT NOT NULL,
    PRIMARY KEY (latitude, longitude, radius)
);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}

//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the SQLite registry store.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- One row per registered link
CREATE TABLE IF NOT EXISTS links (
    url TEXT PRIMARY KEY,
    category TEXT NOT NULL,
    priority TEXT NOT NULL,
    last_visited TEXT,
    visit_count INTEGER NOT NULL DEFAULT 0,
    success_count INTEGER NOT NULL DEFAULT 0,
    failure_count INTEGER NOT NULL DEFAULT 0,
    avg_load_time REAL NOT NULL DEFAULT 0,
    status TEXT NOT NULL,
    notes TEXT NOT NULL DEFAULT '',
    added_date TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_links_category ON links(category);
CREATE INDEX IF NOT EXISTS idx_links_status ON links(status);

-- Category cadence and pacing policies
CREATE TABLE IF NOT EXISTS categories (
    name TEXT PRIMARY KEY,
    priority TEXT NOT NULL,
    visit_frequency TEXT NOT NULL,
    delay_min REAL NOT NULL,
    delay_max REAL NOT NULL,
    human_simulation INTEGER NOT NULL DEFAULT 1
);

-- Single row written on every save
CREATE TABLE IF NOT EXISTS metadata (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    last_updated TEXT NOT NULL,
    total_links INTEGER NOT NULL,
    active_links INTEGER NOT NULL,
    config_hash TEXT
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

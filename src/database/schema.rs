/*!
 * Journal schema and migrations.
 */

use anyhow::{Context, Result};
use log::{debug, info};
use rusqlite::Connection;

/// Current schema version
pub const SCHEMA_VERSION: i32 = 1;

/// Create or migrate the schema
pub fn initialize_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch("PRAGMA foreign_keys=ON;")?;

    let current_version = get_schema_version(conn)?;

    if current_version == 0 {
        info!("Initializing journal schema v{}", SCHEMA_VERSION);
        create_all_tables(conn)?;
        set_schema_version(conn, SCHEMA_VERSION)?;
    } else if current_version < SCHEMA_VERSION {
        info!(
            "Migrating journal schema from v{} to v{}",
            current_version, SCHEMA_VERSION
        );
        migrate_schema(conn, current_version)?;
    } else {
        debug!("Journal schema is up to date (v{})", current_version);
    }

    Ok(())
}

fn get_schema_version(conn: &Connection) -> Result<i32> {
    let table_exists: bool = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='schema_version'",
            [],
            |row| row.get(0),
        )
        .context("Failed to check schema_version table existence")?;

    if !table_exists {
        return Ok(0);
    }

    let version: i32 = conn
        .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| row.get(0))
        .unwrap_or(0);

    Ok(version)
}

fn set_schema_version(conn: &Connection, version: i32) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO schema_version (id, version, updated_at) VALUES (1, ?1, datetime('now'))",
        [version],
    )?;
    Ok(())
}

fn create_all_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch("PRAGMA journal_mode=WAL;")?;

    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            version INTEGER NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS runs (
            id TEXT PRIMARY KEY,
            document TEXT NOT NULL,
            provider TEXT NOT NULL,
            model TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'running',
            sheet_count INTEGER NOT NULL DEFAULT 0,
            work_items INTEGER NOT NULL DEFAULT 0,
            cells_written INTEGER NOT NULL DEFAULT 0,
            failed_items INTEGER NOT NULL DEFAULT 0,
            unresolved_translations INTEGER NOT NULL DEFAULT 0,
            started_at TEXT NOT NULL,
            finished_at TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_runs_started ON runs(started_at);

        CREATE TABLE IF NOT EXISTS unresolved_items (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            run_id TEXT NOT NULL REFERENCES runs(id) ON DELETE CASCADE,
            sheet TEXT NOT NULL,
            key TEXT NOT NULL,
            language_code TEXT,
            row_index INTEGER NOT NULL,
            kind TEXT NOT NULL,
            reason TEXT NOT NULL,
            source_fingerprint TEXT NOT NULL,
            created_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_unresolved_run ON unresolved_items(run_id);
        "#,
    )?;

    info!("Journal schema created successfully");
    Ok(())
}

fn migrate_schema(conn: &Connection, from_version: i32) -> Result<()> {
    let current = from_version;

    if current < SCHEMA_VERSION {
        return Err(anyhow::anyhow!(
            "Unknown journal schema version: {}. Cannot migrate.",
            current
        ));
    }

    set_schema_version(conn, SCHEMA_VERSION)?;
    info!("Journal schema migration completed to v{}", SCHEMA_VERSION);
    Ok(())
}

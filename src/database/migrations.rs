//! Versioned schema for the local bookmark database.
//!
//! Applied versions are recorded in `schema_version`; each step runs once.

use rusqlite::{params, Connection};

/// Latest schema version known to this build.
pub const CURRENT_SCHEMA_VERSION: i32 = 1;

struct Migration {
    version: i32,
    description: &'static str,
    sql: &'static str,
}

/// V1 indexes `created_at` for newest-first snapshots and `user_id` for owner lookups.
const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    description: "bookmarks table",
    sql: "
        CREATE TABLE IF NOT EXISTS bookmarks (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            url TEXT NOT NULL,
            created_at TEXT NOT NULL,
            user_id TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_bookmarks_created_at ON bookmarks(created_at);
        CREATE INDEX IF NOT EXISTS idx_bookmarks_user_id ON bookmarks(user_id);
    ",
}];

/// Highest applied version, or 0 for a fresh database.
pub fn get_schema_version(conn: &Connection) -> i32 {
    conn.query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |row| {
        row.get(0)
    })
    .unwrap_or(0)
}

/// Applies every migration newer than the recorded version.
pub fn run_all(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
             version INTEGER PRIMARY KEY,
             applied_at TEXT NOT NULL,
             description TEXT NOT NULL
         );",
    )?;

    let current = get_schema_version(conn);
    for migration in MIGRATIONS.iter().filter(|m| m.version > current) {
        tracing::info!(
            version = migration.version,
            description = migration.description,
            "applying schema migration"
        );
        conn.execute_batch(migration.sql)?;
        conn.execute(
            "INSERT OR IGNORE INTO schema_version (version, applied_at, description)
             VALUES (?1, ?2, ?3)",
            params![migration.version, chrono::Utc::now().to_rfc3339(), migration.description],
        )?;
    }

    Ok(())
}

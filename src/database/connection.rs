//! SQLite connection handling for the local bookmark backend.

use std::fs;
use std::path::Path;
use std::time::Duration;

use rusqlite::Connection;

use super::migrations;

/// How long a statement waits on a locked database file before failing.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// A migrated SQLite connection.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Opens the database file at `path`, creating it and its parent directory
    /// when missing, and brings the schema up to date.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, rusqlite::Error> {
        let path = path.as_ref();
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|e| {
                tracing::error!(
                    dir = %dir.display(),
                    error = %e,
                    "cannot create database directory"
                );
                rusqlite::Error::InvalidPath(dir.to_path_buf())
            })?;
        }

        tracing::debug!(path = %path.display(), "opening database");
        let conn = Connection::open(path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        Self::migrated(conn)
    }

    /// Opens a private in-memory database. Its contents vanish on drop.
    pub fn open_in_memory() -> Result<Self, rusqlite::Error> {
        Self::migrated(Connection::open_in_memory()?)
    }

    fn migrated(conn: Connection) -> Result<Self, rusqlite::Error> {
        migrations::run_all(&conn)?;
        Ok(Self { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

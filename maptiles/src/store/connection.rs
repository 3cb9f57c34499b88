//! Explicit database connection with an acquire/release contract.
//!
//! A [`Database`] owns one SQLite connection. Components receive it (wrapped
//! in a store) instead of reaching for process-wide state; callers
//! [`acquire`](Database::acquire) the connection for the duration of one
//! operation and release it by dropping the guard.

use parking_lot::{Mutex, MutexGuard};
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

use super::StoreError;
use crate::config::StorageSettings;

/// Guard over the shared connection; the connection is released on drop.
pub type ConnectionGuard<'a> = MutexGuard<'a, Connection>;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS tasks (
  id             INTEGER PRIMARY KEY AUTOINCREMENT,
  owner          INTEGER NOT NULL,
  name           TEXT    NOT NULL,
  url_template   TEXT    NOT NULL,
  west           REAL    NOT NULL,
  north          REAL    NOT NULL,
  east           REAL    NOT NULL,
  south          REAL    NOT NULL,
  zoom_min       INTEGER NOT NULL,
  zoom_max       INTEGER NOT NULL,
  folder         TEXT    NOT NULL DEFAULT '',
  tile_count     INTEGER NOT NULL,
  progress       REAL    NOT NULL DEFAULT 0,
  status         TEXT    NOT NULL,
  pid            INTEGER,
  failure_reason TEXT,
  created_at_ms  INTEGER NOT NULL,
  updated_at_ms  INTEGER NOT NULL,
  worker_token   TEXT    NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_tasks_owner ON tasks(owner, id);
CREATE INDEX IF NOT EXISTS idx_tasks_status ON tasks(status);
"#;

/// An open, migrated task database.
#[derive(Debug)]
pub struct Database {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl Database {
    /// Opens (creating if needed) the database described by `settings`.
    ///
    /// Failed attempts are retried `connect_retries` times, sleeping
    /// `retry_backoff` between them. Writers wait up to `busy_timeout`
    /// on a database locked by another process.
    pub fn open(settings: &StorageSettings) -> Result<Self, StoreError> {
        if let Some(parent) = settings.database.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut attempt = 0u32;
        loop {
            match Self::open_once(&settings.database, settings.busy_timeout) {
                Ok(db) => return Ok(db),
                Err(e) if attempt < settings.connect_retries => {
                    attempt += 1;
                    warn!(
                        path = %settings.database.display(),
                        attempt,
                        max_retries = settings.connect_retries,
                        error = %e,
                        "Task database open failed, retrying"
                    );
                    std::thread::sleep(settings.retry_backoff);
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn open_once(path: &Path, busy_timeout: Duration) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(busy_timeout)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        let db = Self {
            conn: Mutex::new(conn),
            path: Some(path.to_path_buf()),
        };
        db.migrate()?;
        debug!(path = %path.display(), "Task database ready");
        Ok(db)
    }

    /// Opens a private in-memory database, mainly for tests.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let db = Self {
            conn: Mutex::new(Connection::open_in_memory()?),
            path: None,
        };
        db.migrate()?;
        Ok(db)
    }

    /// Acquires the connection for one operation.
    pub fn acquire(&self) -> ConnectionGuard<'_> {
        self.conn.lock()
    }

    /// Path of the database file, `None` for in-memory databases.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn migrate(&self) -> Result<(), StoreError> {
        self.acquire().execute_batch(SCHEMA)?;
        Ok(())
    }
}

//! Default values and constants for all configuration settings.
//!
//! Contains all `DEFAULT_*` constants and the `ConfigFile::default()`
//! implementation. Paths default to locations under `~/.maptiles`.

use std::path::PathBuf;
use std::time::Duration;

use super::file::config_directory;
use super::settings::*;

/// Default SQLite busy timeout (milliseconds).
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// Default extra attempts when opening the database.
pub const DEFAULT_CONNECT_RETRIES: u32 = 3;

/// Default pause between database open attempts (milliseconds).
pub const DEFAULT_RETRY_BACKOFF_MS: u64 = 200;

/// Default maximum active tasks across all users.
pub const DEFAULT_MAX_CONCURRENT_TASKS: usize = 8;

/// Default maximum active tasks per user.
pub const DEFAULT_MAX_TASKS_PER_USER: usize = 2;

/// Default worker program.
pub const DEFAULT_WORKER_PROGRAM: &str = "python3";

/// Default heartbeat staleness threshold (seconds).
pub const DEFAULT_STALE_AFTER_SECS: u64 = 600;

/// Default grace period before a never-started task is failed (seconds).
pub const DEFAULT_ORPHAN_GRACE_SECS: u64 = 60;

/// Default sweep interval (seconds).
pub const DEFAULT_RECONCILE_INTERVAL_SECS: u64 = 30;

/// Upper bound on `[storage] connect_retries`.
pub const MAX_CONNECT_RETRIES: u32 = 20;

/// Default database path (~/.maptiles/tasks.db).
pub fn default_database_path() -> PathBuf {
    config_directory().join("tasks.db")
}

/// Default task root folder (~/.maptiles/tasks).
pub fn default_root_folder() -> PathBuf {
    config_directory().join("tasks")
}

/// Default worker log directory (~/.maptiles/logs/tasks).
pub fn default_task_log_dir() -> PathBuf {
    config_directory().join("logs").join("tasks")
}

/// Default worker script (~/.maptiles/scripts/download_tiles.py).
pub fn default_worker_script() -> PathBuf {
    config_directory().join("scripts").join("download_tiles.py")
}

/// Default application log file (~/.maptiles/maptiles.log).
pub fn default_log_file() -> PathBuf {
    config_directory().join("maptiles.log")
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            storage: StorageSettings {
                database: default_database_path(),
                busy_timeout: Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS),
                connect_retries: DEFAULT_CONNECT_RETRIES,
                retry_backoff: Duration::from_millis(DEFAULT_RETRY_BACKOFF_MS),
            },
            tasks: TaskSettings {
                root_folder: default_root_folder(),
                log_dir: default_task_log_dir(),
                max_concurrent: DEFAULT_MAX_CONCURRENT_TASKS,
                max_per_user: DEFAULT_MAX_TASKS_PER_USER,
            },
            worker: WorkerSettings {
                program: PathBuf::from(DEFAULT_WORKER_PROGRAM),
                script: Some(default_worker_script()),
            },
            reconcile: ReconcileSettings {
                stale_after: Duration::from_secs(DEFAULT_STALE_AFTER_SECS),
                orphan_grace: Duration::from_secs(DEFAULT_ORPHAN_GRACE_SECS),
                interval: Duration::from_secs(DEFAULT_RECONCILE_INTERVAL_SECS),
            },
            logging: LoggingSettings {
                file: default_log_file(),
            },
        }
    }
}

//! Settings structs for all configuration sections.
//!
//! Each struct represents one `[section]` of the INI config file.
//! These are pure data types with no parsing or serialization logic.

use std::path::PathBuf;
use std::time::Duration;

/// Complete application configuration loaded from config.ini.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    /// Task database settings
    pub storage: StorageSettings,
    /// Task folders and admission limits
    pub tasks: TaskSettings,
    /// Download worker executable
    pub worker: WorkerSettings,
    /// Orphan and heartbeat sweep
    pub reconcile: ReconcileSettings,
    /// Logging settings
    pub logging: LoggingSettings,
}

/// Task database configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct StorageSettings {
    /// SQLite database file
    pub database: PathBuf,
    /// How long a writer waits on a locked database
    pub busy_timeout: Duration,
    /// Extra attempts when opening the database fails
    pub connect_retries: u32,
    /// Pause between open attempts
    pub retry_backoff: Duration,
}

/// Task folder layout and admission control.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskSettings {
    /// Root of `<user>/<task>` destination folders
    pub root_folder: PathBuf,
    /// Directory holding one `task-<id>.log` per worker
    pub log_dir: PathBuf,
    /// Maximum active tasks across all users
    pub max_concurrent: usize,
    /// Maximum active tasks per user
    pub max_per_user: usize,
}

/// Download worker invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkerSettings {
    /// Executable started for each task
    pub program: PathBuf,
    /// Optional script passed as the first argument (for interpreters)
    pub script: Option<PathBuf>,
}

/// Reconciliation sweep configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconcileSettings {
    /// Running tasks without a progress write for this long are failed
    pub stale_after: Duration,
    /// Submitted tasks never marked running after this long are failed
    pub orphan_grace: Duration,
    /// Sweep period for `reconcile --watch`
    pub interval: Duration,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    /// Log file path
    pub file: PathBuf,
}

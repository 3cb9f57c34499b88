//! CLI runner for common setup and operations.
//!
//! Encapsulates configuration loading, logging initialization and task
//! database access to reduce duplication across command handlers.

use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

use maptiles::config::ConfigFile;
use maptiles::launcher::{DetachedSpawner, TaskLauncher};
use maptiles::logging::{init_logging, LoggingGuard};
use maptiles::reconcile::Reconciler;
use maptiles::reporter::ProgressReporter;
use maptiles::store::{Database, SqliteTaskStore};

use crate::error::CliError;

/// Runner that manages CLI lifecycle and common operations.
pub struct CliRunner {
    /// Logging guard - keeps logging active while runner exists
    #[allow(dead_code)]
    logging_guard: LoggingGuard,
    /// Loaded configuration file
    config: ConfigFile,
}

impl CliRunner {
    /// Create a new CLI runner, loading config and initializing logging.
    ///
    /// # Arguments
    ///
    /// * `config_path` - Explicit config file, `~/.maptiles/config.ini` when `None`
    /// * `debug_mode` - When true, enables debug-level logging regardless of RUST_LOG
    pub fn new(config_path: Option<&Path>, debug_mode: bool) -> Result<Self, CliError> {
        let config = match config_path {
            Some(path) => ConfigFile::load_from(path)?,
            None => ConfigFile::load()?,
        };

        let logging_guard = init_logging(&config.logging.file, debug_mode)
            .map_err(|e| CliError::LoggingInit(e.to_string()))?;

        Ok(Self {
            logging_guard,
            config,
        })
    }

    /// Log startup information for a command.
    pub fn log_startup(&self, command: &str) {
        debug!("maptiles v{}: {} command", maptiles::VERSION, command);
    }

    /// Open the task database described by `[storage]`.
    pub fn open_store(&self) -> Result<Arc<SqliteTaskStore>, CliError> {
        let db = Database::open(&self.config.storage)?;
        debug!(path = %self.config.storage.database.display(), "Task database opened");
        let store = SqliteTaskStore::new(Arc::new(db))
            .with_orphan_grace(self.config.reconcile.orphan_grace);
        Ok(Arc::new(store))
    }

    fn spawner(&self) -> DetachedSpawner {
        DetachedSpawner::from_settings(&self.config.worker, &self.config.tasks)
    }

    /// Create a launcher that starts real worker processes.
    pub fn launcher(&self) -> Result<TaskLauncher<SqliteTaskStore, DetachedSpawner>, CliError> {
        Ok(TaskLauncher::new(
            self.open_store()?,
            self.spawner(),
            (&self.config.tasks).into(),
        ))
    }

    pub fn reporter(&self) -> Result<ProgressReporter<SqliteTaskStore>, CliError> {
        Ok(ProgressReporter::new(self.open_store()?))
    }

    pub fn reconciler(&self) -> Result<Reconciler<SqliteTaskStore, DetachedSpawner>, CliError> {
        let reconciler = Reconciler::new(
            self.open_store()?,
            self.spawner(),
            &self.config.reconcile,
        );
        info!(
            stale_after_secs = self.config.reconcile.stale_after.as_secs(),
            orphan_grace_secs = self.config.reconcile.orphan_grace.as_secs(),
            "Reconciler configured"
        );
        Ok(reconciler)
    }
}

//! Configuration for the maptiles components.
//!
//! Settings are read from an INI file (`~/.maptiles/config.ini` by default),
//! one section per concern:
//!
//! - `[storage]` task database location and connection retry policy
//! - `[tasks]` destination folders and admission limits
//! - `[worker]` the download worker executable
//! - `[reconcile]` orphan and heartbeat timeouts
//! - `[logging]` log file location
//!
//! # Example
//!
//! ```
//! use maptiles::config::ConfigFile;
//!
//! let config = ConfigFile::default();
//! assert!(config.tasks.max_per_user <= config.tasks.max_concurrent);
//! ```

mod defaults;
mod file;
mod parser;
mod settings;
mod writer;

pub use defaults::*;
pub use file::{config_directory, config_file_path, ConfigFileError};
pub use settings::{
    ConfigFile, LoggingSettings, ReconcileSettings, StorageSettings, TaskSettings, WorkerSettings,
};

//! maptiles - Slippy-map tile download tasks
//!
//! This library provides the pieces of a tile download service: Web
//! Mercator tile math, a durable task store, submission validation, and the
//! launcher that hands each task to an independent worker process.
//!
//! # Overview
//!
//! ```ignore
//! use maptiles::launcher::{DetachedSpawner, TaskLauncher};
//! use maptiles::store::{Database, SqliteTaskStore};
//!
//! let store = Arc::new(SqliteTaskStore::new(Arc::new(Database::open(&config.storage)?)));
//! let spawner = DetachedSpawner::from_settings(&config.worker, &config.tasks);
//! let launcher = TaskLauncher::new(store, spawner, (&config.tasks).into());
//!
//! let task = launcher.submit(user, &submission)?;
//! ```

pub mod config;
pub mod coord;
pub mod envelope;
pub mod error;
pub mod launcher;
pub mod logging;
pub mod reconcile;
pub mod reporter;
pub mod store;
pub mod task;
pub mod time;

/// Version of the maptiles library and CLI.
///
/// The version is defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! CLI command implementations.
//!
//! Each subcommand has its own module with argument definitions and handlers.
//!
//! # Command Modules
//!
//! - [`submit`] - Validate, persist and launch a download task
//! - [`query`] - Task status, listing and cancellation for one user
//! - [`progress`] - Worker-facing progress reports
//! - [`count`] - Tile count estimate for a bounding box
//! - [`reconcile`] - Fail orphaned and stalled tasks
//! - [`config`] - Configuration file management (init, path)

pub mod common;
pub mod config;
pub mod count;
pub mod progress;
pub mod query;
pub mod reconcile;
pub mod submit;

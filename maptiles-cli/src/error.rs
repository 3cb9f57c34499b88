//! CLI error handling with user-friendly messages.
//!
//! Failures that happen before a command can produce its own response
//! (configuration, logging, database, input) still reach the caller as a
//! response envelope on stdout, plus a human-readable line on stderr.

use std::path::PathBuf;
use std::process;
use thiserror::Error;

use maptiles::config::ConfigFileError;
use maptiles::envelope::Response;
use maptiles::error::ErrorCode;
use maptiles::store::StoreError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug, Error)]
pub enum CliError {
    /// Failed to initialize logging
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    /// Configuration could not be read or written
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigFileError),

    /// The task database could not be opened
    #[error("Failed to open task database: {0}")]
    Database(#[from] StoreError),

    /// A submission file could not be read
    #[error("Failed to read '{}': {error}", .path.display())]
    Input {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },

    /// A submission was not valid JSON
    #[error("Invalid submission JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),

    /// A response could not be written to stdout
    #[error("Failed to write response: {0}")]
    Output(#[source] serde_json::Error),

    /// `reconcile --watch` could not start its runtime
    #[error("Failed to start async runtime: {0}")]
    Runtime(#[source] std::io::Error),
}

impl CliError {
    /// Envelope code reported for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            CliError::LoggingInit(_) | CliError::Config(_) | CliError::Runtime(_) => {
                ErrorCode::Config
            }
            CliError::Database(_) | CliError::Output(_) => ErrorCode::Persistence,
            CliError::Input { .. } | CliError::InvalidJson(_) => ErrorCode::Validation,
        }
    }

    /// Exit the process with an error envelope and exit code 1.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        if !matches!(self, CliError::Output(_)) {
            let response: Response<()> = Response::failure(self.code(), self.to_string());
            if let Ok(json) = serde_json::to_string_pretty(&response) {
                println!("{}", json);
            }
        }

        if let CliError::Config(_) = self {
            eprintln!();
            eprintln!("Create a commented default with: maptiles config init");
        }

        process::exit(1)
    }
}

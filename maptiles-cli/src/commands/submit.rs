//! Task submission command.
//!
//! A submission is given either as JSON (a file, or `-` for stdin) with the
//! fields `task_name`, `url`, `zoom_min`, `zoom_max`, `west`, `north`,
//! `east` and `south`, or as individual flags.

use clap::Args;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::info;

use maptiles::error::ErrorCode;
use maptiles::task::{TaskSubmission, UserId};

use super::common::respond;
use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for `maptiles submit`.
#[derive(Debug, Args)]
pub struct SubmitArgs {
    /// Id of the submitting user
    #[arg(long)]
    pub user: i64,

    /// Read the submission from a JSON file (`-` for stdin)
    #[arg(
        long,
        value_name = "FILE",
        conflicts_with_all = ["name", "url", "zoom_min", "zoom_max", "west", "north", "east", "south"]
    )]
    pub json: Option<PathBuf>,

    /// Task name (at most 63 characters)
    #[arg(long, required_unless_present = "json")]
    pub name: Option<String>,

    /// Tile URL template containing {z}, {x} and {y}
    #[arg(long, required_unless_present = "json")]
    pub url: Option<String>,

    /// Lowest zoom level to download (1-25)
    #[arg(long, required_unless_present = "json")]
    pub zoom_min: Option<i64>,

    /// Highest zoom level to download (1-25)
    #[arg(long, required_unless_present = "json")]
    pub zoom_max: Option<i64>,

    /// Western longitude
    #[arg(long, required_unless_present = "json", allow_negative_numbers = true)]
    pub west: Option<f64>,

    /// Northern latitude
    #[arg(long, required_unless_present = "json", allow_negative_numbers = true)]
    pub north: Option<f64>,

    /// Eastern longitude
    #[arg(long, required_unless_present = "json", allow_negative_numbers = true)]
    pub east: Option<f64>,

    /// Southern latitude
    #[arg(long, required_unless_present = "json", allow_negative_numbers = true)]
    pub south: Option<f64>,
}

impl SubmitArgs {
    /// Build the submission from JSON input or the individual flags.
    pub fn submission(&self) -> Result<TaskSubmission, CliError> {
        if let Some(path) = &self.json {
            return read_submission(path);
        }

        // clap enforces presence; missing values would fail validation anyway
        Ok(TaskSubmission {
            task_name: self.name.clone().unwrap_or_default(),
            url: self.url.clone().unwrap_or_default(),
            zoom_min: self.zoom_min.unwrap_or(0),
            zoom_max: self.zoom_max.unwrap_or(0),
            west: self.west.unwrap_or(f64::NAN),
            north: self.north.unwrap_or(f64::NAN),
            east: self.east.unwrap_or(f64::NAN),
            south: self.south.unwrap_or(f64::NAN),
        })
    }
}

fn read_submission(path: &Path) -> Result<TaskSubmission, CliError> {
    let input_error = |error| CliError::Input {
        path: path.to_path_buf(),
        error,
    };

    let content = if path.as_os_str() == "-" {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .map_err(input_error)?;
        buffer
    } else {
        fs::read_to_string(path).map_err(input_error)?
    };

    parse_submission(&content)
}

fn parse_submission(content: &str) -> Result<TaskSubmission, CliError> {
    serde_json::from_str(content).map_err(CliError::InvalidJson)
}

/// Run the submit command.
pub fn run(runner: &CliRunner, args: SubmitArgs) -> Result<ErrorCode, CliError> {
    runner.log_startup("submit");
    let submission = args.submission()?;
    let launcher = runner.launcher()?;

    let result = launcher.submit(UserId(args.user), &submission);
    if let Ok(task) = &result {
        info!(task_id = %task.id, folder = %task.folder.display(), "Submission accepted");
    }
    respond(result)
}

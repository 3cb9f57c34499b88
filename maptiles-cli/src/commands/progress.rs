//! Worker-facing progress reports.
//!
//! The download worker calls `maptiles progress` after each batch of tiles,
//! passing back the `--token` it was launched with. A non-zero exit tells
//! it to stop: code 7 (conflict) means the task was cancelled, already
//! finished or never launched, code 5 means the token does not match, and
//! any other code means the report could not be recorded.

use tracing::debug;

use maptiles::error::{ErrorCode, TaskError};
use maptiles::store::TaskStore;
use maptiles::task::{ProgressStatus, TaskId};

use super::common::respond;
use crate::error::CliError;
use crate::runner::CliRunner;

/// Record a progress report for `task`.
pub fn run(
    runner: &CliRunner,
    task: i64,
    token: &str,
    percent: f64,
    failed: bool,
) -> Result<ErrorCode, CliError> {
    let store = runner.open_store()?;
    let status = if failed {
        ProgressStatus::Failed
    } else {
        ProgressStatus::Running
    };

    let result = store
        .update_progress(TaskId(task), token, percent, status)
        .map_err(TaskError::from);
    match &result {
        Ok(updated) => debug!(
            task_id = task,
            progress = updated.progress,
            status = %updated.status,
            "Progress recorded"
        ),
        Err(e) => debug!(task_id = task, error = %e, "Progress rejected"),
    }
    respond(result)
}

//! Task queries and cancellation on behalf of one user.

use maptiles::error::ErrorCode;
use maptiles::task::{TaskId, UserId};

use super::common::respond;
use crate::error::CliError;
use crate::runner::CliRunner;

/// Print one task owned by `user`.
pub fn run_status(runner: &CliRunner, user: i64, task: i64) -> Result<ErrorCode, CliError> {
    runner.log_startup("status");
    let reporter = runner.reporter()?;
    respond(reporter.get_task(UserId(user), TaskId(task)))
}

/// Print every task owned by `user`.
pub fn run_list(runner: &CliRunner, user: i64) -> Result<ErrorCode, CliError> {
    runner.log_startup("list");
    let reporter = runner.reporter()?;
    respond(reporter.list_tasks(UserId(user)))
}

/// Cancel a task owned by `user` and signal its worker.
pub fn run_cancel(runner: &CliRunner, user: i64, task: i64) -> Result<ErrorCode, CliError> {
    runner.log_startup("cancel");
    let launcher = runner.launcher()?;
    respond(launcher.cancel(UserId(user), TaskId(task)))
}

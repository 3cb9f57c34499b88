//! Task store errors.

use crate::task::{TaskId, TaskStatus, UserId};
use std::fmt;
use thiserror::Error;

/// Which admission limit rejected a new task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapacityScope {
    /// The deployment-wide active task limit
    Global,
    /// The per-user active task limit
    User(UserId),
}

impl fmt::Display for CapacityScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CapacityScope::Global => f.write_str("all users"),
            CapacityScope::User(user) => write!(f, "user {}", user),
        }
    }
}

/// Errors returned by [`super::TaskStore`] operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The database rejected a statement or could not be reached
    #[error("database error: {0}")]
    Sql(#[from] rusqlite::Error),

    /// The database file or its directory could not be prepared
    #[error("database I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// No task with this id exists
    #[error("task {0} does not exist")]
    UnknownTask(TaskId),

    /// A progress report lower than the stored value
    #[error("task {task_id}: progress {reported} is below stored progress {stored}")]
    ProgressRegression {
        task_id: TaskId,
        stored: f64,
        reported: f64,
    },

    /// A progress value outside 0..=100 or not finite
    #[error("task {task_id}: progress {reported} is outside 0..=100")]
    InvalidProgress { task_id: TaskId, reported: f64 },

    /// The report did not carry the token issued to the task's worker
    #[error("task {0}: report does not come from its assigned worker")]
    WrongWorker(TaskId),

    /// The task's worker never started and the launch grace period is over
    #[error("task {0} was never launched")]
    NeverLaunched(TaskId),

    /// The task already reached a terminal state
    #[error("task {task_id} is already {status}")]
    TaskFinished { task_id: TaskId, status: TaskStatus },

    /// The state machine does not allow this move
    #[error("task {task_id} cannot move from {from} to {to}")]
    InvalidTransition {
        task_id: TaskId,
        from: TaskStatus,
        to: TaskStatus,
    },

    /// Admitting another task would exceed an active task limit
    #[error("active task limit of {limit} reached for {scope}")]
    AtCapacity { scope: CapacityScope, limit: usize },

    /// A stored row could not be decoded
    #[error("corrupt task row: {0}")]
    Corrupt(String),
}

impl StoreError {
    /// Returns true for rejections caused by the task's current state
    /// rather than by the store itself.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            StoreError::ProgressRegression { .. }
                | StoreError::InvalidProgress { .. }
                | StoreError::TaskFinished { .. }
                | StoreError::InvalidTransition { .. }
                | StoreError::NeverLaunched(_)
        )
    }
}

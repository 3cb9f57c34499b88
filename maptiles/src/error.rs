//! Errors surfaced to callers of task operations.
//!
//! Every failure maps onto one stable [`ErrorCode`], which is what clients
//! see in the response envelope.

use serde::{Serialize, Serializer};
use std::fmt;
use thiserror::Error;

use crate::store::{CapacityScope, StoreError};
use crate::task::{TaskId, ValidationError};

/// Numeric outcome codes carried by every response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    Ok,
    Validation,
    Persistence,
    Spawn,
    NotFound,
    Unauthorized,
    AtCapacity,
    Conflict,
    Config,
}

impl ErrorCode {
    pub fn as_i32(&self) -> i32 {
        match self {
            ErrorCode::Ok => 0,
            ErrorCode::Validation => 1,
            ErrorCode::Persistence => 2,
            ErrorCode::Spawn => 3,
            ErrorCode::NotFound => 4,
            ErrorCode::Unauthorized => 5,
            ErrorCode::AtCapacity => 6,
            ErrorCode::Conflict => 7,
            ErrorCode::Config => 8,
        }
    }

    pub fn is_ok(&self) -> bool {
        *self == ErrorCode::Ok
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_i32())
    }
}

impl Serialize for ErrorCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i32(self.as_i32())
    }
}

/// Failure of a task operation.
#[derive(Debug, Error)]
pub enum TaskError {
    /// Submission rejected before anything was persisted
    #[error("invalid submission: {0}")]
    Validation(#[from] ValidationError),

    /// The task database failed
    #[error("task storage failed: {0}")]
    Persistence(#[source] StoreError),

    /// The task was persisted but its worker could not be started
    #[error("task {task_id} saved but worker failed to start: {source}")]
    Spawn {
        task_id: TaskId,
        #[source]
        source: std::io::Error,
    },

    #[error("task {0} not found")]
    NotFound(TaskId),

    /// The caller neither owns the task nor holds its worker token
    #[error("not authorized for task {0}")]
    Unauthorized(TaskId),

    #[error("too many active tasks: limit of {limit} reached for {scope}")]
    AtCapacity { scope: CapacityScope, limit: usize },

    /// The task's current state forbids the operation
    #[error("{0}")]
    Conflict(#[source] StoreError),
}

impl TaskError {
    pub fn code(&self) -> ErrorCode {
        match self {
            TaskError::Validation(_) => ErrorCode::Validation,
            TaskError::Persistence(_) => ErrorCode::Persistence,
            TaskError::Spawn { .. } => ErrorCode::Spawn,
            TaskError::NotFound(_) => ErrorCode::NotFound,
            TaskError::Unauthorized(_) => ErrorCode::Unauthorized,
            TaskError::AtCapacity { .. } => ErrorCode::AtCapacity,
            TaskError::Conflict(_) => ErrorCode::Conflict,
        }
    }
}

impl From<StoreError> for TaskError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UnknownTask(id) => TaskError::NotFound(id),
            StoreError::WrongWorker(id) => TaskError::Unauthorized(id),
            StoreError::AtCapacity { scope, limit } => TaskError::AtCapacity { scope, limit },
            err if err.is_conflict() => TaskError::Conflict(err),
            err => TaskError::Persistence(err),
        }
    }
}

//! Read-only task queries scoped to the requesting user.

use std::sync::Arc;
use tracing::debug;

use crate::error::TaskError;
use crate::store::TaskStore;
use crate::task::{Task, TaskId, UserId};

/// Answers status polls. Never writes to the store.
pub struct ProgressReporter<S> {
    store: Arc<S>,
}

impl<S: TaskStore> ProgressReporter<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Returns one task owned by `user`.
    ///
    /// A task owned by someone else yields [`TaskError::Unauthorized`]
    /// carrying only the id.
    pub fn get_task(&self, user: UserId, id: TaskId) -> Result<Task, TaskError> {
        let task = self.store.get(id)?.ok_or(TaskError::NotFound(id))?;
        if task.owner != user {
            debug!(task_id = %id, user = %user, "Rejected foreign task lookup");
            return Err(TaskError::Unauthorized(id));
        }
        Ok(task)
    }

    /// Returns all tasks owned by `user`, oldest first.
    pub fn list_tasks(&self, user: UserId) -> Result<Vec<Task>, TaskError> {
        Ok(self.store.list_for_user(user)?)
    }
}

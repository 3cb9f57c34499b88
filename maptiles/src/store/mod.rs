//! Durable task records.
//!
//! The [`TaskStore`] trait is the seam between task logic and persistence.
//! [`SqliteTaskStore`] is the production implementation; every state change
//! it performs is a single transaction, so two processes writing the same
//! task (the worker reporting progress, the owner cancelling) serialize
//! instead of interleaving.

mod connection;
mod error;
mod sqlite;

pub use connection::{ConnectionGuard, Database};
pub use error::{CapacityScope, StoreError};
pub use sqlite::{SqliteTaskStore, WORKER_REPORTED_FAILURE};

use crate::config::TaskSettings;
use crate::task::{NewTask, ProgressStatus, Task, TaskId, TaskStatus, UserId};

/// Upper bounds on simultaneously active (submitted or running) tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdmissionLimits {
    pub max_concurrent: usize,
    pub max_per_user: usize,
}

impl AdmissionLimits {
    /// Limits that never reject.
    pub fn unlimited() -> Self {
        Self {
            max_concurrent: usize::MAX,
            max_per_user: usize::MAX,
        }
    }
}

impl From<&TaskSettings> for AdmissionLimits {
    fn from(settings: &TaskSettings) -> Self {
        Self {
            max_concurrent: settings.max_concurrent,
            max_per_user: settings.max_per_user,
        }
    }
}

/// Persistence operations on download tasks.
pub trait TaskStore: Send + Sync {
    /// Inserts a task in `Submitted` state with progress 0 and assigns its
    /// folder. Fails with [`StoreError::AtCapacity`] when `limits` would be
    /// exceeded; the check and the insert are atomic.
    fn create(&self, task: &NewTask, limits: &AdmissionLimits) -> Result<Task, StoreError>;

    fn get(&self, id: TaskId) -> Result<Option<Task>, StoreError>;

    /// All tasks owned by `owner`, oldest first.
    fn list_for_user(&self, owner: UserId) -> Result<Vec<Task>, StoreError>;

    fn list_by_status(&self, status: TaskStatus) -> Result<Vec<Task>, StoreError>;

    /// Counts submitted and running tasks, optionally for one owner.
    fn count_active(&self, owner: Option<UserId>) -> Result<usize, StoreError>;

    /// Records a worker progress report.
    ///
    /// `token` must be the task's `worker_token`, otherwise the report is
    /// rejected with [`StoreError::WrongWorker`]. Progress never decreases,
    /// 100 completes the task, and reports against a finished task are
    /// rejected with [`StoreError::TaskFinished`]. A `Submitted` task whose
    /// worker pid was never recorded stops accepting reports once its
    /// orphan grace has passed ([`StoreError::NeverLaunched`]). Each
    /// accepted report refreshes the task's heartbeat.
    fn update_progress(
        &self,
        id: TaskId,
        token: &str,
        progress: f64,
        status: ProgressStatus,
    ) -> Result<Task, StoreError>;

    /// Records the worker pid and moves a submitted task to `Running`.
    fn mark_running(&self, id: TaskId, pid: u32) -> Result<Task, StoreError>;

    /// Moves an active task to `Failed` with a reason.
    fn mark_failed(&self, id: TaskId, reason: &str) -> Result<Task, StoreError>;

    /// Moves an active task to `Cancelled`.
    fn mark_cancelled(&self, id: TaskId) -> Result<Task, StoreError>;
}

//! Task submission and cancellation.
//!
//! [`TaskLauncher`] turns a raw [`TaskSubmission`] into a persisted task with
//! a running worker:
//!
//! ```text
//! validate ──► admit + insert ──► spawn worker ──► mark running
//!    │              │                  │
//!    ▼              ▼                  ▼
//! Validation   AtCapacity /        Spawn (task stays Submitted,
//!              Persistence          failed later by the reconciler)
//! ```
//!
//! The worker is never awaited. It reports progress through the store and
//! learns about cancellation when its next report is rejected.

mod spawner;

pub use spawner::{task_log_path, worker_args, DetachedSpawner, WorkerSpawner};

use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::config::TaskSettings;
use crate::error::TaskError;
use crate::store::{AdmissionLimits, StoreError, TaskStore};
use crate::task::{NewTask, Task, TaskId, TaskSubmission, TaskValidator, UserId};

/// Launcher configuration taken from the `[tasks]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct LaunchSettings {
    pub root_folder: PathBuf,
    pub limits: AdmissionLimits,
}

impl From<&TaskSettings> for LaunchSettings {
    fn from(settings: &TaskSettings) -> Self {
        Self {
            root_folder: settings.root_folder.clone(),
            limits: AdmissionLimits::from(settings),
        }
    }
}

/// Submits and cancels download tasks.
pub struct TaskLauncher<S, W> {
    store: Arc<S>,
    spawner: W,
    validator: TaskValidator,
    settings: LaunchSettings,
}

impl<S: TaskStore, W: WorkerSpawner> TaskLauncher<S, W> {
    pub fn new(store: Arc<S>, spawner: W, settings: LaunchSettings) -> Self {
        Self {
            store,
            spawner,
            validator: TaskValidator::new(),
            settings,
        }
    }

    /// Validates, persists and launches a task for `user`.
    ///
    /// Returns the task in `Running` state once the worker has started.
    pub fn submit(&self, user: UserId, submission: &TaskSubmission) -> Result<Task, TaskError> {
        let validated = self.validator.validate(submission)?;

        let new_task = NewTask {
            owner: user,
            name: validated.name,
            url_template: validated.url_template,
            bbox: validated.bbox,
            zoom: validated.zoom,
            tile_count: validated.tile_count,
            root_folder: self.settings.root_folder.clone(),
        };
        let task = self.store.create(&new_task, &self.settings.limits)?;
        info!(
            task_id = %task.id,
            owner = %user,
            tiles = task.tile_count,
            zoom_min = task.zoom.min,
            zoom_max = task.zoom.max,
            "Task submitted"
        );

        let pid = match self.spawner.spawn(&task) {
            Ok(pid) => pid,
            Err(source) => {
                error!(
                    task_id = %task.id,
                    error = %source,
                    "Worker failed to start, task left for reconciliation"
                );
                return Err(TaskError::Spawn {
                    task_id: task.id,
                    source,
                });
            }
        };

        match self.store.mark_running(task.id, pid) {
            Ok(task) => {
                info!(task_id = %task.id, pid, "Task running");
                Ok(task)
            }
            // The worker finished (or was cancelled) before we recorded it
            Err(StoreError::TaskFinished { task_id, status }) => {
                info!(task_id = %task_id, %status, "Task finished before launch was recorded");
                self.store
                    .get(task_id)?
                    .ok_or(TaskError::NotFound(task_id))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Cancels an active task owned by `user`.
    ///
    /// The task is marked cancelled first, then the worker's process group
    /// is signalled. A worker that misses the signal stops when its next
    /// progress report is rejected.
    pub fn cancel(&self, user: UserId, id: TaskId) -> Result<Task, TaskError> {
        let task = self.store.get(id)?.ok_or(TaskError::NotFound(id))?;
        if task.owner != user {
            return Err(TaskError::Unauthorized(id));
        }

        let task = self.store.mark_cancelled(id)?;
        info!(task_id = %id, owner = %user, "Task cancelled");

        if let Some(pid) = task.pid {
            if let Err(e) = self.spawner.terminate(pid) {
                warn!(task_id = %id, pid, error = %e, "Failed to signal worker");
            }
        }
        Ok(task)
    }
}

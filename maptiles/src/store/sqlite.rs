//! SQLite-backed [`TaskStore`].

use rusqlite::types::Type;
use rusqlite::{params, OptionalExtension, Row, Transaction, TransactionBehavior};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

use super::{AdmissionLimits, CapacityScope, Database, StoreError, TaskStore};
use crate::config::DEFAULT_ORPHAN_GRACE_SECS;
use crate::coord::{BoundingBox, ZoomRange};
use crate::task::{task_folder, NewTask, ProgressStatus, Task, TaskId, TaskStatus, UserId};
use crate::time::{duration_ms, now_ms};

const TASK_COLUMNS: &str = "id, owner, name, url_template, west, north, east, south, \
     zoom_min, zoom_max, folder, tile_count, progress, status, pid, failure_reason, \
     created_at_ms, updated_at_ms, worker_token";

/// Failure reason recorded when the worker itself reports failure.
pub const WORKER_REPORTED_FAILURE: &str = "worker reported failure";

/// Task store persisting to a [`Database`].
///
/// Every mutation runs in an immediate transaction, which takes SQLite's
/// write lock up front: the read-check-write of one task id cannot
/// interleave with another writer, in this process or another.
#[derive(Debug, Clone)]
pub struct SqliteTaskStore {
    db: Arc<Database>,
    orphan_grace: Duration,
}

impl SqliteTaskStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self {
            db,
            orphan_grace: Duration::from_secs(DEFAULT_ORPHAN_GRACE_SECS),
        }
    }

    /// Sets how long a task without a worker pid accepts progress reports.
    ///
    /// Should match the reconciler's orphan grace so a task it is about to
    /// fail cannot be revived by a late report.
    pub fn with_orphan_grace(mut self, grace: Duration) -> Self {
        self.orphan_grace = grace;
        self
    }

    /// Runs `f` inside an immediate transaction and commits on success.
    fn write<T>(
        &self,
        f: impl FnOnce(&Transaction<'_>) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut conn = self.db.acquire();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
    }

    /// Moves a non-terminal task to a terminal `status`.
    fn finish(
        &self,
        id: TaskId,
        status: TaskStatus,
        reason: Option<&str>,
    ) -> Result<Task, StoreError> {
        self.write(|tx| {
            let current = load(tx, id)?.ok_or(StoreError::UnknownTask(id))?;
            if current.status.is_terminal() {
                return Err(StoreError::TaskFinished {
                    task_id: id,
                    status: current.status,
                });
            }
            tx.execute(
                "UPDATE tasks SET status = ?1, failure_reason = ?2, updated_at_ms = ?3 \
                 WHERE id = ?4",
                params![status.as_str(), reason, now_ms(), id.0],
            )?;
            load(tx, id)?.ok_or(StoreError::UnknownTask(id))
        })
    }
}

impl TaskStore for SqliteTaskStore {
    fn create(&self, task: &NewTask, limits: &AdmissionLimits) -> Result<Task, StoreError> {
        self.write(|tx| {
            let active = count_active(tx, None)?;
            if active >= limits.max_concurrent {
                return Err(StoreError::AtCapacity {
                    scope: CapacityScope::Global,
                    limit: limits.max_concurrent,
                });
            }
            let active_for_owner = count_active(tx, Some(task.owner))?;
            if active_for_owner >= limits.max_per_user {
                return Err(StoreError::AtCapacity {
                    scope: CapacityScope::User(task.owner),
                    limit: limits.max_per_user,
                });
            }

            let tile_count = i64::try_from(task.tile_count)
                .map_err(|_| StoreError::Corrupt(format!("tile count {}", task.tile_count)))?;
            let now = now_ms();
            tx.execute(
                "INSERT INTO tasks (owner, name, url_template, west, north, east, south, \
                 zoom_min, zoom_max, tile_count, progress, status, created_at_ms, updated_at_ms, \
                 worker_token) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, 0, ?11, ?12, ?12, ?13)",
                params![
                    task.owner.0,
                    task.name,
                    task.url_template,
                    task.bbox.west,
                    task.bbox.north,
                    task.bbox.east,
                    task.bbox.south,
                    task.zoom.min,
                    task.zoom.max,
                    tile_count,
                    TaskStatus::Submitted.as_str(),
                    now,
                    Uuid::new_v4().simple().to_string(),
                ],
            )?;

            let id = TaskId(tx.last_insert_rowid());
            let folder = task_folder(&task.root_folder, task.owner, id);
            tx.execute(
                "UPDATE tasks SET folder = ?1 WHERE id = ?2",
                params![folder.to_string_lossy(), id.0],
            )?;
            debug!(task_id = %id, owner = %task.owner, "Task record created");

            load(tx, id)?.ok_or(StoreError::UnknownTask(id))
        })
    }

    fn get(&self, id: TaskId) -> Result<Option<Task>, StoreError> {
        let conn = self.db.acquire();
        conn.query_row(
            &format!("SELECT {} FROM tasks WHERE id = ?1", TASK_COLUMNS),
            params![id.0],
            read_task,
        )
        .optional()
        .map_err(StoreError::from)
    }

    fn list_for_user(&self, owner: UserId) -> Result<Vec<Task>, StoreError> {
        let conn = self.db.acquire();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM tasks WHERE owner = ?1 ORDER BY id ASC",
            TASK_COLUMNS
        ))?;
        let rows = stmt.query_map(params![owner.0], read_task)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(StoreError::from)
    }

    fn list_by_status(&self, status: TaskStatus) -> Result<Vec<Task>, StoreError> {
        let conn = self.db.acquire();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM tasks WHERE status = ?1 ORDER BY id ASC",
            TASK_COLUMNS
        ))?;
        let rows = stmt.query_map(params![status.as_str()], read_task)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(StoreError::from)
    }

    fn count_active(&self, owner: Option<UserId>) -> Result<usize, StoreError> {
        let conn = self.db.acquire();
        count_active(&conn, owner)
    }

    fn update_progress(
        &self,
        id: TaskId,
        token: &str,
        progress: f64,
        status: ProgressStatus,
    ) -> Result<Task, StoreError> {
        self.write(|tx| {
            let current = load(tx, id)?.ok_or(StoreError::UnknownTask(id))?;
            if current.worker_token != token {
                return Err(StoreError::WrongWorker(id));
            }
            if current.status.is_terminal() {
                return Err(StoreError::TaskFinished {
                    task_id: id,
                    status: current.status,
                });
            }
            let now = now_ms();
            if current.status == TaskStatus::Submitted
                && current.pid.is_none()
                && now.saturating_sub(current.created_at_ms) > duration_ms(self.orphan_grace)
            {
                return Err(StoreError::NeverLaunched(id));
            }
            if !progress.is_finite() || !(0.0..=100.0).contains(&progress) {
                return Err(StoreError::InvalidProgress {
                    task_id: id,
                    reported: progress,
                });
            }

            // A failure report never lowers the stored progress
            let progress = match status {
                ProgressStatus::Failed => progress.max(current.progress),
                ProgressStatus::Running if progress < current.progress => {
                    return Err(StoreError::ProgressRegression {
                        task_id: id,
                        stored: current.progress,
                        reported: progress,
                    });
                }
                ProgressStatus::Running => progress,
            };

            let next = match status {
                ProgressStatus::Failed => TaskStatus::Failed,
                ProgressStatus::Running if progress >= 100.0 => TaskStatus::Done,
                ProgressStatus::Running => TaskStatus::Running,
            };
            if next != current.status && !current.status.can_transition_to(next) {
                return Err(StoreError::InvalidTransition {
                    task_id: id,
                    from: current.status,
                    to: next,
                });
            }

            let reason = (next == TaskStatus::Failed).then_some(WORKER_REPORTED_FAILURE);
            tx.execute(
                "UPDATE tasks SET progress = ?1, status = ?2, \
                 failure_reason = COALESCE(?3, failure_reason), updated_at_ms = ?4 \
                 WHERE id = ?5",
                params![progress, next.as_str(), reason, now, id.0],
            )?;
            load(tx, id)?.ok_or(StoreError::UnknownTask(id))
        })
    }

    fn mark_running(&self, id: TaskId, pid: u32) -> Result<Task, StoreError> {
        self.write(|tx| {
            let current = load(tx, id)?.ok_or(StoreError::UnknownTask(id))?;
            match current.status {
                TaskStatus::Submitted => {}
                // The worker may report progress before its pid is recorded
                TaskStatus::Running if current.pid.is_none() => {}
                status if status.is_terminal() => {
                    return Err(StoreError::TaskFinished {
                        task_id: id,
                        status,
                    });
                }
                status => {
                    return Err(StoreError::InvalidTransition {
                        task_id: id,
                        from: status,
                        to: TaskStatus::Running,
                    });
                }
            }
            tx.execute(
                "UPDATE tasks SET status = ?1, pid = ?2, updated_at_ms = ?3 WHERE id = ?4",
                params![TaskStatus::Running.as_str(), pid, now_ms(), id.0],
            )?;
            load(tx, id)?.ok_or(StoreError::UnknownTask(id))
        })
    }

    fn mark_failed(&self, id: TaskId, reason: &str) -> Result<Task, StoreError> {
        self.finish(id, TaskStatus::Failed, Some(reason))
    }

    fn mark_cancelled(&self, id: TaskId) -> Result<Task, StoreError> {
        self.finish(id, TaskStatus::Cancelled, None)
    }
}

fn load(conn: &rusqlite::Connection, id: TaskId) -> Result<Option<Task>, StoreError> {
    conn.query_row(
        &format!("SELECT {} FROM tasks WHERE id = ?1", TASK_COLUMNS),
        params![id.0],
        read_task,
    )
    .optional()
    .map_err(StoreError::from)
}

fn count_active(conn: &rusqlite::Connection, owner: Option<UserId>) -> Result<usize, StoreError> {
    let count: i64 = match owner {
        Some(owner) => conn.query_row(
            "SELECT COUNT(*) FROM tasks WHERE status IN (?1, ?2) AND owner = ?3",
            params![
                TaskStatus::Submitted.as_str(),
                TaskStatus::Running.as_str(),
                owner.0
            ],
            |row| row.get(0),
        )?,
        None => conn.query_row(
            "SELECT COUNT(*) FROM tasks WHERE status IN (?1, ?2)",
            params![TaskStatus::Submitted.as_str(), TaskStatus::Running.as_str()],
            |row| row.get(0),
        )?,
    };
    Ok(usize::try_from(count).unwrap_or(0))
}

fn conversion_error(index: usize, kind: Type, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(index, kind, message.into())
}

fn read_task(row: &Row<'_>) -> rusqlite::Result<Task> {
    let status: String = row.get(13)?;
    let status = status
        .parse::<TaskStatus>()
        .map_err(|e| conversion_error(13, Type::Text, e))?;

    let tile_count: i64 = row.get(11)?;
    let tile_count = u64::try_from(tile_count)
        .map_err(|_| conversion_error(11, Type::Integer, format!("tile count {}", tile_count)))?;

    let pid: Option<i64> = row.get(14)?;
    let pid = pid
        .map(|pid| {
            u32::try_from(pid).map_err(|_| conversion_error(14, Type::Integer, format!("pid {}", pid)))
        })
        .transpose()?;

    let folder: String = row.get(10)?;

    Ok(Task {
        id: TaskId(row.get(0)?),
        owner: UserId(row.get(1)?),
        name: row.get(2)?,
        url_template: row.get(3)?,
        bbox: BoundingBox::new(row.get(4)?, row.get(5)?, row.get(6)?, row.get(7)?),
        zoom: ZoomRange::new(row.get(8)?, row.get(9)?),
        folder: PathBuf::from(folder),
        tile_count,
        progress: row.get(12)?,
        status,
        pid,
        failure_reason: row.get(15)?,
        created_at_ms: row.get(16)?,
        updated_at_ms: row.get(17)?,
        worker_token: row.get(18)?,
    })
}

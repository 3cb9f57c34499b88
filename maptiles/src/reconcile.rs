//! Orphan and stall reconciliation.
//!
//! Workers are detached and never awaited, so a task can be left active
//! with nobody working on it: the worker failed to start, or it died
//! without reporting. The [`Reconciler`] finds such tasks and marks them
//! failed.
//!
//! - **Orphaned**: `Submitted` with no recorded pid, older than
//!   `orphan_grace`.
//! - **Stalled**: `Running` with no progress write (heartbeat) for
//!   `stale_after`. The worker's process group is signalled as well, since
//!   a hung worker never sends the report that would tell it to stop.

use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::ReconcileSettings;
use crate::launcher::WorkerSpawner;
use crate::store::{StoreError, TaskStore};
use crate::task::{TaskId, TaskStatus};
use crate::time::{duration_ms, now_ms};

/// Failure reason for tasks whose worker never started.
pub const ORPHANED_REASON: &str = "worker never started";

/// Tasks moved to `Failed` by one sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub orphaned: Vec<TaskId>,
    pub stalled: Vec<TaskId>,
}

impl ReconcileReport {
    pub fn is_empty(&self) -> bool {
        self.orphaned.is_empty() && self.stalled.is_empty()
    }
}

/// Fails active tasks that no worker is serving.
pub struct Reconciler<S, W> {
    store: Arc<S>,
    spawner: W,
    stale_after: Duration,
    orphan_grace: Duration,
    interval: Duration,
}

impl<S: TaskStore, W: WorkerSpawner> Reconciler<S, W> {
    pub fn new(store: Arc<S>, spawner: W, settings: &ReconcileSettings) -> Self {
        Self {
            store,
            spawner,
            stale_after: settings.stale_after,
            orphan_grace: settings.orphan_grace,
            interval: settings.interval,
        }
    }

    /// Fails orphaned and stalled tasks as of `now_ms`.
    pub fn sweep(&self, now_ms: i64) -> Result<ReconcileReport, StoreError> {
        let mut report = ReconcileReport::default();

        let orphan_cutoff = now_ms.saturating_sub(duration_ms(self.orphan_grace));
        for task in self.store.list_by_status(TaskStatus::Submitted)? {
            if task.pid.is_some() || task.created_at_ms > orphan_cutoff {
                continue;
            }
            if self.fail(task.id, ORPHANED_REASON)? {
                warn!(task_id = %task.id, owner = %task.owner, "Orphaned task failed");
                report.orphaned.push(task.id);
            }
        }

        let stale_cutoff = now_ms.saturating_sub(duration_ms(self.stale_after));
        for task in self.store.list_by_status(TaskStatus::Running)? {
            if task.updated_at_ms > stale_cutoff {
                continue;
            }
            let reason = format!(
                "no progress heartbeat for {}s",
                (now_ms - task.updated_at_ms) / 1000
            );
            if self.fail(task.id, &reason)? {
                warn!(
                    task_id = %task.id,
                    owner = %task.owner,
                    progress = task.progress,
                    "Stalled task failed"
                );
                if let Some(pid) = task.pid {
                    if let Err(e) = self.spawner.terminate(pid) {
                        warn!(
                            task_id = %task.id,
                            pid,
                            error = %e,
                            "Failed to signal stalled worker"
                        );
                    }
                }
                report.stalled.push(task.id);
            }
        }

        Ok(report)
    }

    /// Marks one task failed. Returns false when it finished in the meantime.
    fn fail(&self, id: TaskId, reason: &str) -> Result<bool, StoreError> {
        match self.store.mark_failed(id, reason) {
            Ok(_) => Ok(true),
            Err(StoreError::TaskFinished { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Sweeps every interval until cancelled.
    pub async fn run(self, shutdown: CancellationToken) {
        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        info!(
            interval_secs = self.interval.as_secs(),
            stale_after_secs = self.stale_after.as_secs(),
            orphan_grace_secs = self.orphan_grace.as_secs(),
            "Reconciler started"
        );

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = interval.tick() => {}
            }

            match self.sweep(now_ms()) {
                Ok(report) if report.is_empty() => debug!("Reconcile sweep: nothing to do"),
                Ok(report) => info!(
                    orphaned = report.orphaned.len(),
                    stalled = report.stalled.len(),
                    "Reconcile sweep failed abandoned tasks"
                ),
                Err(e) => error!(error = %e, "Reconcile sweep failed"),
            }
        }

        info!("Reconciler stopped");
    }
}

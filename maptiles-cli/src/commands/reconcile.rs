//! Reconciliation command.
//!
//! Without `--watch` a single sweep runs and its report is printed. With
//! `--watch` sweeps repeat every `[reconcile] interval_secs` until Ctrl-C.

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use maptiles::error::{ErrorCode, TaskError};
use maptiles::reconcile::ReconcileReport;
use maptiles::task::TaskId;
use maptiles::time::now_ms;

use super::common::respond;
use crate::error::CliError;
use crate::runner::CliRunner;

/// Task ids failed by one sweep.
#[derive(Debug, Serialize)]
struct SweepSummary {
    orphaned: Vec<TaskId>,
    stalled: Vec<TaskId>,
}

impl From<ReconcileReport> for SweepSummary {
    fn from(report: ReconcileReport) -> Self {
        Self {
            orphaned: report.orphaned,
            stalled: report.stalled,
        }
    }
}

/// Run the reconcile command.
pub fn run(runner: &CliRunner, watch: bool) -> Result<ErrorCode, CliError> {
    runner.log_startup("reconcile");
    let reconciler = runner.reconciler()?;

    if !watch {
        let result = reconciler
            .sweep(now_ms())
            .map(SweepSummary::from)
            .map_err(TaskError::from);
        return respond(result);
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)?;

    runtime.block_on(async move {
        let shutdown = CancellationToken::new();
        let signal_token = shutdown.clone();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => info!("Interrupt received, stopping reconciler"),
                Err(e) => warn!(error = %e, "Failed to listen for Ctrl-C"),
            }
            signal_token.cancel();
        });

        reconciler.run(shutdown).await;
    });

    Ok(ErrorCode::Ok)
}

//! INI serialization logic for converting `ConfigFile` → INI string.
//!
//! This module contains the `to_config_string()` function that produces
//! the commented INI representation written to `config.ini`.

use std::path::Path;

use super::settings::ConfigFile;

/// Convert a `ConfigFile` to a commented INI string for saving.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    let script = config
        .worker
        .script
        .as_ref()
        .map(|p| path_to_string(p))
        .unwrap_or_default();

    format!(
        r#"[storage]
; SQLite database holding task records
database = {}
; Milliseconds a writer waits on a locked database
busy_timeout_ms = {}
; Extra attempts when the database cannot be opened, and the pause between them
connect_retries = {}
retry_backoff_ms = {}

[tasks]
; Tiles are saved under <root_folder>/<user id>/<task id>
root_folder = {}
; One task-<id>.log per worker process
log_dir = {}
; Active (submitted or running) task limits; submissions beyond them are rejected
max_concurrent = {}
max_per_user = {}

[worker]
; Executable started for every task. When script is set it is passed as the
; first argument, followed by:
;   --zoom MIN MAX --url TEMPLATE --output-folder DIR --task-id ID -- WEST SOUTH EAST NORTH
program = {}
script = {}

[reconcile]
; Running tasks with no progress report for this long are marked failed
stale_after_secs = {}
; Submitted tasks whose worker never started are marked failed after this long
orphan_grace_secs = {}
; Sweep period for `maptiles reconcile --watch`
interval_secs = {}

[logging]
file = {}
"#,
        path_to_string(&config.storage.database),
        config.storage.busy_timeout.as_millis(),
        config.storage.connect_retries,
        config.storage.retry_backoff.as_millis(),
        path_to_string(&config.tasks.root_folder),
        path_to_string(&config.tasks.log_dir),
        config.tasks.max_concurrent,
        config.tasks.max_per_user,
        path_to_string(&config.worker.program),
        script,
        config.reconcile.stale_after.as_secs(),
        config.reconcile.orphan_grace.as_secs(),
        config.reconcile.interval.as_secs(),
        path_to_string(&config.logging.file),
    )
}

fn path_to_string(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

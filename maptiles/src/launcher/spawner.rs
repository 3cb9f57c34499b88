//! Worker process spawning.
//!
//! The download worker is an external executable. It is started with an
//! explicit argument vector (never through a shell), detached into its own
//! session so it outlives the submitting process, and writes its output to
//! a log file owned by its task.

use std::ffi::OsString;
use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{debug, warn};

use crate::config::{TaskSettings, WorkerSettings};
use crate::task::{Task, TaskId};

/// Starts and stops worker processes.
pub trait WorkerSpawner: Send + Sync {
    /// Starts the worker for `task` and returns its pid.
    fn spawn(&self, task: &Task) -> io::Result<u32>;

    /// Asks the worker (and its process group) to stop.
    ///
    /// A pid that no longer leads its own process group belongs to a
    /// process other than the worker and is left alone.
    fn terminate(&self, pid: u32) -> io::Result<()>;
}

/// Builds the worker argument vector for `task`.
///
/// ```text
/// [<script>] --zoom <min> <max> --url <template> --output-folder <folder>
///   --task-id <id> --token <worker token> -- <west> <south> <east> <north>
/// ```
///
/// The worker passes the token back with every progress report. The
/// corners follow `--` so a negative west or south longitude is never
/// mistaken for an option.
pub fn worker_args(script: Option<&Path>, task: &Task) -> Vec<OsString> {
    let mut args: Vec<OsString> = Vec::with_capacity(16);
    if let Some(script) = script {
        args.push(script.into());
    }
    args.push("--zoom".into());
    args.push(task.zoom.min.to_string().into());
    args.push(task.zoom.max.to_string().into());
    args.push("--url".into());
    args.push(task.url_template.clone().into());
    args.push("--output-folder".into());
    args.push(task.folder.clone().into_os_string());
    args.push("--task-id".into());
    args.push(task.id.to_string().into());
    args.push("--token".into());
    args.push(task.worker_token.clone().into());
    args.push("--".into());
    for corner in [task.bbox.west, task.bbox.south, task.bbox.east, task.bbox.north] {
        args.push(corner.to_string().into());
    }
    args
}

/// Path of the log file for one task.
pub fn task_log_path(log_dir: &Path, id: TaskId) -> PathBuf {
    log_dir.join(format!("task-{}.log", id))
}

/// Spawns workers as detached session leaders.
#[derive(Debug, Clone)]
pub struct DetachedSpawner {
    program: PathBuf,
    script: Option<PathBuf>,
    log_dir: PathBuf,
}

impl DetachedSpawner {
    pub fn new(program: PathBuf, script: Option<PathBuf>, log_dir: PathBuf) -> Self {
        Self {
            program,
            script,
            log_dir,
        }
    }

    pub fn from_settings(worker: &WorkerSettings, tasks: &TaskSettings) -> Self {
        Self::new(
            worker.program.clone(),
            worker.script.clone(),
            tasks.log_dir.clone(),
        )
    }

    fn command(&self, task: &Task, log: &fs::File) -> io::Result<Command> {
        let mut command = Command::new(&self.program);
        command
            .args(worker_args(self.script.as_deref(), task))
            .stdin(Stdio::null())
            .stdout(log.try_clone()?)
            .stderr(log.try_clone()?);

        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            // SAFETY: setsid is async-signal-safe and touches no state
            // shared with the parent.
            unsafe {
                command.pre_exec(|| {
                    if libc::setsid() == -1 {
                        return Err(io::Error::last_os_error());
                    }
                    Ok(())
                });
            }
        }

        Ok(command)
    }
}

impl WorkerSpawner for DetachedSpawner {
    fn spawn(&self, task: &Task) -> io::Result<u32> {
        fs::create_dir_all(&task.folder)?;
        fs::create_dir_all(&self.log_dir)?;
        let log_path = task_log_path(&self.log_dir, task.id);
        let log = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)?;

        let mut child = self.command(task, &log)?.spawn()?;
        let pid = child.id();
        debug!(
            task_id = %task.id,
            pid,
            program = %self.program.display(),
            log = %log_path.display(),
            "Worker spawned"
        );

        // Reap the child when it exits so a long-lived caller leaves no zombie
        let task_id = task.id;
        let reaper = std::thread::Builder::new()
            .name(format!("reap-task-{}", task_id))
            .spawn(move || match child.wait() {
                Ok(status) => debug!(task_id = %task_id, %status, "Worker exited"),
                Err(e) => warn!(task_id = %task_id, error = %e, "Failed to reap worker"),
            });
        if let Err(e) = reaper {
            warn!(task_id = %task.id, error = %e, "Failed to start reaper thread");
        }

        Ok(pid)
    }

    #[cfg(unix)]
    fn terminate(&self, pid: u32) -> io::Result<()> {
        let pgid = i32::try_from(pid)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "pid out of range"))?;

        // The worker leads its own session, so its pid is also its group id.
        // A recycled pid that is not a group leader is some other process.
        // SAFETY: getpgid has no memory-safety preconditions.
        let current = unsafe { libc::getpgid(pgid) };
        if current == -1 {
            let err = io::Error::last_os_error();
            if err.raw_os_error() == Some(libc::ESRCH) {
                debug!(pid, "Worker already exited");
                return Ok(());
            }
            return Err(err);
        }
        if current != pgid {
            warn!(
                pid,
                pgid = current,
                "Pid no longer leads a worker process group, not signalling"
            );
            return Ok(());
        }

        // SAFETY: kill has no memory-safety preconditions.
        let result = unsafe { libc::kill(-pgid, libc::SIGTERM) };
        if result == -1 {
            let err = io::Error::last_os_error();
            if err.raw_os_error() == Some(libc::ESRCH) {
                debug!(pid, "Worker already exited");
                return Ok(());
            }
            return Err(err);
        }
        Ok(())
    }

    #[cfg(not(unix))]
    fn terminate(&self, _pid: u32) -> io::Result<()> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "signalling workers requires a unix platform",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::{BoundingBox, ZoomRange};
    use crate::task::{TaskStatus, UserId};
    use tempfile::TempDir;

    fn task(folder: PathBuf) -> Task {
        Task {
            id: TaskId(42),
            owner: UserId(7),
            name: "coast".to_string(),
            url_template: "https://tile.example.org/{z}/{x}/{y}.png".to_string(),
            bbox: BoundingBox::new(-10.5, 51.0, -9.25, 50.0),
            zoom: ZoomRange::new(3, 9),
            folder,
            tile_count: 100,
            progress: 0.0,
            status: TaskStatus::Submitted,
            pid: None,
            failure_reason: None,
            created_at_ms: 0,
            updated_at_ms: 0,
            worker_token: "5f0c3a9e".to_string(),
        }
    }

    fn strings(args: Vec<OsString>) -> Vec<String> {
        args.into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_worker_args_order() {
        let args = strings(worker_args(None, &task(PathBuf::from("/data/7/42"))));
        assert_eq!(
            args,
            vec![
                "--zoom",
                "3",
                "9",
                "--url",
                "https://tile.example.org/{z}/{x}/{y}.png",
                "--output-folder",
                "/data/7/42",
                "--task-id",
                "42",
                "--token",
                "5f0c3a9e",
                "--",
                "-10.5",
                "50",
                "-9.25",
                "51",
            ]
        );
    }

    #[test]
    fn test_worker_args_script_first() {
        let args = strings(worker_args(
            Some(Path::new("/opt/download_tiles.py")),
            &task(PathBuf::from("/data/7/42")),
        ));
        assert_eq!(args[0], "/opt/download_tiles.py");
        assert_eq!(args[1], "--zoom");
    }

    #[test]
    fn test_task_log_path() {
        assert_eq!(
            task_log_path(Path::new("/var/log/maptiles"), TaskId(5)),
            PathBuf::from("/var/log/maptiles/task-5.log")
        );
    }

    #[test]
    fn test_spawn_missing_program_fails() {
        let dir = TempDir::new().unwrap();
        let spawner = DetachedSpawner::new(
            dir.path().join("no-such-worker"),
            None,
            dir.path().join("logs"),
        );
        let result = spawner.spawn(&task(dir.path().join("tiles")));
        assert!(result.is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_spawn_writes_task_log() {
        let dir = TempDir::new().unwrap();
        let spawner = DetachedSpawner::new(
            PathBuf::from("/bin/echo"),
            None,
            dir.path().join("logs"),
        );
        let task = task(dir.path().join("tiles"));
        let pid = spawner.spawn(&task).unwrap();
        assert!(pid > 0);
        assert!(task.folder.is_dir());

        let log = task_log_path(&dir.path().join("logs"), task.id);
        let mut contents = String::new();
        for _ in 0..50 {
            contents = fs::read_to_string(&log).unwrap_or_default();
            if contents.contains("--task-id") {
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(20));
        }
        assert!(contents.contains("--task-id 42"));
    }

    #[cfg(unix)]
    #[test]
    fn test_terminate_exited_process_is_ok() {
        let dir = TempDir::new().unwrap();
        let spawner = DetachedSpawner::new(PathBuf::from("/bin/true"), None, dir.path().into());
        let pid = spawner.spawn(&task(dir.path().join("tiles"))).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(200));
        assert!(spawner.terminate(pid).is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn test_terminate_stops_detached_worker() {
        let dir = TempDir::new().unwrap();
        let script = dir.path().join("worker.sh");
        fs::write(&script, "sleep 30\n").unwrap();
        let spawner = DetachedSpawner::new(
            PathBuf::from("/bin/sh"),
            Some(script),
            dir.path().join("logs"),
        );
        let pid = spawner.spawn(&task(dir.path().join("tiles"))).unwrap();
        let raw = i32::try_from(pid).unwrap();

        // Wait until setsid has run in the child
        for _ in 0..50 {
            if unsafe { libc::getpgid(raw) } == raw {
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(10));
        }
        spawner.terminate(pid).unwrap();

        let mut alive = true;
        for _ in 0..100 {
            if unsafe { libc::kill(raw, 0) } == -1 {
                alive = false;
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(20));
        }
        assert!(!alive);
    }

    #[cfg(unix)]
    #[test]
    fn test_terminate_skips_pid_outside_worker_group() {
        let dir = TempDir::new().unwrap();
        let spawner = DetachedSpawner::new(PathBuf::from("/bin/true"), None, dir.path().into());

        // A plain child shares our process group, so it does not lead one
        let mut child = Command::new("/bin/sleep").arg("30").spawn().unwrap();
        assert!(spawner.terminate(child.id()).is_ok());
        assert!(child.try_wait().unwrap().is_none());

        child.kill().unwrap();
        child.wait().unwrap();
    }
}

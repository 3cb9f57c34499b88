//! Task data model.

use crate::coord::{BoundingBox, ZoomRange};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Store-assigned identifier of a download task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub i64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of the user owning a task.
///
/// Users live outside this crate; only the id is consumed for ownership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle state of a task.
///
/// ```text
/// Submitted ──► Running ──► Done
///     │            ├──────► Failed
///     │            └──────► Cancelled
///     └──► Done | Failed | Cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Persisted, worker not (yet) confirmed running.
    Submitted,
    /// Worker process launched.
    Running,
    /// Worker reported 100%.
    Done,
    /// Worker reported failure, never started, or stopped sending heartbeats.
    Failed,
    /// Cancelled by the owner.
    Cancelled,
}

impl TaskStatus {
    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed | Self::Cancelled)
    }

    /// Returns true while a worker is expected to exist or start.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Submitted | Self::Running)
    }

    /// Returns true if the state machine allows moving to `next`.
    pub fn can_transition_to(&self, next: TaskStatus) -> bool {
        match self {
            Self::Submitted => next != Self::Submitted,
            Self::Running => next.is_terminal(),
            Self::Done | Self::Failed | Self::Cancelled => false,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Submitted => "submitted",
            Self::Running => "running",
            Self::Done => "done",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "submitted" => Ok(Self::Submitted),
            "running" => Ok(Self::Running),
            "done" => Ok(Self::Done),
            "failed" => Ok(Self::Failed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(format!("unknown task status '{}'", other)),
        }
    }
}

/// State a worker may report alongside a progress value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressStatus {
    /// Still downloading. Progress 100 completes the task.
    Running,
    /// The worker gave up.
    Failed,
}

/// Raw submission fields, as received in a request body.
///
/// Zoom levels are wide integers so out-of-range values reach the
/// validator instead of failing deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSubmission {
    pub task_name: String,
    pub url: String,
    pub zoom_min: i64,
    pub zoom_max: i64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
    pub south: f64,
}

/// Fields of a task about to be inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTask {
    pub owner: UserId,
    pub name: String,
    pub url_template: String,
    pub bbox: BoundingBox,
    pub zoom: ZoomRange,
    pub tile_count: u64,
    /// Root under which `<owner>/<task id>` is created.
    pub root_folder: PathBuf,
}

/// A persisted download task.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Task {
    pub id: TaskId,
    pub owner: UserId,
    pub name: String,
    pub url_template: String,
    pub bbox: BoundingBox,
    pub zoom: ZoomRange,
    pub folder: PathBuf,
    pub tile_count: u64,
    pub progress: f64,
    pub status: TaskStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
    pub created_at_ms: i64,
    /// Refreshed by every progress write; the worker heartbeat.
    pub updated_at_ms: i64,
    /// Secret handed to the worker at launch. Progress reports must carry it.
    #[serde(skip)]
    pub worker_token: String,
}

/// Destination folder of a task: `<root>/<owner>/<task id>`.
pub fn task_folder(root: &Path, owner: UserId, id: TaskId) -> PathBuf {
    root.join(owner.0.to_string()).join(id.0.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_terminal_and_active() {
        assert!(TaskStatus::Submitted.is_active());
        assert!(TaskStatus::Running.is_active());
        for status in [TaskStatus::Done, TaskStatus::Failed, TaskStatus::Cancelled] {
            assert!(status.is_terminal());
            assert!(!status.is_active());
        }
    }

    #[test]
    fn test_status_transitions() {
        assert!(TaskStatus::Submitted.can_transition_to(TaskStatus::Running));
        assert!(TaskStatus::Submitted.can_transition_to(TaskStatus::Failed));
        assert!(!TaskStatus::Submitted.can_transition_to(TaskStatus::Submitted));
        assert!(TaskStatus::Running.can_transition_to(TaskStatus::Done));
        assert!(!TaskStatus::Running.can_transition_to(TaskStatus::Submitted));
        assert!(!TaskStatus::Running.can_transition_to(TaskStatus::Running));
        assert!(!TaskStatus::Done.can_transition_to(TaskStatus::Failed));
        assert!(!TaskStatus::Cancelled.can_transition_to(TaskStatus::Running));
    }

    #[test]
    fn test_status_string_roundtrip() {
        for status in [
            TaskStatus::Submitted,
            TaskStatus::Running,
            TaskStatus::Done,
            TaskStatus::Failed,
            TaskStatus::Cancelled,
        ] {
            assert_eq!(status.as_str().parse::<TaskStatus>().unwrap(), status);
        }
        assert!("paused".parse::<TaskStatus>().is_err());
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_string(&TaskStatus::Cancelled).unwrap();
        assert_eq!(json, "\"cancelled\"");
    }

    #[test]
    fn test_task_folder_layout() {
        let folder = task_folder(Path::new("/srv/tiles"), UserId(7), TaskId(42));
        assert_eq!(folder, PathBuf::from("/srv/tiles/7/42"));
    }

    #[test]
    fn test_submission_from_json() {
        let body = r#"{
            "task_name": "shenzhen",
            "url": "https://tile.openstreetmap.org/{z}/{x}/{y}.png",
            "zoom_min": 12, "zoom_max": 15,
            "west": 114.903983, "north": 22.677423,
            "east": 114.9693, "south": 22.638533
        }"#;
        let submission: TaskSubmission = serde_json::from_str(body).unwrap();
        assert_eq!(submission.task_name, "shenzhen");
        assert_eq!(submission.zoom_max, 15);
    }
}

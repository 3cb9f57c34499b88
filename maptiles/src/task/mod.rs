//! Download task types and submission validation.

mod model;
pub mod validation;

pub use model::{
    task_folder, NewTask, ProgressStatus, Task, TaskId, TaskStatus, TaskSubmission, UserId,
};
pub use validation::{Field, TaskValidator, ValidatedTask, ValidationError};

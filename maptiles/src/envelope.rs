//! Uniform `{code, message, data}` response envelope.

use serde::Serialize;

use crate::error::{ErrorCode, TaskError};

/// Message carried by successful responses.
pub const OK_MESSAGE: &str = "ok";

/// Outcome of one operation as presented to clients.
///
/// `code` is zero on success. `data` is omitted when there is nothing to
/// return, including on every failure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response<T> {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> Response<T> {
    pub fn ok(data: T) -> Self {
        Self {
            code: ErrorCode::Ok,
            message: OK_MESSAGE.to_string(),
            data: Some(data),
        }
    }

    /// A failure with an explicit code, for errors outside [`TaskError`].
    pub fn failure(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    pub fn from_error(err: &TaskError) -> Self {
        Self::failure(err.code(), err.to_string())
    }

    pub fn is_ok(&self) -> bool {
        self.code.is_ok()
    }
}

impl<T> From<Result<T, TaskError>> for Response<T> {
    fn from(result: Result<T, TaskError>) -> Self {
        match result {
            Ok(data) => Response::ok(data),
            Err(err) => Response::from_error(&err),
        }
    }
}

//! Common types and utilities shared across CLI commands.

use serde::Serialize;

use maptiles::envelope::Response;
use maptiles::error::{ErrorCode, TaskError};

use crate::error::CliError;

/// Print a response envelope to stdout and return its code.
pub fn emit<T: Serialize>(response: &Response<T>) -> Result<ErrorCode, CliError> {
    let json = serde_json::to_string_pretty(response).map_err(CliError::Output)?;
    println!("{}", json);
    Ok(response.code)
}

/// Print the envelope for an operation result and return its code.
pub fn respond<T: Serialize>(result: Result<T, TaskError>) -> Result<ErrorCode, CliError> {
    emit(&Response::from(result))
}

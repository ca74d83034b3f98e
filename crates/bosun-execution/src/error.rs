use bosun_common::error::CommonError;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::time::error::Elapsed;

use crate::id::ExecutorId;

pub type ExecutionResult<T> = Result<T, ExecutionError>;

#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("internal error: {0}")]
    InternalError(String),
    // The message doubles as the wire-level rejection reason,
    // so it starts with a capital letter unlike the other variants.
    #[error("Duplicate executor ID: {0}")]
    DuplicateExecutor(ExecutorId),
    #[error("operation timed out: {0}")]
    Timeout(String),
    #[error(transparent)]
    CommonError(#[from] CommonError),
}

impl<T> From<mpsc::error::SendError<T>> for ExecutionError {
    fn from(e: mpsc::error::SendError<T>) -> Self {
        ExecutionError::InternalError(format!("failed to send message: {e}"))
    }
}

impl From<oneshot::error::RecvError> for ExecutionError {
    fn from(e: oneshot::error::RecvError) -> Self {
        ExecutionError::InternalError(format!("failed to receive reply: {e}"))
    }
}

impl From<Elapsed> for ExecutionError {
    fn from(e: Elapsed) -> Self {
        ExecutionError::Timeout(e.to_string())
    }
}

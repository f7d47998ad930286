//! Executor error types
//!
//! Error codes:
//! - KEYSHELF_UNSUPPORTED_PAYLOAD (REJECT)
//! - KEYSHELF_QUERY_INVALID (REJECT)
//! - KEYSHELF_STORAGE_FAILURE (ERROR)

use std::fmt;

use crate::planner::PlannerError;
use crate::storage::StorageError;

/// Severity levels for executor errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Query rejected, nothing written
    Reject,
    /// Storage failed while executing; the transaction was aborted
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Reject => write!(f, "REJECT"),
            Severity::Error => write!(f, "ERROR"),
        }
    }
}

/// Executor-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutorErrorCode {
    /// Insert payload is neither an object nor an array
    KeyshelfUnsupportedPayload,
    /// Malformed query (bad range, non-key match value)
    KeyshelfQueryInvalid,
    /// An engine primitive failed
    KeyshelfStorageFailure,
}

impl ExecutorErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            ExecutorErrorCode::KeyshelfUnsupportedPayload => "KEYSHELF_UNSUPPORTED_PAYLOAD",
            ExecutorErrorCode::KeyshelfQueryInvalid => "KEYSHELF_QUERY_INVALID",
            ExecutorErrorCode::KeyshelfStorageFailure => "KEYSHELF_STORAGE_FAILURE",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            ExecutorErrorCode::KeyshelfStorageFailure => Severity::Error,
            _ => Severity::Reject,
        }
    }
}

impl fmt::Display for ExecutorErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Executor error type with full context
#[derive(Debug, Clone)]
pub struct ExecutorError {
    code: ExecutorErrorCode,
    message: String,
    /// Underlying cause name: the engine error name for storage failures,
    /// the planner code for rejected plans
    cause: Option<&'static str>,
}

impl ExecutorError {
    pub fn unsupported_payload(type_name: &str) -> Self {
        Self {
            code: ExecutorErrorCode::KeyshelfUnsupportedPayload,
            message: format!("Cannot save a value of type '{}'", type_name),
            cause: None,
        }
    }

    pub fn query_invalid(reason: impl Into<String>) -> Self {
        Self {
            code: ExecutorErrorCode::KeyshelfQueryInvalid,
            message: reason.into(),
            cause: None,
        }
    }

    pub fn storage_failure(err: &StorageError) -> Self {
        Self {
            code: ExecutorErrorCode::KeyshelfStorageFailure,
            message: err.to_string(),
            cause: Some(err.engine_error_name()),
        }
    }

    pub fn code(&self) -> ExecutorErrorCode {
        self.code
    }

    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn cause(&self) -> Option<&'static str> {
        self.cause
    }
}

impl From<StorageError> for ExecutorError {
    fn from(err: StorageError) -> Self {
        Self::storage_failure(&err)
    }
}

impl From<PlannerError> for ExecutorError {
    fn from(err: PlannerError) -> Self {
        Self {
            code: ExecutorErrorCode::KeyshelfQueryInvalid,
            message: err.message().to_string(),
            cause: Some(err.code().code()),
        }
    }
}

impl fmt::Display for ExecutorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.code.severity(),
            self.code.code(),
            self.message
        )?;
        if let Some(cause) = self.cause {
            write!(f, " ({})", cause)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExecutorError {}

/// Result type for executor operations
pub type ExecutorResult<T> = Result<T, ExecutorError>;

//! CLI-specific error types
//!
//! All CLI errors are fatal for the running command.

use std::fmt;
use std::io;

use crate::connection::ConnectionError;

/// CLI error codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliErrorCode {
    /// I/O error (stdin/stdout)
    IoError,
    /// Request is not a valid query
    BadRequest,
    /// Snapshot file already exists
    AlreadyInitialized,
    /// Connecting to the database failed
    ConnectFailed,
    /// One or more queries in a batch failed
    BatchFailed,
}

impl CliErrorCode {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::IoError => "KEYSHELF_CLI_IO_ERROR",
            Self::BadRequest => "KEYSHELF_CLI_BAD_REQUEST",
            Self::AlreadyInitialized => "KEYSHELF_CLI_ALREADY_INITIALIZED",
            Self::ConnectFailed => "KEYSHELF_CLI_CONNECT_FAILED",
            Self::BatchFailed => "KEYSHELF_CLI_BATCH_FAILED",
        }
    }
}

/// CLI error
#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::BadRequest, msg)
    }

    pub fn already_initialized(path: &std::path::Path) -> Self {
        Self::new(
            CliErrorCode::AlreadyInitialized,
            format!("Snapshot {} already exists", path.display()),
        )
    }

    pub fn batch_failed(failed: usize, total: usize) -> Self {
        Self::new(
            CliErrorCode::BatchFailed,
            format!("{} of {} queries failed", failed, total),
        )
    }

    /// Get the error code
    pub fn code(&self) -> &CliErrorCode {
        &self.code
    }

    /// Get the error code string
    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::bad_request(format!("JSON error: {}", e))
    }
}

impl From<ConnectionError> for CliError {
    fn from(e: ConnectionError) -> Self {
        Self::new(
            CliErrorCode::ConnectFailed,
            format!("{} ({})", e, e.code()),
        )
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;

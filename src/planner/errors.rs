//! Planner error types
//!
//! Error codes:
//! - KEYSHELF_QUERY_INVALID (REJECT)
//! - KEYSHELF_QUERY_UNKNOWN_INDEX (REJECT)

use std::fmt;

/// Severity levels for planner errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Query rejected before any storage access
    Reject,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Reject => write!(f, "REJECT"),
        }
    }
}

/// Planner-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlannerErrorCode {
    /// Malformed query or range
    KeyshelfQueryInvalid,
    /// Range targets an index the collection does not declare
    KeyshelfQueryUnknownIndex,
}

impl PlannerErrorCode {
    /// Returns the stable string code
    pub fn code(&self) -> &'static str {
        match self {
            PlannerErrorCode::KeyshelfQueryInvalid => "KEYSHELF_QUERY_INVALID",
            PlannerErrorCode::KeyshelfQueryUnknownIndex => "KEYSHELF_QUERY_UNKNOWN_INDEX",
        }
    }

    /// Returns the severity level for this error
    pub fn severity(&self) -> Severity {
        Severity::Reject
    }
}

impl fmt::Display for PlannerErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Planner error type with full context
#[derive(Debug, Clone, PartialEq)]
pub struct PlannerError {
    code: PlannerErrorCode,
    message: String,
    /// Field or index name if applicable
    field: Option<String>,
}

impl PlannerError {
    /// Create a query invalid error
    pub fn query_invalid(reason: impl Into<String>) -> Self {
        Self {
            code: PlannerErrorCode::KeyshelfQueryInvalid,
            message: reason.into(),
            field: None,
        }
    }

    /// Create an unknown index error
    pub fn unknown_index(collection: &str, index: impl Into<String>) -> Self {
        let index = index.into();
        Self {
            code: PlannerErrorCode::KeyshelfQueryUnknownIndex,
            message: format!(
                "Index '{}' is not declared on collection '{}'",
                index, collection
            ),
            field: Some(index),
        }
    }

    pub fn code(&self) -> PlannerErrorCode {
        self.code
    }

    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }
}

impl fmt::Display for PlannerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.code.severity(),
            self.code.code(),
            self.message
        )
    }
}

impl std::error::Error for PlannerError {}

/// Result type for planner operations
pub type PlannerResult<T> = Result<T, PlannerError>;

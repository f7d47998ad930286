//! Schema error types
//!
//! Error codes:
//! - KEYSHELF_SCHEMA_MALFORMED (REJECT)
//! - KEYSHELF_SCHEMA_REGISTRATION_FAILED (ERROR)
//! - KEYSHELF_UNIMPLEMENTED_MIGRATION (FATAL)

use std::fmt;

/// Severity levels for schema errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Schema description rejected before touching the engine
    Reject,
    /// Engine refused a declaration
    Error,
    /// The database cannot be opened
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Reject => write!(f, "REJECT"),
            Severity::Error => write!(f, "ERROR"),
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// Schema-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaErrorCode {
    /// Schema description is structurally invalid
    KeyshelfSchemaMalformed,
    /// Creating a collection or index failed in the engine
    KeyshelfSchemaRegistrationFailed,
    /// Upgrade from a non-zero version was requested
    KeyshelfUnimplementedMigration,
}

impl SchemaErrorCode {
    /// Returns the stable string code
    pub fn code(&self) -> &'static str {
        match self {
            SchemaErrorCode::KeyshelfSchemaMalformed => "KEYSHELF_SCHEMA_MALFORMED",
            SchemaErrorCode::KeyshelfSchemaRegistrationFailed => {
                "KEYSHELF_SCHEMA_REGISTRATION_FAILED"
            }
            SchemaErrorCode::KeyshelfUnimplementedMigration => "KEYSHELF_UNIMPLEMENTED_MIGRATION",
        }
    }

    /// Returns the severity level for this error
    pub fn severity(&self) -> Severity {
        match self {
            SchemaErrorCode::KeyshelfSchemaMalformed => Severity::Reject,
            SchemaErrorCode::KeyshelfSchemaRegistrationFailed => Severity::Error,
            SchemaErrorCode::KeyshelfUnimplementedMigration => Severity::Fatal,
        }
    }
}

impl fmt::Display for SchemaErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Schema error with context
#[derive(Debug, Clone)]
pub struct SchemaError {
    code: SchemaErrorCode,
    message: String,
    /// Collection the error refers to, if any
    collection: Option<String>,
}

impl SchemaError {
    /// Malformed schema description; `origin` is a file path or `<inline>`
    pub fn malformed_schema(origin: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            code: SchemaErrorCode::KeyshelfSchemaMalformed,
            message: format!("Malformed schema in {}: {}", origin.into(), reason.into()),
            collection: None,
        }
    }

    pub fn registration_failed(collection: impl Into<String>, reason: impl Into<String>) -> Self {
        let collection = collection.into();
        Self {
            code: SchemaErrorCode::KeyshelfSchemaRegistrationFailed,
            message: format!(
                "Could not register collection '{}': {}",
                collection,
                reason.into()
            ),
            collection: Some(collection),
        }
    }

    pub fn unimplemented_migration(from_version: u32, to_version: u32) -> Self {
        Self {
            code: SchemaErrorCode::KeyshelfUnimplementedMigration,
            message: format!(
                "Migration from version {} to {} is not implemented",
                from_version, to_version
            ),
            collection: None,
        }
    }

    pub fn code(&self) -> SchemaErrorCode {
        self.code
    }

    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn collection(&self) -> Option<&str> {
        self.collection.as_deref()
    }

    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

impl fmt::Display for SchemaError {
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

impl std::error::Error for SchemaError {}

/// Result type for schema operations
pub type SchemaResult<T> = Result<T, SchemaError>;

//! # Engine Errors
//!
//! Error types reported by the ordered key-value engine. Every primitive
//! completes with either a value or one of these.

use thiserror::Error;

use super::fault::FaultPoint;

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors reported by engine primitives
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    // ==================
    // Lookup Errors
    // ==================
    /// Object store does not exist
    #[error("Object store '{0}' not found")]
    StoreNotFound(String),

    /// Index does not exist on the store
    #[error("Index '{index}' not found on object store '{store}'")]
    IndexNotFound { store: String, index: String },

    /// Store is not part of the transaction scope
    #[error("Object store '{0}' is outside the transaction scope")]
    NotInScope(String),

    // ==================
    // Write Errors
    // ==================
    /// Key or unique index constraint violated
    #[error("Constraint violated: {0}")]
    Constraint(String),

    /// Record or key is not usable (missing key path, invalid key)
    #[error("Data error: {0}")]
    Data(String),

    /// Write attempted in a read-only transaction
    #[error("Transaction on '{0}' is read-only")]
    ReadOnly(String),

    // ==================
    // Schema Errors
    // ==================
    /// Store or index declared twice
    #[error("'{0}' already exists")]
    AlreadyExists(String),

    /// Version change requested with a lower version
    #[error("Requested version {requested} is lower than current version {current}")]
    VersionDowngrade { requested: u32, current: u32 },

    // ==================
    // Internal Errors
    // ==================
    /// Failure injected through the fault injector
    #[error("Injected failure at {0}")]
    Injected(FaultPoint),

    /// Snapshot could not be read or written
    #[error("Snapshot error: {0}")]
    Snapshot(String),
}

impl EngineError {
    /// Returns the engine error name, in the vocabulary of object-store engines
    pub fn name(&self) -> &'static str {
        match self {
            EngineError::StoreNotFound(_)
            | EngineError::IndexNotFound { .. }
            | EngineError::NotInScope(_) => "NotFoundError",
            EngineError::Constraint(_) | EngineError::AlreadyExists(_) => "ConstraintError",
            EngineError::Data(_) => "DataError",
            EngineError::ReadOnly(_) => "ReadOnlyError",
            EngineError::VersionDowngrade { .. } => "VersionError",
            EngineError::Injected(_) | EngineError::Snapshot(_) => "UnknownError",
        }
    }
}

//! Storage adapter errors
//!
//! Every engine failure crossing the adapter is wrapped with the operation
//! and collection it happened on. Nothing is retried at this layer.

use thiserror::Error;

use crate::engine::EngineError;

/// Result type for storage adapter operations
pub type StorageResult<T> = Result<T, StorageError>;

/// An engine primitive failed
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{operation} on '{collection}' failed: {source}")]
pub struct StorageError {
    pub operation: &'static str,
    pub collection: String,
    #[source]
    pub source: EngineError,
}

impl StorageError {
    pub fn new(operation: &'static str, collection: impl Into<String>, source: EngineError) -> Self {
        Self {
            operation,
            collection: collection.into(),
            source,
        }
    }

    /// Engine error name (`ConstraintError`, `DataError`, ...)
    pub fn engine_error_name(&self) -> &'static str {
        self.source.name()
    }
}

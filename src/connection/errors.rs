//! Connection errors

use thiserror::Error;

use crate::engine::EngineError;
use crate::executor::ExecutorError;
use crate::schema::SchemaError;

/// Result type for connection operations
pub type ConnectionResult<T> = Result<T, ConnectionError>;

#[derive(Debug, Error)]
pub enum ConnectionError {
    /// Connect configuration unreadable or invalid
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Schema description rejected, or migration refused
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// Opening, upgrading or snapshotting the engine failed
    #[error("Storage engine failure: {0}")]
    Engine(#[from] EngineError),

    /// A seed insert failed; nothing from that collection's data was written
    #[error("Seeding '{collection}' failed: {source}")]
    Seed {
        collection: String,
        #[source]
        source: ExecutorError,
    },
}

impl ConnectionError {
    pub fn config(msg: impl Into<String>) -> Self {
        ConnectionError::Config(msg.into())
    }

    /// Stable error code
    pub fn code(&self) -> &'static str {
        match self {
            ConnectionError::Config(_) => "KEYSHELF_CONFIG_INVALID",
            ConnectionError::Schema(err) => err.code().code(),
            ConnectionError::Engine(_) => "KEYSHELF_STORAGE_FAILURE",
            ConnectionError::Seed { source, .. } => source.code().code(),
        }
    }
}

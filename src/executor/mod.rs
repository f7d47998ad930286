//! Query Executor subsystem for keyshelf
//!
//! Consumes declarative queries, plans reads through the access-path
//! selector and drives the storage adapter.
//!
//! # Execution Flow (select)
//!
//! 1. Open a read-only transaction on the collection
//! 2. Select the access path
//! 3. Point read, or step the cursors of the chosen path
//! 4. Post-filter in memory
//! 5. Apply limit
//!
//! Writes run in one read-write transaction per call and either commit
//! completely or leave the collection untouched.

mod errors;
mod executor;
mod filters;
mod merge;
mod options;
mod result;

pub use errors::{ExecutorError, ExecutorErrorCode, ExecutorResult, Severity};
pub use executor::QueryExecutor;
pub use filters::{PostFilter, PostFilterMode};
pub use merge::shallow_merge;
pub use options::QueryOptions;
pub use result::QueryOutput;

//! Storage adapter
//!
//! Thin async layer between the query executor and the engine. It scopes
//! one transaction per collection handle, wraps cursors in sessions that
//! release on drop, and converts engine errors into `StorageError`.

mod adapter;
mod cursor;
mod errors;

pub use adapter::{StorageContext, StoreHandle};
pub use cursor::CursorSession;
pub use errors::{StorageError, StorageResult};

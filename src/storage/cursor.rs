//! Cursor sessions
//!
//! A `CursorSession` owns one open engine cursor for the duration of a
//! single scan. Dropping the session releases the cursor, so early returns
//! (limit reached, error) cannot leak it.

use crate::engine::{Cursor, CursorEntry};

use super::errors::{StorageError, StorageResult};

pub struct CursorSession<'t> {
    collection: String,
    cursor: Cursor<'t>,
}

impl<'t> CursorSession<'t> {
    pub(crate) fn new(collection: impl Into<String>, cursor: Cursor<'t>) -> Self {
        Self {
            collection: collection.into(),
            cursor,
        }
    }

    /// Next entry of the scan, `None` when exhausted
    pub async fn next(&mut self) -> StorageResult<Option<CursorEntry>> {
        self.cursor
            .next()
            .await
            .map_err(|e| StorageError::new("cursor step", self.collection.as_str(), e))
    }

    pub fn close(self) {
        self.cursor.close();
    }
}

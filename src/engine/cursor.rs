//! Engine cursors
//!
//! A cursor walks a store (primary key order) or an index
//! ((index key, primary key) order) one entry per `next` call. It borrows
//! its transaction, so it can never outlive it.

use serde_json::Value;

use super::errors::{EngineError, EngineResult};
use super::fault::FaultPoint;
use super::key::{Key, KeyRange};
use super::lease::Lease;
use super::transaction::Transaction;

/// What a cursor iterates
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CursorSource {
    /// The store itself, keyed by primary key
    Store,
    /// A named secondary index
    Index(String),
}

/// One cursor position
#[derive(Debug, Clone, PartialEq)]
pub struct CursorEntry {
    /// Cursor key: the primary key for store cursors, the index key otherwise
    pub key: Key,
    pub primary_key: Key,
    pub value: Value,
}

pub struct Cursor<'t> {
    txn: &'t Transaction,
    store: String,
    source: CursorSource,
    range: KeyRange,
    position: Option<(Key, Key)>,
    exhausted: bool,
    _lease: Lease,
}

impl<'t> Cursor<'t> {
    pub(crate) fn new(
        txn: &'t Transaction,
        store: String,
        source: CursorSource,
        range: KeyRange,
        lease: Lease,
    ) -> Self {
        Self {
            txn,
            store,
            source,
            range,
            position: None,
            exhausted: false,
            _lease: lease,
        }
    }

    /// Advances to the next entry; `None` once the range is exhausted
    pub async fn next(&mut self) -> EngineResult<Option<CursorEntry>> {
        if self.exhausted {
            return Ok(None);
        }
        self.txn.engine().checkpoint(FaultPoint::CursorStep).await?;

        let store = self.txn.store(&self.store)?;
        let next = match &self.source {
            CursorSource::Store => store
                .next_after(&self.range, self.position.as_ref().map(|(key, _)| key))
                .map(|(key, value)| CursorEntry {
                    primary_key: key.clone(),
                    key,
                    value,
                }),
            CursorSource::Index(name) => {
                let index = store.index(name).ok_or_else(|| EngineError::IndexNotFound {
                    store: self.store.clone(),
                    index: name.clone(),
                })?;
                index
                    .next_after(
                        &self.range,
                        self.position.as_ref().map(|(key, primary)| (key, primary)),
                    )
                    .and_then(|(key, primary_key)| {
                        store.get(&primary_key).map(|value| CursorEntry {
                            key,
                            value: value.clone(),
                            primary_key,
                        })
                    })
            }
        };

        match next {
            Some(entry) => {
                self.position = Some((entry.key.clone(), entry.primary_key.clone()));
                Ok(Some(entry))
            }
            None => {
                self.exhausted = true;
                Ok(None)
            }
        }
    }

    /// Releases the cursor
    pub fn close(self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Engine, IndexOptions, StoreOptions, TransactionMode};
    use serde_json::json;

    async fn seeded() -> Engine {
        let engine = Engine::new("test");
        let mut upgrade = engine.upgrade(1).await.unwrap();
        upgrade
            .create_store("users", StoreOptions::key_path("id"))
            .unwrap();
        upgrade
            .create_index("users", "byRole", "role", IndexOptions::default())
            .unwrap();
        upgrade.commit().await.unwrap();

        let mut txn = engine
            .transaction(&["users"], TransactionMode::ReadWrite)
            .await
            .unwrap();
        for (id, role) in [(1, "user"), (2, "admin"), (3, "admin")] {
            txn.add("users", json!({"id": id, "role": role}), None)
                .await
                .unwrap();
        }
        txn.commit().await.unwrap();
        engine
    }

    #[tokio::test]
    async fn test_store_cursor_walks_in_key_order() {
        let engine = seeded().await;
        let txn = engine
            .transaction(&["users"], TransactionMode::ReadOnly)
            .await
            .unwrap();
        let mut cursor = txn
            .open_cursor("users", CursorSource::Store, KeyRange::all())
            .await
            .unwrap();

        let mut keys = Vec::new();
        while let Some(entry) = cursor.next().await.unwrap() {
            keys.push(entry.key);
        }
        assert_eq!(keys, vec![Key::int(1), Key::int(2), Key::int(3)]);
        assert_eq!(engine.open_cursors(), 1);
        cursor.close();
        assert_eq!(engine.open_cursors(), 0);
    }

    #[tokio::test]
    async fn test_index_cursor_point_range() {
        let engine = seeded().await;
        let txn = engine
            .transaction(&["users"], TransactionMode::ReadOnly)
            .await
            .unwrap();
        let mut cursor = txn
            .open_cursor(
                "users",
                CursorSource::Index("byRole".into()),
                KeyRange::only(Key::string("admin")),
            )
            .await
            .unwrap();

        let mut primaries = Vec::new();
        while let Some(entry) = cursor.next().await.unwrap() {
            assert_eq!(entry.key, Key::string("admin"));
            primaries.push(entry.primary_key);
        }
        assert_eq!(primaries, vec![Key::int(2), Key::int(3)]);
    }

    #[tokio::test]
    async fn test_unknown_index_rejected() {
        let engine = seeded().await;
        let txn = engine
            .transaction(&["users"], TransactionMode::ReadOnly)
            .await
            .unwrap();
        let result = txn
            .open_cursor("users", CursorSource::Index("byAge".into()), KeyRange::all())
            .await;
        assert!(matches!(result, Err(EngineError::IndexNotFound { .. })));
        assert_eq!(engine.open_cursors(), 0);
    }

    #[tokio::test]
    async fn test_step_fault_surfaces() {
        let engine = seeded().await;
        let txn = engine
            .transaction(&["users"], TransactionMode::ReadOnly)
            .await
            .unwrap();
        let mut cursor = txn
            .open_cursor("users", CursorSource::Store, KeyRange::all())
            .await
            .unwrap();
        engine.faults().fail_after(FaultPoint::CursorStep, 1);

        assert!(cursor.next().await.unwrap().is_some());
        assert_eq!(
            cursor.next().await,
            Err(EngineError::Injected(FaultPoint::CursorStep))
        );
    }
}

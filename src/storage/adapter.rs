//! Async facade over the engine primitives
//!
//! `StorageContext` is an explicit, cloneable handle to one database.
//! `StoreHandle` is one transaction scoped to one collection. Every call
//! returns a single `StorageResult`.

use serde_json::Value;

use crate::engine::{CursorSource, Engine, Key, KeyRange, Transaction, TransactionMode};

use super::cursor::CursorSession;
use super::errors::{StorageError, StorageResult};

#[derive(Debug, Clone)]
pub struct StorageContext {
    engine: Engine,
}

impl StorageContext {
    pub fn new(engine: Engine) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Opens a collection inside a fresh transaction
    pub async fn open(&self, collection: &str, mode: TransactionMode) -> StorageResult<StoreHandle> {
        let txn = self
            .engine
            .transaction(&[collection], mode)
            .await
            .map_err(|e| StorageError::new("begin", collection, e))?;
        Ok(StoreHandle {
            collection: collection.to_string(),
            txn,
        })
    }

    pub async fn read(&self, collection: &str) -> StorageResult<StoreHandle> {
        self.open(collection, TransactionMode::ReadOnly).await
    }

    pub async fn write(&self, collection: &str) -> StorageResult<StoreHandle> {
        self.open(collection, TransactionMode::ReadWrite).await
    }
}

/// One collection inside one transaction.
///
/// `complete` commits. Dropping the handle aborts.
pub struct StoreHandle {
    collection: String,
    txn: Transaction,
}

impl StoreHandle {
    pub fn collection(&self) -> &str {
        &self.collection
    }

    fn failure(&self, operation: &'static str) -> impl FnOnce(crate::engine::EngineError) -> StorageError + '_ {
        move |e| StorageError::new(operation, self.collection.as_str(), e)
    }

    pub async fn get(&self, key: &Key) -> StorageResult<Option<Value>> {
        self.txn
            .get(&self.collection, key)
            .await
            .map_err(self.failure("get"))
    }

    /// Inserts a record whose key comes from the store's key path or generator
    pub async fn add(&mut self, value: Value) -> StorageResult<Key> {
        let result = self.txn.add(&self.collection, value, None).await;
        result.map_err(self.failure("add"))
    }

    /// Upserts a record; `key` is required for out-of-line stores
    pub async fn put(&mut self, value: Value, key: Option<Key>) -> StorageResult<Key> {
        let result = self.txn.put(&self.collection, value, key).await;
        result.map_err(self.failure("put"))
    }

    pub async fn delete(&mut self, key: &Key) -> StorageResult<()> {
        let result = self.txn.delete(&self.collection, key).await;
        result.map_err(self.failure("delete"))
    }

    pub async fn count(&self) -> StorageResult<usize> {
        self.txn
            .count(&self.collection)
            .await
            .map_err(self.failure("count"))
    }

    /// All primary keys, ascending
    pub async fn keys(&self) -> StorageResult<Vec<Key>> {
        self.txn
            .get_all_keys(&self.collection)
            .await
            .map_err(self.failure("get all keys"))
    }

    /// Cursor over the collection in primary-key order
    pub async fn open_cursor(&self, range: KeyRange) -> StorageResult<CursorSession<'_>> {
        let cursor = self
            .txn
            .open_cursor(&self.collection, CursorSource::Store, range)
            .await
            .map_err(self.failure("open cursor"))?;
        Ok(CursorSession::new(self.collection.as_str(), cursor))
    }

    /// Cursor over a secondary index in (index key, primary key) order
    pub async fn open_index_cursor(
        &self,
        index: &str,
        range: KeyRange,
    ) -> StorageResult<CursorSession<'_>> {
        let cursor = self
            .txn
            .open_cursor(&self.collection, CursorSource::Index(index.to_string()), range)
            .await
            .map_err(self.failure("open index cursor"))?;
        Ok(CursorSession::new(self.collection.as_str(), cursor))
    }

    pub fn has_index(&self, name: &str) -> bool {
        self.txn
            .store(&self.collection)
            .map_or(false, |store| store.has_index(name))
    }

    /// Key path of a declared index
    pub fn index_key_path(&self, name: &str) -> Option<String> {
        self.txn
            .store(&self.collection)
            .ok()
            .and_then(|store| store.index(name))
            .map(|index| index.key_path().to_string())
    }

    /// In-line key path of the collection, `None` for out-of-line keys
    pub fn key_path(&self) -> Option<String> {
        self.txn
            .store(&self.collection)
            .ok()
            .and_then(|store| store.options().key_path.clone())
    }

    /// Commits the transaction
    pub async fn complete(self) -> StorageResult<()> {
        let collection = self.collection;
        self.txn
            .commit()
            .await
            .map_err(|e| StorageError::new("commit", collection, e))
    }
}

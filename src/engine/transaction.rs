//! Engine transactions
//!
//! A read-only transaction shares the engine state with other readers.
//! A read-write transaction holds it exclusively and stages its writes on
//! private copies of the stores it touches; `commit` publishes them and
//! dropping the transaction without committing discards them.

use std::collections::BTreeMap;

use serde_json::Value;
use tokio::sync::{OwnedRwLockReadGuard, OwnedRwLockWriteGuard};

use super::cursor::{Cursor, CursorSource};
use super::errors::{EngineError, EngineResult};
use super::fault::FaultPoint;
use super::key::{Key, KeyRange};
use super::lease::Lease;
use super::store::ObjectStore;
use super::{Engine, EngineState, TransactionMode};

enum StateGuard {
    Shared(OwnedRwLockReadGuard<EngineState>),
    Exclusive(OwnedRwLockWriteGuard<EngineState>),
}

impl StateGuard {
    fn state(&self) -> &EngineState {
        match self {
            StateGuard::Shared(guard) => guard,
            StateGuard::Exclusive(guard) => guard,
        }
    }
}

/// A transaction scoped to a fixed set of object stores
pub struct Transaction {
    engine: Engine,
    mode: TransactionMode,
    scope: Vec<String>,
    guard: StateGuard,
    staged: BTreeMap<String, ObjectStore>,
    _lease: Lease,
}

impl Transaction {
    pub(crate) async fn begin(
        engine: &Engine,
        scope: &[&str],
        mode: TransactionMode,
    ) -> EngineResult<Self> {
        engine.checkpoint(FaultPoint::Begin).await?;

        let state = engine.shared_state();
        let guard = match mode {
            TransactionMode::ReadOnly => StateGuard::Shared(state.read_owned().await),
            TransactionMode::ReadWrite => StateGuard::Exclusive(state.write_owned().await),
        };

        for name in scope {
            if !guard.state().stores.contains_key(*name) {
                return Err(EngineError::StoreNotFound(name.to_string()));
            }
        }

        Ok(Self {
            engine: engine.clone(),
            mode,
            scope: scope.iter().map(|s| s.to_string()).collect(),
            guard,
            staged: BTreeMap::new(),
            _lease: engine.lease_transaction(),
        })
    }

    pub fn mode(&self) -> TransactionMode {
        self.mode
    }

    pub fn scope(&self) -> &[String] {
        &self.scope
    }

    pub(crate) fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Read view of a store, including this transaction's staged writes
    pub fn store(&self, name: &str) -> EngineResult<&ObjectStore> {
        if !self.scope.iter().any(|s| s == name) {
            return Err(EngineError::NotInScope(name.to_string()));
        }
        self.staged
            .get(name)
            .or_else(|| self.guard.state().stores.get(name))
            .ok_or_else(|| EngineError::StoreNotFound(name.to_string()))
    }

    fn store_mut(&mut self, name: &str) -> EngineResult<&mut ObjectStore> {
        if self.mode == TransactionMode::ReadOnly {
            return Err(EngineError::ReadOnly(name.to_string()));
        }
        if !self.scope.iter().any(|s| s == name) {
            return Err(EngineError::NotInScope(name.to_string()));
        }
        if !self.staged.contains_key(name) {
            let base = self
                .guard
                .state()
                .stores
                .get(name)
                .cloned()
                .ok_or_else(|| EngineError::StoreNotFound(name.to_string()))?;
            self.staged.insert(name.to_string(), base);
        }
        self.staged
            .get_mut(name)
            .ok_or_else(|| EngineError::StoreNotFound(name.to_string()))
    }

    /// Reads the record stored under `key`
    pub async fn get(&self, store: &str, key: &Key) -> EngineResult<Option<Value>> {
        self.engine.checkpoint(FaultPoint::Get).await?;
        Ok(self.store(store)?.get(key).cloned())
    }

    /// Inserts a new record; fails with a constraint error if the key exists
    pub async fn add(&mut self, store: &str, value: Value, key: Option<Key>) -> EngineResult<Key> {
        self.engine.checkpoint(FaultPoint::Add).await?;
        self.store_mut(store)?.add(value, key)
    }

    /// Inserts or replaces a record
    pub async fn put(&mut self, store: &str, value: Value, key: Option<Key>) -> EngineResult<Key> {
        self.engine.checkpoint(FaultPoint::Put).await?;
        self.store_mut(store)?.put(value, key)
    }

    /// Removes the record under `key`; absent keys are not an error
    pub async fn delete(&mut self, store: &str, key: &Key) -> EngineResult<()> {
        self.engine.checkpoint(FaultPoint::Delete).await?;
        self.store_mut(store)?.delete(key);
        Ok(())
    }

    pub async fn count(&self, store: &str) -> EngineResult<usize> {
        self.engine.checkpoint(FaultPoint::Count).await?;
        Ok(self.store(store)?.count())
    }

    /// Every primary key of the store, ascending
    pub async fn get_all_keys(&self, store: &str) -> EngineResult<Vec<Key>> {
        self.engine.checkpoint(FaultPoint::GetAllKeys).await?;
        Ok(self.store(store)?.keys())
    }

    /// Opens a cursor over a store or one of its indexes
    pub async fn open_cursor(
        &self,
        store: &str,
        source: CursorSource,
        range: KeyRange,
    ) -> EngineResult<Cursor<'_>> {
        self.engine.checkpoint(FaultPoint::OpenCursor).await?;
        let object_store = self.store(store)?;
        if let CursorSource::Index(index) = &source {
            if !object_store.has_index(index) {
                return Err(EngineError::IndexNotFound {
                    store: store.to_string(),
                    index: index.clone(),
                });
            }
        }
        Ok(Cursor::new(
            self,
            store.to_string(),
            source,
            range,
            self.engine.lease_cursor(),
        ))
    }

    /// Publishes staged writes and releases the transaction
    pub async fn commit(mut self) -> EngineResult<()> {
        self.engine.checkpoint(FaultPoint::Commit).await?;
        let staged = std::mem::take(&mut self.staged);
        if let StateGuard::Exclusive(guard) = &mut self.guard {
            for (name, store) in staged {
                guard.stores.insert(name, store);
            }
        }
        Ok(())
    }
}

//! # Ordered Key-Value Engine
//!
//! An in-process, transactional, ordered key-value engine with the shape of
//! a browser object-store database: named object stores holding JSON
//! records under ordered keys, secondary indexes over key paths, scoped
//! transactions, cursors, and versioned schema upgrades.
//!
//! All primitives are async and yield to the runtime once per call, so
//! callers observe the same completion model a callback-driven engine
//! would give them.
//!
//! # Concurrency
//!
//! Read-only transactions run concurrently. A read-write transaction or a
//! version change holds the engine exclusively until it is committed or
//! dropped.

mod cursor;
mod errors;
mod fault;
mod key;
mod lease;
mod snapshot;
mod store;
mod transaction;

pub use cursor::{Cursor, CursorEntry, CursorSource};
pub use errors::{EngineError, EngineResult};
pub use fault::{FaultInjector, FaultPoint};
pub use key::{key_at_path, set_value_at_path, value_at_path, Key, KeyNumber, KeyRange};
pub use store::{IndexOptions, ObjectStore, SecondaryIndex, StoreOptions};
pub use transaction::Transaction;

use std::collections::BTreeMap;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use tokio::sync::{OwnedRwLockWriteGuard, RwLock};

use lease::{Lease, Leases};

/// Transaction access mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionMode {
    ReadOnly,
    ReadWrite,
}

/// Committed engine contents
#[derive(Debug, Clone, Default)]
pub(crate) struct EngineState {
    pub(crate) version: u32,
    pub(crate) stores: BTreeMap<String, ObjectStore>,
}

#[derive(Debug)]
struct EngineInner {
    name: String,
    state: Arc<RwLock<EngineState>>,
    faults: FaultInjector,
    leases: Leases,
}

/// Handle to one named database. Clones share the same database.
#[derive(Debug, Clone)]
pub struct Engine {
    inner: Arc<EngineInner>,
}

impl Engine {
    /// Creates an empty database at version 0
    pub fn new(name: impl Into<String>) -> Self {
        Self::from_state(name, EngineState::default())
    }

    pub(crate) fn from_state(name: impl Into<String>, state: EngineState) -> Self {
        Self {
            inner: Arc::new(EngineInner {
                name: name.into(),
                state: Arc::new(RwLock::new(state)),
                faults: FaultInjector::new(),
                leases: Leases::default(),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Current schema version
    pub async fn version(&self) -> u32 {
        self.inner.state.read().await.version
    }

    /// Names of every object store, ascending
    pub async fn store_names(&self) -> Vec<String> {
        self.inner.state.read().await.stores.keys().cloned().collect()
    }

    pub fn faults(&self) -> &FaultInjector {
        &self.inner.faults
    }

    /// Transactions and version changes currently open
    pub fn open_transactions(&self) -> usize {
        self.inner.leases.transactions.load(Ordering::SeqCst)
    }

    /// Cursors currently open
    pub fn open_cursors(&self) -> usize {
        self.inner.leases.cursors.load(Ordering::SeqCst)
    }

    /// Begins a transaction over `scope`
    pub async fn transaction(
        &self,
        scope: &[&str],
        mode: TransactionMode,
    ) -> EngineResult<Transaction> {
        Transaction::begin(self, scope, mode).await
    }

    /// Begins a version change to `version`.
    ///
    /// Schema edits apply to a draft and become visible on `commit`.
    pub async fn upgrade(&self, version: u32) -> EngineResult<VersionChange> {
        self.checkpoint(FaultPoint::Begin).await?;
        let guard = Arc::clone(&self.inner.state).write_owned().await;
        if version < guard.version {
            return Err(EngineError::VersionDowngrade {
                requested: version,
                current: guard.version,
            });
        }
        Ok(VersionChange {
            engine: self.clone(),
            draft: guard.clone(),
            old_version: guard.version,
            new_version: version,
            guard,
            _lease: self.lease_transaction(),
        })
    }

    pub(crate) fn shared_state(&self) -> Arc<RwLock<EngineState>> {
        Arc::clone(&self.inner.state)
    }

    pub(crate) fn lease_transaction(&self) -> Lease {
        Lease::acquire(&self.inner.leases.transactions)
    }

    pub(crate) fn lease_cursor(&self) -> Lease {
        Lease::acquire(&self.inner.leases.cursors)
    }

    /// Fault check plus one scheduler yield; every primitive starts here
    pub(crate) async fn checkpoint(&self, point: FaultPoint) -> EngineResult<()> {
        self.inner.faults.check(point)?;
        tokio::task::yield_now().await;
        Ok(())
    }
}

/// An exclusive schema upgrade in progress
pub struct VersionChange {
    engine: Engine,
    guard: OwnedRwLockWriteGuard<EngineState>,
    draft: EngineState,
    old_version: u32,
    new_version: u32,
    _lease: Lease,
}

impl VersionChange {
    /// Version before the upgrade; 0 for a fresh database
    pub fn old_version(&self) -> u32 {
        self.old_version
    }

    pub fn new_version(&self) -> u32 {
        self.new_version
    }

    pub fn has_store(&self, name: &str) -> bool {
        self.draft.stores.contains_key(name)
    }

    pub fn has_index(&self, store: &str, index: &str) -> bool {
        self.draft
            .stores
            .get(store)
            .map_or(false, |s| s.has_index(index))
    }

    pub fn store(&self, name: &str) -> Option<&ObjectStore> {
        self.draft.stores.get(name)
    }

    pub fn create_store(&mut self, name: &str, options: StoreOptions) -> EngineResult<()> {
        if self.draft.stores.contains_key(name) {
            return Err(EngineError::AlreadyExists(format!("object store '{}'", name)));
        }
        self.draft
            .stores
            .insert(name.to_string(), ObjectStore::new(options));
        Ok(())
    }

    pub fn create_index(
        &mut self,
        store: &str,
        name: &str,
        key_path: &str,
        options: IndexOptions,
    ) -> EngineResult<()> {
        self.draft
            .stores
            .get_mut(store)
            .ok_or_else(|| EngineError::StoreNotFound(store.to_string()))?
            .create_index(name, key_path, options)
    }

    /// Publishes the upgraded schema and the new version
    pub async fn commit(mut self) -> EngineResult<()> {
        self.engine.checkpoint(FaultPoint::Commit).await?;
        let mut draft = std::mem::take(&mut self.draft);
        draft.version = self.new_version;
        *self.guard = draft;
        Ok(())
    }
}

//! Open-handle accounting
//!
//! Every transaction and cursor holds a `Lease`. Dropping the handle drops
//! the lease, so the live counts reach zero exactly when every handle has
//! been released, whichever path released it.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Live handle counters for one engine
#[derive(Debug, Default)]
pub(crate) struct Leases {
    pub(crate) transactions: Arc<AtomicUsize>,
    pub(crate) cursors: Arc<AtomicUsize>,
}

/// A held slot in one of the counters
#[derive(Debug)]
pub(crate) struct Lease {
    counter: Arc<AtomicUsize>,
}

impl Lease {
    pub(crate) fn acquire(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self {
            counter: Arc::clone(counter),
        }
    }
}

impl Drop for Lease {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::SeqCst);
    }
}

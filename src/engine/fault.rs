//! Fault injection for exercising engine failure paths
//!
//! A fault is armed for a named primitive together with the number of hits
//! to let through first. The next hit after that fails with
//! `EngineError::Injected` and disarms the fault.
//!
//! # Usage
//!
//! ```ignore
//! engine.faults().fail_after(FaultPoint::CursorStep, 2);
//! // the third cursor step on this engine fails
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;

use super::errors::{EngineError, EngineResult};

/// Engine primitives that can be made to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultPoint {
    Begin,
    Get,
    Add,
    Put,
    Delete,
    Count,
    GetAllKeys,
    OpenCursor,
    CursorStep,
    Commit,
}

impl FaultPoint {
    pub fn as_str(&self) -> &'static str {
        match self {
            FaultPoint::Begin => "begin",
            FaultPoint::Get => "get",
            FaultPoint::Add => "add",
            FaultPoint::Put => "put",
            FaultPoint::Delete => "delete",
            FaultPoint::Count => "count",
            FaultPoint::GetAllKeys => "get_all_keys",
            FaultPoint::OpenCursor => "open_cursor",
            FaultPoint::CursorStep => "cursor_step",
            FaultPoint::Commit => "commit",
        }
    }
}

impl fmt::Display for FaultPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-engine registry of armed faults
#[derive(Debug, Default)]
pub struct FaultInjector {
    /// Remaining hits allowed before the fault fires
    armed: Mutex<HashMap<FaultPoint, u64>>,
}

impl FaultInjector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms a fault that fires after `hits` successful passes through `point`
    pub fn fail_after(&self, point: FaultPoint, hits: u64) {
        if let Ok(mut armed) = self.armed.lock() {
            armed.insert(point, hits);
        }
    }

    /// Arms a fault that fires on the next pass through `point`
    pub fn fail_next(&self, point: FaultPoint) {
        self.fail_after(point, 0);
    }

    /// Disarms every fault
    pub fn clear(&self) {
        if let Ok(mut armed) = self.armed.lock() {
            armed.clear();
        }
    }

    /// Returns true if a fault is armed for `point`
    pub fn is_armed(&self, point: FaultPoint) -> bool {
        self.armed
            .lock()
            .map(|armed| armed.contains_key(&point))
            .unwrap_or(false)
    }

    /// Records a pass through `point`, failing if its fault fires
    pub fn check(&self, point: FaultPoint) -> EngineResult<()> {
        let Ok(mut armed) = self.armed.lock() else {
            return Ok(());
        };
        match armed.get_mut(&point) {
            Some(0) => {
                armed.remove(&point);
                Err(EngineError::Injected(point))
            }
            Some(remaining) => {
                *remaining -= 1;
                Ok(())
            }
            None => Ok(()),
        }
    }
}

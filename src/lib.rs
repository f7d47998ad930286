//! keyshelf - declarative queries over an indexed, schema-defined object store
//!
//! Queries (`select`, `insert`, `update`, `delete`, `count`, `last`) are
//! planned onto the cheapest access path of an ordered key-value engine:
//! primary-key lookup, secondary-index point lookup, range scan, or full
//! scan with an in-memory post-filter.

pub mod cli;
pub mod connection;
pub mod engine;
pub mod executor;
pub mod observability;
pub mod planner;
pub mod schema;
pub mod storage;

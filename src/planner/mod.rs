//! Query planner
//!
//! Turns a declarative filter into an access plan: which key or index is
//! read, over which ranges, and which pairs are left for in-memory
//! filtering.
//!
//! # Access Path Priority (strict order)
//!
//! 1. Primary key equality
//! 2. Explicit range (primary key or named index)
//! 3. Secondary index equality
//! 4. Full scan with post-filter

mod ast;
mod errors;
mod explain;
mod filter;
mod planner;

pub use ast::{CollectionRef, DeleteQuery, InsertQuery, Query, SelectQuery, UpdateQuery};
pub use errors::{PlannerError, PlannerErrorCode, PlannerResult};
pub use explain::ExplainPlan;
pub use filter::{Filter, RangeBound, RangeSpec, RangeTarget};
pub use planner::{AccessPath, AccessPathSelector, AccessPlan, IndexCatalog, KeyPolicy};

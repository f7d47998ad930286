//! Access-path selection
//!
//! Chooses how a filter is evaluated against a collection.
//!
//! Selection order (first match wins):
//! 1. No fields and no range: full scan, nothing to post-filter
//! 2. One field, no range, a key name holding a valid key: primary-key lookup
//! 3. A range: range scan, every field post-filtered
//! 4. One field naming a declared index, holding a valid key: index point scan
//! 5. Otherwise: full scan, every field post-filtered

use serde_json::{Map, Value};

use crate::engine::{Key, KeyRange};

use super::errors::{PlannerError, PlannerResult};
use super::filter::{Filter, RangeBound, RangeSpec, RangeTarget};

/// Field names that address the primary key, checked in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPolicy {
    names: Vec<String>,
}

impl KeyPolicy {
    pub fn new(names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_key_name(&self, field: &str) -> bool {
        self.names.iter().any(|n| n == field)
    }

    /// First key name present in `matches` with a non-null value
    pub fn resolve<'m>(&self, matches: &'m Map<String, Value>) -> Option<(&str, &'m Value)> {
        self.names.iter().find_map(|name| match matches.get(name) {
            Some(Value::Null) | None => None,
            Some(value) => Some((name.as_str(), value)),
        })
    }
}

impl Default for KeyPolicy {
    fn default() -> Self {
        Self::new(["key", "id"])
    }
}

/// Read-only view of a collection's declared indexes
pub trait IndexCatalog {
    fn has_index(&self, name: &str) -> bool;
    /// Key path the index was declared over
    fn index_key_path(&self, name: &str) -> Option<String>;
}

/// How the matching records are reached
#[derive(Debug, Clone, PartialEq)]
pub enum AccessPath {
    /// Single point read by primary key
    PrimaryKey(Key),
    /// Cursor over one index key
    IndexPoint {
        index: String,
        key_path: String,
        key: Key,
    },
    /// One cursor per range, in caller order
    IndexRange {
        target: RangeTarget,
        ranges: Vec<KeyRange>,
    },
    /// Cursor over the whole collection in primary-key order
    FullScan,
}

impl AccessPath {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessPath::PrimaryKey(_) => "PK_LOOKUP",
            AccessPath::IndexPoint { .. } => "INDEX_EQ",
            AccessPath::IndexRange { .. } => "RANGE_SCAN",
            AccessPath::FullScan => "FULL_SCAN",
        }
    }
}

/// Immutable result of access-path selection
#[derive(Debug, Clone, PartialEq)]
pub struct AccessPlan {
    pub collection: String,
    pub path: AccessPath,
    /// Pairs still to be checked in memory, in filter order
    pub post_filter: Vec<(String, Value)>,
    pub limit: Option<usize>,
}

impl AccessPlan {
    pub fn has_post_filter(&self) -> bool {
        !self.post_filter.is_empty()
    }

    /// Limit the cursors may stop at. With a post-filter the scan must
    /// run to completion, so there is none.
    pub fn scan_limit(&self) -> Option<usize> {
        if self.has_post_filter() {
            None
        } else {
            self.limit
        }
    }
}

pub struct AccessPathSelector<'a, C: IndexCatalog> {
    catalog: &'a C,
    key_policy: &'a KeyPolicy,
}

impl<'a, C: IndexCatalog> AccessPathSelector<'a, C> {
    pub fn new(catalog: &'a C, key_policy: &'a KeyPolicy) -> Self {
        Self {
            catalog,
            key_policy,
        }
    }

    /// Plans `filter` against `collection`. Deterministic for equal inputs.
    pub fn select(
        &self,
        collection: &str,
        filter: &Filter,
        limit: Option<usize>,
    ) -> PlannerResult<AccessPlan> {
        let plan = |path, post_filter| AccessPlan {
            collection: collection.to_string(),
            path,
            post_filter,
            limit,
        };
        let fields = filter.fields();

        if fields.is_empty() && filter.range_spec().is_none() {
            return Ok(plan(AccessPath::FullScan, Vec::new()));
        }

        if let ([(field, value)], None) = (fields, filter.range_spec()) {
            if self.key_policy.is_key_name(field) {
                if let Some(key) = Key::from_json(value) {
                    return Ok(plan(AccessPath::PrimaryKey(key), Vec::new()));
                }
            }
        }

        if let Some(range) = filter.range_spec() {
            let path = self.range_path(collection, range)?;
            return Ok(plan(path, fields.to_vec()));
        }

        if let [(field, value)] = fields {
            if self.catalog.has_index(field) {
                if let Some(key) = Key::from_json(value) {
                    let key_path = self
                        .catalog
                        .index_key_path(field)
                        .unwrap_or_else(|| field.clone());
                    return Ok(plan(
                        AccessPath::IndexPoint {
                            index: field.clone(),
                            key_path,
                            key,
                        },
                        Vec::new(),
                    ));
                }
            }
        }

        Ok(plan(AccessPath::FullScan, fields.to_vec()))
    }

    fn range_path(&self, collection: &str, range: &RangeSpec) -> PlannerResult<AccessPath> {
        if let RangeTarget::Index(index) = &range.target {
            if !self.catalog.has_index(index) {
                return Err(PlannerError::unknown_index(collection, index.clone()));
            }
        }
        if range.bounds.is_empty() {
            return Err(PlannerError::query_invalid("range has no bounds"));
        }

        let ranges = range
            .bounds
            .iter()
            .map(key_range)
            .collect::<PlannerResult<Vec<_>>>()?;

        Ok(AccessPath::IndexRange {
            target: range.target.clone(),
            ranges,
        })
    }
}

fn bound_key(value: &Value, side: &str) -> PlannerResult<Key> {
    Key::from_json(value).ok_or_else(|| {
        PlannerError::query_invalid(format!("range {} {} is not a valid key", side, value))
    })
}

fn key_range(bound: &RangeBound) -> PlannerResult<KeyRange> {
    let start = bound.start.as_ref().map(|v| bound_key(v, "start")).transpose()?;
    let end = bound.end.as_ref().map(|v| bound_key(v, "end")).transpose()?;
    match (start, end) {
        (Some(start), Some(end)) => KeyRange::bound(start, end)
            .ok_or_else(|| PlannerError::query_invalid("range start is greater than end")),
        (Some(start), None) => Ok(KeyRange::lower_bound(start)),
        (None, Some(end)) => Ok(KeyRange::upper_bound(end)),
        (None, None) => Err(PlannerError::query_invalid("range bound is empty")),
    }
}

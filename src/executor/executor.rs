//! Query executor for keyshelf
//!
//! Executes declarative queries against a `StorageContext`. Every query
//! owns one transaction; nothing is shared between calls.
//!
//! Select flow (strict order):
//! 1. Open a read-only handle on the collection
//! 2. Plan the filter against the collection's indexes
//! 3. Drive the access path (point read or cursors)
//! 4. Apply the post-filter
//! 5. Apply limit
//! 6. Return records in access-path order

use serde_json::Value;

use crate::engine::{key_at_path, set_value_at_path, value_at_path, Key, KeyRange};
use crate::observability::{Event, Logger};
use crate::planner::{
    AccessPath, AccessPathSelector, AccessPlan, DeleteQuery, ExplainPlan, IndexCatalog,
    InsertQuery, Query, RangeTarget, SelectQuery, UpdateQuery,
};
use crate::storage::{CursorSession, StorageContext, StoreHandle};

use super::errors::{ExecutorError, ExecutorResult};
use super::filters::PostFilter;
use super::merge::shallow_merge;
use super::options::QueryOptions;
use super::result::QueryOutput;

impl IndexCatalog for StoreHandle {
    fn has_index(&self, name: &str) -> bool {
        StoreHandle::has_index(self, name)
    }

    fn index_key_path(&self, name: &str) -> Option<String> {
        StoreHandle::index_key_path(self, name)
    }
}

/// Index key a visited record must still carry
struct Recheck<'p> {
    key_path: &'p str,
    key: &'p Key,
}

/// Steps `cursor` until exhausted or `out` holds `limit` records, then closes it.
async fn drain(
    mut cursor: CursorSession<'_>,
    out: &mut Vec<Value>,
    limit: Option<usize>,
    recheck: Option<Recheck<'_>>,
) -> ExecutorResult<()> {
    while limit.map_or(true, |limit| out.len() < limit) {
        let Some(entry) = cursor.next().await? else {
            break;
        };
        if let Some(check) = &recheck {
            if key_at_path(&entry.value, check.key_path).as_ref() != Some(check.key) {
                continue;
            }
        }
        out.push(entry.value);
    }
    cursor.close();
    Ok(())
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Query executor bound to one database
#[derive(Debug, Clone)]
pub struct QueryExecutor {
    storage: StorageContext,
    options: QueryOptions,
}

impl QueryExecutor {
    pub fn new(storage: StorageContext, options: QueryOptions) -> Self {
        Self { storage, options }
    }

    pub fn storage(&self) -> &StorageContext {
        &self.storage
    }

    pub fn options(&self) -> &QueryOptions {
        &self.options
    }

    /// Executes any query variant
    pub async fn execute(&self, query: &Query) -> ExecutorResult<QueryOutput> {
        let output = match query {
            Query::Select(q) => QueryOutput::Records(self.select(q).await?),
            Query::Insert(q) => QueryOutput::Inserted(self.insert(q).await?),
            Query::Update(q) => QueryOutput::Updated(self.update(q).await?),
            Query::Delete(q) => QueryOutput::Deleted(self.delete(q).await?),
            Query::Count(q) => QueryOutput::Count(self.count(&q.from).await?),
            Query::Last(q) => QueryOutput::Last(self.last(&q.from).await?),
        };
        Logger::trace(
            Event::QueryExecuted,
            &[("collection", query.collection()), ("kind", query.kind())],
        );
        Ok(output)
    }

    fn plan(&self, handle: &StoreHandle, query: &SelectQuery) -> ExecutorResult<AccessPlan> {
        let selector = AccessPathSelector::new(handle, &self.options.key_policy);
        selector
            .select(&query.from, &query.filter, query.limit)
            .map_err(|err| {
                Logger::warn(
                    Event::QueryRejected,
                    &[("code", err.code().code()), ("collection", query.from.as_str())],
                );
                ExecutorError::from(err)
            })
    }

    /// Records matching the filter, in access-path order
    pub async fn select(&self, query: &SelectQuery) -> ExecutorResult<Vec<Value>> {
        let handle = self.storage.read(&query.from).await?;
        let plan = self.plan(&handle, query)?;
        if plan.limit == Some(0) {
            return Ok(Vec::new());
        }

        let scan_limit = plan.scan_limit();
        let mut records = Vec::new();
        match &plan.path {
            AccessPath::PrimaryKey(key) => {
                records.extend(handle.get(key).await?);
            }
            AccessPath::IndexPoint {
                index,
                key_path,
                key,
            } => {
                let cursor = handle
                    .open_index_cursor(index, KeyRange::only(key.clone()))
                    .await?;
                let recheck = Recheck { key_path, key };
                drain(cursor, &mut records, scan_limit, Some(recheck)).await?;
            }
            AccessPath::IndexRange { target, ranges } => {
                for range in ranges {
                    if scan_limit.map_or(false, |limit| records.len() >= limit) {
                        break;
                    }
                    let cursor = match target {
                        RangeTarget::PrimaryKey => handle.open_cursor(range.clone()).await?,
                        RangeTarget::Index(index) => {
                            handle.open_index_cursor(index, range.clone()).await?
                        }
                    };
                    drain(cursor, &mut records, scan_limit, None).await?;
                }
            }
            AccessPath::FullScan => {
                let cursor = handle.open_cursor(KeyRange::all()).await?;
                drain(cursor, &mut records, scan_limit, None).await?;
            }
        }

        let mut records = PostFilter::apply(records, &plan.post_filter, self.options.post_filter);
        if let Some(limit) = plan.limit {
            records.truncate(limit);
        }
        Ok(records)
    }

    /// Inserts one record or a sequence of records in a single transaction.
    ///
    /// Returns the payload as passed in.
    pub async fn insert(&self, query: &InsertQuery) -> ExecutorResult<Value> {
        let mut handle = self.storage.write(&query.into).await?;
        let records = match &query.records {
            Value::Object(_) => std::slice::from_ref(&query.records),
            Value::Array(items) => items.as_slice(),
            other => {
                let type_name = json_type_name(other);
                Logger::warn(
                    Event::UnsupportedPayload,
                    &[("collection", query.into.as_str()), ("type", type_name)],
                );
                drop(handle);
                return Err(ExecutorError::unsupported_payload(type_name));
            }
        };

        for record in records {
            handle.add(record.clone()).await?;
        }
        handle.complete().await?;
        Ok(query.records.clone())
    }

    fn resolve_key(&self, matches: &serde_json::Map<String, Value>) -> ExecutorResult<Option<Key>> {
        match self.options.key_policy.resolve(matches) {
            None => Ok(None),
            Some((field, value)) => Key::from_json(value).map(Some).ok_or_else(|| {
                ExecutorError::query_invalid(format!(
                    "'{}' value {} is not a valid key",
                    field, value
                ))
            }),
        }
    }

    fn skip_keyless(kind: &str, collection: &str) {
        Logger::trace(
            Event::KeylessWriteSkipped,
            &[("collection", collection), ("kind", kind)],
        );
    }

    /// Upserts the record addressed by `where`; `None` when no key resolves.
    pub async fn update(&self, query: &UpdateQuery) -> ExecutorResult<Option<Value>> {
        let Some(key) = self.resolve_key(&query.matches)? else {
            Self::skip_keyless("update", &query.on);
            return Ok(None);
        };

        let mut handle = self.storage.write(&query.on).await?;
        let mut record = if query.merge {
            let existing = handle.get(&key).await?;
            shallow_merge(existing.as_ref(), &query.patch)
        } else {
            query.patch.clone()
        };

        match handle.key_path() {
            Some(path) => {
                if value_at_path(&record, &path).is_none() {
                    set_value_at_path(&mut record, &path, key.to_json());
                }
                handle.put(record.clone(), None).await?;
            }
            None => {
                handle.put(record.clone(), Some(key)).await?;
            }
        }
        handle.complete().await?;
        Ok(Some(record))
    }

    /// Deletes the record addressed by `where`.
    ///
    /// Returns whether a delete was issued. Deleting an absent key succeeds.
    pub async fn delete(&self, query: &DeleteQuery) -> ExecutorResult<bool> {
        let Some(key) = self.resolve_key(&query.matches)? else {
            Self::skip_keyless("delete", &query.from);
            return Ok(false);
        };

        let mut handle = self.storage.write(&query.from).await?;
        handle.delete(&key).await?;
        handle.complete().await?;
        Ok(true)
    }

    pub async fn count(&self, collection: &str) -> ExecutorResult<usize> {
        let handle = self.storage.read(collection).await?;
        Ok(handle.count().await?)
    }

    /// Greatest primary key of the collection.
    ///
    /// Lists every key, so this is linear in the collection size.
    pub async fn last(&self, collection: &str) -> ExecutorResult<Option<Value>> {
        let handle = self.storage.read(collection).await?;
        let keys = handle.keys().await?;
        Ok(keys.last().map(Key::to_json))
    }

    /// Describes how `query` would be executed, without reading records
    pub async fn explain(&self, query: &SelectQuery) -> ExecutorResult<ExplainPlan> {
        let handle = self.storage.read(&query.from).await?;
        let selector = AccessPathSelector::new(&handle, &self.options.key_policy);
        let explain = match selector.select(&query.from, &query.filter, query.limit) {
            Ok(plan) => ExplainPlan::from_plan(&plan)
                .with_post_filter_mode(self.options.post_filter.as_str()),
            Err(err) => ExplainPlan::from_error(&err),
        };
        Logger::trace(
            Event::ExplainComplete,
            &[
                ("access_path", explain.access_path.as_deref().unwrap_or("REJECTED")),
                ("collection", query.from.as_str()),
            ],
        );
        Ok(explain)
    }
}

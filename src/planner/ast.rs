//! Declarative query objects
//!
//! Queries arrive as JSON objects with a single top-level verb:
//!
//! ```json
//! {"select": {"from": "users", "where": {"role": "admin"}, "limit": 1}}
//! {"insert": {"into": "users", "set": [{"id": 1}]}}
//! {"update": {"on": "users", "where": {"id": 1}, "set": {"name": "x"}, "merge": true}}
//! {"delete": {"from": "users", "where": {"id": 1}}}
//! {"count": {"from": "users"}}
//! {"last": {"from": "users"}}
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::filter::Filter;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectQuery {
    pub from: String,
    #[serde(rename = "where", default)]
    pub filter: Filter,
    /// Maximum number of records returned; `None` is unbounded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

impl SelectQuery {
    pub fn new(from: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            filter: Filter::default(),
            limit: None,
        }
    }

    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsertQuery {
    #[serde(alias = "on")]
    pub into: String,
    /// One record (object) or an ordered sequence of records (array)
    #[serde(rename = "set", alias = "records")]
    pub records: Value,
}

impl InsertQuery {
    pub fn new(into: impl Into<String>, records: Value) -> Self {
        Self {
            into: into.into(),
            records,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateQuery {
    pub on: String,
    /// Where the primary key is looked up
    #[serde(rename = "where", default)]
    pub matches: Map<String, Value>,
    #[serde(rename = "set")]
    pub patch: Value,
    /// Shallow-merge the patch into the stored record
    #[serde(default)]
    pub merge: bool,
}

impl UpdateQuery {
    pub fn new(on: impl Into<String>, matches: Map<String, Value>, patch: Value) -> Self {
        Self {
            on: on.into(),
            matches,
            patch,
            merge: false,
        }
    }

    pub fn merged(mut self) -> Self {
        self.merge = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteQuery {
    #[serde(alias = "on")]
    pub from: String,
    #[serde(rename = "where", default)]
    pub matches: Map<String, Value>,
}

impl DeleteQuery {
    pub fn new(from: impl Into<String>, matches: Map<String, Value>) -> Self {
        Self {
            from: from.into(),
            matches,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionRef {
    pub from: String,
}

/// A declarative query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Query {
    Select(SelectQuery),
    Insert(InsertQuery),
    Update(UpdateQuery),
    Delete(DeleteQuery),
    Count(CollectionRef),
    Last(CollectionRef),
}

impl Query {
    pub fn count(from: impl Into<String>) -> Self {
        Query::Count(CollectionRef { from: from.into() })
    }

    pub fn last(from: impl Into<String>) -> Self {
        Query::Last(CollectionRef { from: from.into() })
    }

    /// Target collection
    pub fn collection(&self) -> &str {
        match self {
            Query::Select(q) => &q.from,
            Query::Insert(q) => &q.into,
            Query::Update(q) => &q.on,
            Query::Delete(q) => &q.from,
            Query::Count(q) | Query::Last(q) => &q.from,
        }
    }

    /// Verb name, for logs and explain output
    pub fn kind(&self) -> &'static str {
        match self {
            Query::Select(_) => "select",
            Query::Insert(_) => "insert",
            Query::Update(_) => "update",
            Query::Delete(_) => "delete",
            Query::Count(_) => "count",
            Query::Last(_) => "last",
        }
    }

    pub fn is_write(&self) -> bool {
        matches!(self, Query::Insert(_) | Query::Update(_) | Query::Delete(_))
    }
}

impl From<SelectQuery> for Query {
    fn from(q: SelectQuery) -> Self {
        Query::Select(q)
    }
}

impl From<InsertQuery> for Query {
    fn from(q: InsertQuery) -> Self {
        Query::Insert(q)
    }
}

impl From<UpdateQuery> for Query {
    fn from(q: UpdateQuery) -> Self {
        Query::Update(q)
    }
}

impl From<DeleteQuery> for Query {
    fn from(q: DeleteQuery) -> Self {
        Query::Delete(q)
    }
}

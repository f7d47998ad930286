//! Result types for query execution

use serde_json::Value;

/// Outcome of one executed query
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutput {
    /// `select`: matching records in access-path order
    Records(Vec<Value>),
    /// `insert`: the payload exactly as passed in
    Inserted(Value),
    /// `update`: the written record, `None` when no key resolved
    Updated(Option<Value>),
    /// `delete`: whether a delete was issued
    Deleted(bool),
    Count(usize),
    /// `last`: greatest primary key, `None` for an empty collection
    Last(Option<Value>),
}

impl QueryOutput {
    /// JSON form used on the wire
    pub fn into_json(self) -> Value {
        match self {
            QueryOutput::Records(records) => Value::Array(records),
            QueryOutput::Inserted(value) => value,
            QueryOutput::Updated(value) | QueryOutput::Last(value) => {
                value.unwrap_or(Value::Null)
            }
            QueryOutput::Deleted(deleted) => Value::Bool(deleted),
            QueryOutput::Count(n) => Value::from(n),
        }
    }

    /// Records of a `select`, empty for every other output
    pub fn records(&self) -> &[Value] {
        match self {
            QueryOutput::Records(records) => records,
            _ => &[],
        }
    }
}

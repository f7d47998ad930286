//! Shared fixtures for integration tests

#![allow(dead_code)]

use keyshelf::connection::{ConnectConfig, Database};
use keyshelf::engine::{IndexOptions, StoreOptions};
use keyshelf::executor::QueryExecutor;
use keyshelf::planner::Query;
use keyshelf::schema::CollectionSchema;
use serde_json::{json, Value};

/// `users` keyed by `id` with a `byRole` index, `numbers` keyed by `id`
/// holding keys 1..=5, `kv` with out-of-line keys
pub fn schemas() -> Vec<CollectionSchema> {
    vec![
        CollectionSchema::new("users", StoreOptions::key_path("id"))
            .with_index("byRole", "role", IndexOptions::default())
            .with_index("role", "role", IndexOptions::default()),
        CollectionSchema::new("numbers", StoreOptions::key_path("id")).with_data(json!([
            {"id": 3, "n": "three"},
            {"id": 1, "n": "one"},
            {"id": 5, "n": "five"},
            {"id": 2, "n": "two"},
            {"id": 4, "n": "four"},
        ])),
        CollectionSchema::new("kv", StoreOptions::default()),
    ]
}

pub async fn connect() -> Database {
    connect_with(ConnectConfig::new("itest", 1).with_schemas(schemas())).await
}

pub async fn connect_with(config: ConnectConfig) -> Database {
    Database::connect(&config).await.unwrap()
}

/// Parses a JSON query, as received on the wire
pub fn query(value: Value) -> Query {
    serde_json::from_value(value).unwrap()
}

pub async fn run(executor: &QueryExecutor, value: Value) -> Value {
    executor.execute(&query(value)).await.unwrap().into_json()
}

pub fn ids(records: &Value) -> Vec<i64> {
    records
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["id"].as_i64().unwrap())
        .collect()
}

/// Both lease counters are back at zero
pub fn assert_released(db: &Database) {
    assert_eq!(db.engine().open_transactions(), 0, "transaction leaked");
    assert_eq!(db.engine().open_cursors(), 0, "cursor leaked");
}

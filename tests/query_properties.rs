//! Query Property Tests
//!
//! End-to-end behavior of the query layer through a connected database:
//! - Primary-key selects return exactly the inserted record
//! - A limited select is a prefix of the unbounded select
//! - Merge updates keep untouched fields
//! - Keyless updates and deletes write nothing
//! - insert → select → delete → select round trip
//! - Index and range scenarios

mod common;

use common::{assert_released, connect, ids, run};
use serde_json::json;

// =============================================================================
// Primary Key Lookup
// =============================================================================

/// Every record inserted under a unique key is returned by a select on that key.
#[tokio::test]
async fn test_select_by_primary_key_returns_inserted_record() {
    let db = connect().await;
    let ex = db.executor();

    let records = json!([
        {"id": 10, "name": "a", "role": "user"},
        {"id": "x-1", "name": "b"},
        {"id": [1, "z"], "name": "c"},
        {"id": 0, "name": "zero"},
    ]);
    run(ex, json!({"insert": {"into": "users", "set": records.clone()}})).await;

    for record in records.as_array().unwrap() {
        let found = run(
            ex,
            json!({"select": {"from": "users", "where": {"id": record["id"].clone()}}}),
        )
        .await;
        assert_eq!(found, json!([record.clone()]));
    }
    assert_released(&db);
}

// =============================================================================
// Limit Prefix Property
// =============================================================================

/// For every limit L the result is the first L entries of the unbounded result.
#[tokio::test]
async fn test_limited_select_is_prefix_of_unbounded() {
    let db = connect().await;
    let ex = db.executor();
    run(
        ex,
        json!({"insert": {"into": "users", "set": [
            {"id": 1, "role": "admin", "team": "a"},
            {"id": 2, "role": "user", "team": "a"},
            {"id": 3, "role": "admin", "team": "b"},
            {"id": 4, "role": "admin", "team": "a"},
            {"id": 5, "role": "user", "team": "b"},
        ]}}),
    )
    .await;

    let filters = [
        json!({}),
        json!({"role": "admin"}),
        json!({"byRole": "admin"}),
        json!({"role": "admin", "team": "a"}),
        json!({"team": "b"}),
        json!({"range": [{"start": 2, "end": 3}, {"start": 4, "end": 5}]}),
        json!({"range": {"index": "role", "bounds": [{"start": "admin", "end": "user"}]}, "team": "a"}),
    ];

    for filter in filters {
        let unbounded = run(
            ex,
            json!({"select": {"from": "users", "where": filter.clone()}}),
        )
        .await;
        let unbounded = unbounded.as_array().unwrap().clone();

        for limit in 0..=unbounded.len() + 1 {
            let limited = run(
                ex,
                json!({"select": {"from": "users", "where": filter.clone(), "limit": limit}}),
            )
            .await;
            let limited = limited.as_array().unwrap();
            let expected = &unbounded[..limit.min(unbounded.len())];
            assert!(limited.len() <= limit);
            assert_eq!(limited.as_slice(), expected, "filter {} limit {}", filter, limit);
        }
    }
    assert_released(&db);
}

// =============================================================================
// Update Semantics
// =============================================================================

/// Merge keeps fields only in the existing record and overrides shared fields.
#[tokio::test]
async fn test_merge_update_preserves_and_overrides() {
    let db = connect().await;
    let ex = db.executor();
    run(
        ex,
        json!({"insert": {"into": "users", "set": {"id": 1, "name": "ana", "role": "user", "age": 30}}}),
    )
    .await;

    let written = run(
        ex,
        json!({"update": {"on": "users", "where": {"id": 1}, "set": {"role": "admin", "city": "Oslo"}, "merge": true}}),
    )
    .await;
    let expected = json!({"id": 1, "name": "ana", "role": "admin", "age": 30, "city": "Oslo"});
    assert_eq!(written, expected);

    let stored = run(ex, json!({"select": {"from": "users", "where": {"id": 1}}})).await;
    assert_eq!(stored, json!([expected]));
}

/// Without merge the patch replaces the record.
#[tokio::test]
async fn test_plain_update_replaces_record() {
    let db = connect().await;
    let ex = db.executor();
    run(
        ex,
        json!({"insert": {"into": "users", "set": {"id": 1, "name": "ana", "role": "user"}}}),
    )
    .await;
    run(
        ex,
        json!({"update": {"on": "users", "where": {"id": 1}, "set": {"id": 1, "role": "admin"}}}),
    )
    .await;

    let stored = run(ex, json!({"select": {"from": "users", "where": {"id": 1}}})).await;
    assert_eq!(stored, json!([{"id": 1, "role": "admin"}]));
}

/// An update on an absent key inserts the record.
#[tokio::test]
async fn test_update_upserts() {
    let db = connect().await;
    let ex = db.executor();
    run(
        ex,
        json!({"update": {"on": "users", "where": {"key": 7}, "set": {"name": "new"}, "merge": true}}),
    )
    .await;
    let stored = run(ex, json!({"select": {"from": "users", "where": {"id": 7}}})).await;
    assert_eq!(stored, json!([{"name": "new", "id": 7}]));
}

/// An update without a resolvable key returns nothing and writes nothing.
#[tokio::test]
async fn test_keyless_update_writes_nothing() {
    let db = connect().await;
    let ex = db.executor();
    run(
        ex,
        json!({"insert": {"into": "users", "set": [{"id": 1, "role": "user"}, {"id": 2, "role": "user"}]}}),
    )
    .await;

    for matches in [json!({}), json!({"role": "user"}), json!({"id": null})] {
        let result = run(
            ex,
            json!({"update": {"on": "users", "where": matches, "set": {"role": "admin"}}}),
        )
        .await;
        assert_eq!(result, json!(null));
    }

    assert_eq!(run(ex, json!({"count": {"from": "users"}})).await, json!(2));
    let admins = run(ex, json!({"select": {"from": "users", "where": {"role": "admin"}}})).await;
    assert_eq!(admins, json!([]));
    assert_released(&db);
}

/// `id` resolves when `key` is null.
#[tokio::test]
async fn test_key_name_resolution_skips_null() {
    let db = connect().await;
    let ex = db.executor();
    run(ex, json!({"insert": {"into": "users", "set": {"id": 2, "v": 1}}})).await;
    let deleted = run(
        ex,
        json!({"delete": {"from": "users", "where": {"key": null, "id": 2}}}),
    )
    .await;
    assert_eq!(deleted, json!(true));
    assert_eq!(run(ex, json!({"count": {"from": "users"}})).await, json!(0));
}

/// `key` outranks `id` when both are given.
#[tokio::test]
async fn test_key_outranks_id_for_writes() {
    let db = connect().await;
    let ex = db.executor();
    run(
        ex,
        json!({"insert": {"into": "numbers", "set": [{"id": 10, "n": "ten"}, {"id": 20, "n": "twenty"}]}}),
    )
    .await;

    run(
        ex,
        json!({"update": {"on": "numbers", "where": {"id": 10, "key": 20}, "set": {"n": "patched"}, "merge": true}}),
    )
    .await;
    assert_eq!(
        run(ex, json!({"select": {"from": "numbers", "where": {"id": 10}}})).await,
        json!([{"id": 10, "n": "ten"}])
    );
    assert_eq!(
        run(ex, json!({"select": {"from": "numbers", "where": {"id": 20}}})).await,
        json!([{"id": 20, "n": "patched"}])
    );

    run(
        ex,
        json!({"delete": {"from": "numbers", "where": {"id": 10, "key": 20}}}),
    )
    .await;
    assert_eq!(
        run(ex, json!({"select": {"from": "numbers", "where": {"id": 20}}})).await,
        json!([])
    );
    assert_eq!(
        run(ex, json!({"select": {"from": "numbers", "where": {"id": 10}}})).await,
        json!([{"id": 10, "n": "ten"}])
    );
}

// =============================================================================
// Round Trip
// =============================================================================

/// insert, select, delete, select yields the record then nothing.
#[tokio::test]
async fn test_insert_select_delete_select() {
    let db = connect().await;
    let ex = db.executor();
    let record = json!({"id": 42, "name": "answer"});

    let inserted = run(ex, json!({"insert": {"into": "users", "set": record.clone()}})).await;
    assert_eq!(inserted, record);

    let first = run(ex, json!({"select": {"from": "users", "where": {"id": 42}}})).await;
    assert_eq!(first, json!([record]));

    let deleted = run(ex, json!({"delete": {"from": "users", "where": {"id": 42}}})).await;
    assert_eq!(deleted, json!(true));

    let second = run(ex, json!({"select": {"from": "users", "where": {"id": 42}}})).await;
    assert_eq!(second, json!([]));
    assert_released(&db);
}

/// Deleting an absent key succeeds; deleting without a key does nothing.
#[tokio::test]
async fn test_delete_edge_cases() {
    let db = connect().await;
    let ex = db.executor();
    run(ex, json!({"insert": {"into": "users", "set": {"id": 1}}})).await;

    assert_eq!(
        run(ex, json!({"delete": {"from": "users", "where": {"id": 99}}})).await,
        json!(true)
    );
    assert_eq!(
        run(ex, json!({"delete": {"on": "users", "where": {"name": "x"}}})).await,
        json!(false)
    );
    assert_eq!(run(ex, json!({"count": {"from": "users"}})).await, json!(1));
}

// =============================================================================
// Scenarios
// =============================================================================

/// users/byRole: limit 1 on role admin yields one admin; count is 3.
#[tokio::test]
async fn test_users_by_role_scenario() {
    let db = connect().await;
    let ex = db.executor();
    run(
        ex,
        json!({"insert": {"into": "users", "set": [
            {"id": 1, "role": "admin"},
            {"id": 2, "role": "admin"},
            {"id": 3, "role": "user"},
        ]}}),
    )
    .await;

    let result = run(
        ex,
        json!({"select": {"from": "users", "where": {"role": "admin"}, "limit": 1}}),
    )
    .await;
    let records = result.as_array().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["role"], "admin");
    assert!(matches!(records[0]["id"].as_i64(), Some(1) | Some(2)));

    assert_eq!(run(ex, json!({"count": {"from": "users"}})).await, json!(3));
    assert_released(&db);
}

/// A primary-key range {1, 2} over keys 1..5 yields keys 1 and 2 ascending.
#[tokio::test]
async fn test_primary_key_range_scenario() {
    let db = connect().await;
    let ex = db.executor();

    let result = run(
        ex,
        json!({"select": {"from": "numbers", "where": {"range": {"start": 1, "end": 2}}}}),
    )
    .await;
    assert_eq!(ids(&result), vec![1, 2]);

    let result = run(
        ex,
        json!({"select": {"from": "numbers", "where": {"range": [{"start": 1, "end": 2}]}}}),
    )
    .await;
    assert_eq!(ids(&result), vec![1, 2]);
}

// =============================================================================
// Count / Last
// =============================================================================

#[tokio::test]
async fn test_count_and_last() {
    let db = connect().await;
    let ex = db.executor();
    assert_eq!(run(ex, json!({"count": {"from": "numbers"}})).await, json!(5));
    assert_eq!(run(ex, json!({"last": {"from": "numbers"}})).await, json!(5));
    assert_eq!(run(ex, json!({"last": {"from": "users"}})).await, json!(null));

    run(ex, json!({"insert": {"into": "numbers", "set": {"id": "a", "n": "string key"}}})).await;
    assert_eq!(run(ex, json!({"last": {"from": "numbers"}})).await, json!("a"));
}

// =============================================================================
// Out-of-line Keys
// =============================================================================

#[tokio::test]
async fn test_out_of_line_update_and_select() {
    let db = connect().await;
    let ex = db.executor();
    run(
        ex,
        json!({"update": {"on": "kv", "where": {"key": "theme"}, "set": {"value": "dark"}}}),
    )
    .await;
    run(
        ex,
        json!({"update": {"on": "kv", "where": {"key": "theme"}, "set": {"updated": true}, "merge": true}}),
    )
    .await;

    let stored = run(ex, json!({"select": {"from": "kv", "where": {"key": "theme"}}})).await;
    assert_eq!(stored, json!([{"value": "dark", "updated": true}]));
    assert_eq!(run(ex, json!({"last": {"from": "kv"}})).await, json!("theme"));
}

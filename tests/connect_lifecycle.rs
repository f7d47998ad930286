//! Connect Lifecycle Tests
//!
//! Opening a database from a config:
//! - First connect registers collections and seeds their data
//! - Reconnecting from a snapshot neither re-registers nor re-seeds
//! - Upgrading a populated database is refused
//! - Downgrades are rejected
//! - Snapshot corruption is detected

mod common;

use std::fs;

use common::{connect_with, run, schemas};
use keyshelf::connection::{ConnectConfig, ConnectionError, Database};
use keyshelf::engine::StoreOptions;
use keyshelf::executor::PostFilterMode;
use keyshelf::schema::CollectionSchema;
use serde_json::json;
use tempfile::TempDir;

fn file_config(dir: &TempDir, version: u32) -> ConnectConfig {
    ConnectConfig::new("itest", version)
        .with_schemas(schemas())
        .with_data_file(dir.path().join("itest.snap"))
}

// =============================================================================
// First Connect
// =============================================================================

#[tokio::test]
async fn test_first_connect_registers_and_seeds() {
    let db = connect_with(ConnectConfig::new("itest", 1).with_schemas(schemas())).await;
    assert_eq!(db.name(), "itest");
    assert_eq!(db.version().await, 1);
    assert_eq!(
        db.engine().store_names().await,
        vec!["kv".to_string(), "numbers".to_string(), "users".to_string()]
    );
    assert_eq!(
        run(db.executor(), json!({"count": {"from": "numbers"}})).await,
        json!(5)
    );
}

#[tokio::test]
async fn test_connect_without_schemas() {
    let db = connect_with(ConnectConfig::new("empty", 3)).await;
    assert_eq!(db.version().await, 3);
    assert!(db.engine().store_names().await.is_empty());
}

#[tokio::test]
async fn test_seed_failure_fails_connect() {
    let config = ConnectConfig::new("bad", 1).with_schemas(vec![CollectionSchema::new(
        "users",
        StoreOptions::key_path("id"),
    )
    .with_data(json!([{"id": 1}, {"id": 1}]))]);

    let err = Database::connect(&config).await.unwrap_err();
    assert_eq!(err.code(), "KEYSHELF_STORAGE_FAILURE");
    assert!(matches!(err, ConnectionError::Seed { .. }));
}

#[tokio::test]
async fn test_invalid_config_is_rejected_before_opening() {
    let err = Database::connect(&ConnectConfig::new("", 1)).await.unwrap_err();
    assert_eq!(err.code(), "KEYSHELF_CONFIG_INVALID");
}

// =============================================================================
// Snapshots
// =============================================================================

#[tokio::test]
async fn test_reconnect_from_snapshot_keeps_writes_and_skips_seeding() {
    let dir = TempDir::new().unwrap();
    let config = file_config(&dir, 1);

    let db = connect_with(config.clone()).await;
    run(
        db.executor(),
        json!({"delete": {"from": "numbers", "where": {"id": 1}}}),
    )
    .await;
    run(
        db.executor(),
        json!({"insert": {"into": "users", "set": {"id": 1, "role": "admin"}}}),
    )
    .await;
    assert!(db.save().await.unwrap());

    let reopened = connect_with(config).await;
    let ex = reopened.executor();
    assert_eq!(run(ex, json!({"count": {"from": "numbers"}})).await, json!(4));
    assert_eq!(
        run(ex, json!({"select": {"from": "users", "where": {"role": "admin"}}})).await,
        json!([{"id": 1, "role": "admin"}])
    );
}

#[tokio::test]
async fn test_corrupted_snapshot_is_refused() {
    let dir = TempDir::new().unwrap();
    let config = file_config(&dir, 1);
    let db = connect_with(config.clone()).await;
    db.save().await.unwrap();

    let path = dir.path().join("itest.snap");
    let content = fs::read_to_string(&path).unwrap();
    fs::write(&path, content.replace("three", "THREE")).unwrap();

    let err = Database::connect(&config).await.unwrap_err();
    assert!(matches!(err, ConnectionError::Engine(_)));
    assert!(err.to_string().contains("checksum mismatch"));
}

// =============================================================================
// Versioning
// =============================================================================

/// Upgrading a database that already has a version is a fatal, unimplemented migration.
#[tokio::test]
async fn test_upgrade_of_populated_database_is_refused() {
    let dir = TempDir::new().unwrap();
    let db = connect_with(file_config(&dir, 1)).await;
    db.save().await.unwrap();

    let err = Database::connect(&file_config(&dir, 2)).await.unwrap_err();
    assert_eq!(err.code(), "KEYSHELF_UNIMPLEMENTED_MIGRATION");
    match err {
        ConnectionError::Schema(schema_err) => assert!(schema_err.is_fatal()),
        other => panic!("unexpected error {:?}", other),
    }
}

#[tokio::test]
async fn test_downgrade_is_rejected() {
    let dir = TempDir::new().unwrap();
    let db = connect_with(file_config(&dir, 2)).await;
    db.save().await.unwrap();

    let err = Database::connect(&file_config(&dir, 1)).await.unwrap_err();
    assert!(matches!(err, ConnectionError::Engine(_)));
    assert!(err.to_string().contains("lower than current version 2"));
}

// =============================================================================
// Config File
// =============================================================================

#[tokio::test]
async fn test_connect_from_config_file() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("schemas.json"),
        serde_json::to_string(&schemas()).unwrap(),
    )
    .unwrap();
    fs::write(
        dir.path().join("keyshelf.json"),
        r#"{"name": "filedb", "version": 1, "schema_file": "schemas.json", "key_names": ["n", "id"], "post_filter": "first_pair"}"#,
    )
    .unwrap();

    let config = ConnectConfig::load(&dir.path().join("keyshelf.json")).unwrap();
    assert_eq!(config.post_filter, PostFilterMode::FirstPair);

    let db = connect_with(config).await;
    let ex = db.executor();
    // "n" is now a key name ahead of "id"
    assert_eq!(
        run(ex, json!({"delete": {"from": "numbers", "where": {"n": 2, "id": 5}}})).await,
        json!(true)
    );
    assert_eq!(run(ex, json!({"last": {"from": "numbers"}})).await, json!(5));
    assert_eq!(run(ex, json!({"count": {"from": "numbers"}})).await, json!(4));
}

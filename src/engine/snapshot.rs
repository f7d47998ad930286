//! Engine snapshots
//!
//! A snapshot file is one JSON header line followed by the JSON body:
//!
//! ```text
//! {"format_version":1,"database":"app","saved_at":"2026-10-19T12:00:00Z","checksum":"crc32:1a2b3c4d"}
//! {"version":1,"stores":[...]}
//! ```
//!
//! The checksum covers the body bytes exactly as written. Indexes are
//! stored as definitions only and rebuilt from the records on load.
//!
//! Writes go to a temporary sibling file which is fsynced and renamed over
//! the target, so a reader never sees a half-written snapshot.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::errors::{EngineError, EngineResult};
use super::key::Key;
use super::store::{IndexOptions, ObjectStore, StoreOptions};
use super::{Engine, EngineState};

const FORMAT_VERSION: u8 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct SnapshotHeader {
    format_version: u8,
    database: String,
    saved_at: DateTime<Utc>,
    checksum: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct SnapshotBody {
    version: u32,
    stores: Vec<StoreImage>,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoreImage {
    name: String,
    options: StoreOptions,
    next_key: i64,
    indexes: Vec<IndexImage>,
    records: Vec<(Key, Value)>,
}

#[derive(Debug, Serialize, Deserialize)]
struct IndexImage {
    name: String,
    key_path: String,
    options: IndexOptions,
}

fn format_checksum(checksum: u32) -> String {
    format!("crc32:{:08x}", checksum)
}

fn snapshot_error(context: &str, err: impl std::fmt::Display) -> EngineError {
    EngineError::Snapshot(format!("{}: {}", context, err))
}

/// Sibling of `path` with `.tmp` appended to the full file name
fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

impl Engine {
    /// Writes the committed state of the database to `path`
    pub async fn save_snapshot(&self, path: &Path) -> EngineResult<()> {
        let body = {
            let state = self.shared_state();
            let state = state.read().await;
            SnapshotBody {
                version: state.version,
                stores: state
                    .stores
                    .iter()
                    .map(|(name, store)| StoreImage {
                        name: name.clone(),
                        options: store.options().clone(),
                        next_key: store.next_key(),
                        indexes: store
                            .indexes()
                            .map(|(index_name, index)| IndexImage {
                                name: index_name.clone(),
                                key_path: index.key_path().to_string(),
                                options: index.options().clone(),
                            })
                            .collect(),
                        records: store
                            .keys()
                            .into_iter()
                            .filter_map(|key| store.get(&key).cloned().map(|v| (key, v)))
                            .collect(),
                    })
                    .collect(),
            }
        };

        let body_bytes =
            serde_json::to_vec(&body).map_err(|e| snapshot_error("encode body", e))?;
        let header = SnapshotHeader {
            format_version: FORMAT_VERSION,
            database: self.name().to_string(),
            saved_at: Utc::now(),
            checksum: format_checksum(crc32fast::hash(&body_bytes)),
        };
        let header_bytes =
            serde_json::to_vec(&header).map_err(|e| snapshot_error("encode header", e))?;

        let temp_path = temp_path_for(path);
        {
            let mut file =
                File::create(&temp_path).map_err(|e| snapshot_error("create snapshot", e))?;
            file.write_all(&header_bytes)
                .and_then(|_| file.write_all(b"\n"))
                .and_then(|_| file.write_all(&body_bytes))
                .and_then(|_| file.sync_all())
                .map_err(|e| snapshot_error("write snapshot", e))?;
        }
        fs::rename(&temp_path, path).map_err(|e| snapshot_error("rename snapshot", e))?;
        Ok(())
    }

    /// Opens a database from a snapshot written by `save_snapshot`
    pub async fn load_snapshot(path: &Path) -> EngineResult<Engine> {
        let bytes = fs::read(path).map_err(|e| snapshot_error("read snapshot", e))?;
        let split = bytes
            .iter()
            .position(|b| *b == b'\n')
            .ok_or_else(|| EngineError::Snapshot("missing snapshot header".into()))?;
        let (header_bytes, body_bytes) = (&bytes[..split], &bytes[split + 1..]);

        let header: SnapshotHeader =
            serde_json::from_slice(header_bytes).map_err(|e| snapshot_error("decode header", e))?;
        if header.format_version != FORMAT_VERSION {
            return Err(EngineError::Snapshot(format!(
                "unsupported format version {}",
                header.format_version
            )));
        }
        let actual = format_checksum(crc32fast::hash(body_bytes));
        if actual != header.checksum {
            return Err(EngineError::Snapshot(format!(
                "checksum mismatch: expected {}, found {}",
                header.checksum, actual
            )));
        }

        let body: SnapshotBody =
            serde_json::from_slice(body_bytes).map_err(|e| snapshot_error("decode body", e))?;

        let mut state = EngineState {
            version: body.version,
            ..EngineState::default()
        };
        for image in body.stores {
            let mut store = ObjectStore::new(image.options);
            for index in image.indexes {
                store.create_index(&index.name, &index.key_path, index.options)?;
            }
            for (key, value) in image.records {
                store.restore(key, value)?;
            }
            store.set_next_key(image.next_key);
            state.stores.insert(image.name, store);
        }

        Ok(Engine::from_state(header.database, state))
    }
}

//! Database bootstrap
//!
//! Connect sequence (strict order):
//! 1. Resolve the schema description
//! 2. Open the engine, from the snapshot file when one exists
//! 3. If the requested version is newer, run a version change:
//!    refuse migrations, register every collection, commit
//! 4. If collections were just created, seed their data
//! 5. Announce the connection

use std::path::{Path, PathBuf};

use futures_util::future::try_join_all;

use crate::engine::Engine;
use crate::executor::{ExecutorResult, QueryExecutor, QueryOutput};
use crate::observability::{Event, Logger};
use crate::planner::{InsertQuery, Query};
use crate::schema::{CollectionSchema, SchemaRegistrar};
use crate::storage::StorageContext;

use super::config::ConnectConfig;
use super::errors::{ConnectionError, ConnectionResult};

/// An open database with its query executor
#[derive(Debug, Clone)]
pub struct Database {
    engine: Engine,
    executor: QueryExecutor,
    data_file: Option<PathBuf>,
}

impl Database {
    pub async fn connect(config: &ConnectConfig) -> ConnectionResult<Self> {
        config.validate()?;
        let schemas = config.resolve_schemas()?;
        Logger::info(
            Event::SchemasLoaded,
            &[("collections", &schemas.len().to_string())],
        );

        let engine = match &config.data_file {
            Some(path) if path.exists() => {
                let engine = Engine::load_snapshot(path).await?;
                Logger::info(
                    Event::SnapshotLoaded,
                    &[("name", engine.name()), ("path", &path.display().to_string())],
                );
                engine
            }
            _ => Engine::new(config.name.as_str()),
        };

        let current = engine.version().await;
        let upgraded = if config.version != current {
            // a lower version is refused by the engine itself
            let mut upgrade = engine.upgrade(config.version).await?;
            Logger::info(
                Event::UpgradeBegin,
                &[
                    ("from_version", &current.to_string()),
                    ("to_version", &config.version.to_string()),
                ],
            );
            SchemaRegistrar::check_migration(&upgrade)?;
            SchemaRegistrar::register(&mut upgrade, &schemas)?;
            upgrade.commit().await?;
            true
        } else {
            false
        };

        let storage = StorageContext::new(engine.clone());
        let executor = QueryExecutor::new(storage, config.query_options());

        if upgraded {
            seed(&executor, &schemas).await?;
        }

        Logger::info(
            Event::Connected,
            &[
                ("name", engine.name()),
                ("version", &config.version.to_string()),
            ],
        );

        Ok(Self {
            engine,
            executor,
            data_file: config.data_file.clone(),
        })
    }

    pub fn name(&self) -> &str {
        self.engine.name()
    }

    pub async fn version(&self) -> u32 {
        self.engine.version().await
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn executor(&self) -> &QueryExecutor {
        &self.executor
    }

    pub async fn execute(&self, query: &Query) -> ExecutorResult<QueryOutput> {
        self.executor.execute(query).await
    }

    /// Writes a snapshot to the configured data file.
    ///
    /// Returns false when no data file is configured.
    pub async fn save(&self) -> ConnectionResult<bool> {
        match &self.data_file {
            Some(path) => {
                self.save_to(path).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub async fn save_to(&self, path: &Path) -> ConnectionResult<()> {
        self.engine.save_snapshot(path).await?;
        Logger::info(
            Event::SnapshotSaved,
            &[("name", self.name()), ("path", &path.display().to_string())],
        );
        Ok(())
    }
}

/// Inserts every collection's seed data, all inserts awaited together
async fn seed(executor: &QueryExecutor, schemas: &[CollectionSchema]) -> ConnectionResult<()> {
    let inserts: Vec<_> = schemas
        .iter()
        .filter_map(|schema| {
            let data = schema.data.clone()?;
            Logger::info(Event::SeedingStarted, &[("collection", schema.name.as_str())]);
            let query = InsertQuery::new(schema.name.clone(), data);
            Some(async move {
                executor
                    .insert(&query)
                    .await
                    .map_err(|source| ConnectionError::Seed {
                        collection: query.into.clone(),
                        source,
                    })
            })
        })
        .collect();

    if inserts.is_empty() {
        return Ok(());
    }

    let seeded = inserts.len();
    try_join_all(inserts).await?;
    Logger::info(
        Event::SeedingComplete,
        &[("collections", &seeded.to_string())],
    );
    Ok(())
}

//! Schema registrar
//!
//! Declares collections and their secondary indexes inside a version
//! change. Registration is idempotent per collection: a collection that
//! already exists is left as is, and only its missing indexes are added.

use crate::engine::VersionChange;
use crate::observability::{Event, Logger};

use super::errors::{SchemaError, SchemaResult};
use super::types::CollectionSchema;

/// What a registration pass changed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationReport {
    /// Collections created by this pass, in declaration order
    pub created: Vec<String>,
    /// Collections that already existed
    pub existing: Vec<String>,
    /// Number of indexes created
    pub indexes_created: usize,
}

pub struct SchemaRegistrar;

impl SchemaRegistrar {
    /// Refuses upgrades from a populated version; migrations are not supported
    pub fn check_migration(upgrade: &VersionChange) -> SchemaResult<()> {
        if upgrade.old_version() != 0 {
            Logger::error(
                Event::MigrationRefused,
                &[
                    ("from_version", &upgrade.old_version().to_string()),
                    ("to_version", &upgrade.new_version().to_string()),
                ],
            );
            return Err(SchemaError::unimplemented_migration(
                upgrade.old_version(),
                upgrade.new_version(),
            ));
        }
        Ok(())
    }

    /// Declares every collection and index in `schemas`
    pub fn register(
        upgrade: &mut VersionChange,
        schemas: &[CollectionSchema],
    ) -> SchemaResult<RegistrationReport> {
        let mut report = RegistrationReport::default();

        for schema in schemas {
            if upgrade.has_store(&schema.name) {
                report.existing.push(schema.name.clone());
            } else {
                upgrade
                    .create_store(&schema.name, schema.options.clone())
                    .map_err(|e| SchemaError::registration_failed(&schema.name, e.to_string()))?;
                report.created.push(schema.name.clone());
            }

            for index in &schema.indexes {
                if upgrade.has_index(&schema.name, &index.name) {
                    continue;
                }
                upgrade
                    .create_index(
                        &schema.name,
                        &index.name,
                        &index.key_path,
                        index.options.clone(),
                    )
                    .map_err(|e| SchemaError::registration_failed(&schema.name, e.to_string()))?;
                report.indexes_created += 1;
            }

            Logger::info(
                Event::CollectionRegistered,
                &[
                    ("collection", schema.name.as_str()),
                    ("indexes", &schema.indexes.len().to_string()),
                ],
            );
        }

        Ok(report)
    }
}

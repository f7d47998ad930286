//! Connect configuration
//!
//! ```json
//! {
//!   "name": "app",
//!   "version": 1,
//!   "schema_file": "schemas.json",
//!   "data_file": "app.snapshot",
//!   "key_names": ["key", "id"],
//!   "post_filter": "all_pairs"
//! }
//! ```
//!
//! Relative `schema_file` and `data_file` paths are resolved against the
//! directory holding the config file.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::executor::{PostFilterMode, QueryOptions};
use crate::schema::{validate_schemas, CollectionSchema, SchemaError, SchemaLoader};

use super::errors::{ConnectionError, ConnectionResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectConfig {
    /// Database name (required)
    pub name: String,

    /// Schema version, at least 1 (required)
    pub version: u32,

    /// Inline schema description
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub schemas: Vec<CollectionSchema>,

    /// Schema description file, exclusive with `schemas`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_file: Option<PathBuf>,

    /// Snapshot file the database is loaded from and saved to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_file: Option<PathBuf>,

    /// Fields resolved as the primary key, in priority order
    #[serde(default = "default_key_names")]
    pub key_names: Vec<String>,

    #[serde(default)]
    pub post_filter: PostFilterMode,
}

fn default_key_names() -> Vec<String> {
    vec!["key".to_string(), "id".to_string()]
}

impl ConnectConfig {
    pub fn new(name: impl Into<String>, version: u32) -> Self {
        Self {
            name: name.into(),
            version,
            schemas: Vec::new(),
            schema_file: None,
            data_file: None,
            key_names: default_key_names(),
            post_filter: PostFilterMode::default(),
        }
    }

    pub fn with_schemas(mut self, schemas: Vec<CollectionSchema>) -> Self {
        self.schemas = schemas;
        self
    }

    pub fn with_data_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_file = Some(path.into());
        self
    }

    /// Load configuration from file
    pub fn load(path: &Path) -> ConnectionResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| ConnectionError::config(format!("Failed to read config: {}", e)))?;

        let mut config: ConnectConfig = serde_json::from_str(&content)
            .map_err(|e| ConnectionError::config(format!("Invalid config JSON: {}", e)))?;

        if let Some(base) = path.parent() {
            config.schema_file = config.schema_file.map(|p| base.join(p));
            config.data_file = config.data_file.map(|p| base.join(p));
        }

        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> ConnectionResult<()> {
        if self.name.trim().is_empty() {
            return Err(ConnectionError::config("name must not be empty"));
        }

        if self.version == 0 {
            return Err(ConnectionError::config("version must be >= 1"));
        }

        if !self.schemas.is_empty() && self.schema_file.is_some() {
            return Err(ConnectionError::config(
                "schemas and schema_file are mutually exclusive",
            ));
        }

        if self.key_names.is_empty() || self.key_names.iter().any(|n| n.is_empty()) {
            return Err(ConnectionError::config(
                "key_names must list at least one non-empty field name",
            ));
        }

        validate_schemas(&self.schemas)
            .map_err(|e| SchemaError::malformed_schema("<config>", e))?;

        Ok(())
    }

    /// Inline schemas, or the contents of `schema_file`
    pub fn resolve_schemas(&self) -> ConnectionResult<Vec<CollectionSchema>> {
        match &self.schema_file {
            Some(path) => Ok(SchemaLoader::load_file(path)?),
            None => Ok(self.schemas.clone()),
        }
    }

    pub fn query_options(&self) -> QueryOptions {
        QueryOptions::default()
            .with_key_names(self.key_names.iter().cloned())
            .with_post_filter(self.post_filter)
    }
}

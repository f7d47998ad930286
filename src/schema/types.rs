//! Schema description types
//!
//! A schema description is an ordered list of collections:
//!
//! ```json
//! [
//!   {
//!     "name": "users",
//!     "options": { "keyPath": "id", "autoIncrement": false },
//!     "indexes": [{ "name": "byRole", "keyPath": "role", "options": { "unique": false } }],
//!     "data": [{ "id": 1, "role": "admin" }]
//!   }
//! ]
//! ```

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::engine::{IndexOptions, StoreOptions};

/// Secondary index declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexSchema {
    pub name: String,
    #[serde(rename = "keyPath", alias = "key_path")]
    pub key_path: String,
    #[serde(default)]
    pub options: IndexOptions,
}

/// Collection declaration with optional seed data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionSchema {
    pub name: String,
    #[serde(default)]
    pub options: StoreOptions,
    #[serde(default)]
    pub indexes: Vec<IndexSchema>,
    /// Records inserted right after the collection is first created
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl CollectionSchema {
    pub fn new(name: impl Into<String>, options: StoreOptions) -> Self {
        Self {
            name: name.into(),
            options,
            indexes: Vec::new(),
            data: None,
        }
    }

    pub fn with_index(
        mut self,
        name: impl Into<String>,
        key_path: impl Into<String>,
        options: IndexOptions,
    ) -> Self {
        self.indexes.push(IndexSchema {
            name: name.into(),
            key_path: key_path.into(),
            options,
        });
        self
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Validates the declaration itself (not its data)
    pub fn validate_structure(&self) -> Result<(), String> {
        if self.name.is_empty() {
            return Err("collection name must not be empty".into());
        }
        if let Some(path) = &self.options.key_path {
            validate_key_path(path)
                .map_err(|e| format!("collection '{}' keyPath: {}", self.name, e))?;
        }

        let mut seen = HashSet::new();
        for index in &self.indexes {
            if index.name.is_empty() {
                return Err(format!("collection '{}' has an unnamed index", self.name));
            }
            if !seen.insert(index.name.as_str()) {
                return Err(format!(
                    "collection '{}' declares index '{}' twice",
                    self.name, index.name
                ));
            }
            validate_key_path(&index.key_path)
                .map_err(|e| format!("index '{}' keyPath: {}", index.name, e))?;
        }

        match &self.data {
            None | Some(Value::Object(_)) | Some(Value::Array(_)) => Ok(()),
            Some(_) => Err(format!(
                "collection '{}' data must be an object or an array",
                self.name
            )),
        }
    }
}

fn validate_key_path(path: &str) -> Result<(), String> {
    if path.is_empty() || path.split('.').any(str::is_empty) {
        return Err(format!("'{}' is not a valid key path", path));
    }
    Ok(())
}

/// Validates a full schema list: each collection plus unique names
pub fn validate_schemas(schemas: &[CollectionSchema]) -> Result<(), String> {
    let mut names = HashSet::new();
    for schema in schemas {
        schema.validate_structure()?;
        if !names.insert(schema.name.as_str()) {
            return Err(format!("collection '{}' declared twice", schema.name));
        }
    }
    Ok(())
}

//! Schema loader
//!
//! Reads a schema description (a JSON array of collections) from disk or
//! from an inline value. Malformed descriptions are rejected before the
//! engine is touched.

use std::fs;
use std::path::Path;

use serde_json::Value;

use super::errors::{SchemaError, SchemaResult};
use super::types::{validate_schemas, CollectionSchema};

pub struct SchemaLoader;

impl SchemaLoader {
    /// Loads and validates a schema file
    pub fn load_file(path: &Path) -> SchemaResult<Vec<CollectionSchema>> {
        let origin = path.display().to_string();
        let content = fs::read_to_string(path).map_err(|e| {
            SchemaError::malformed_schema(&origin, format!("Failed to read file: {}", e))
        })?;
        Self::load_str(&content, &origin)
    }

    /// Parses and validates a schema description held in a string
    pub fn load_str(content: &str, origin: &str) -> SchemaResult<Vec<CollectionSchema>> {
        let schemas: Vec<CollectionSchema> = serde_json::from_str(content)
            .map_err(|e| SchemaError::malformed_schema(origin, format!("Invalid JSON: {}", e)))?;
        Self::validated(schemas, origin)
    }

    /// Converts an inline JSON value into validated schemas
    pub fn load_value(value: Value) -> SchemaResult<Vec<CollectionSchema>> {
        let schemas: Vec<CollectionSchema> = serde_json::from_value(value)
            .map_err(|e| SchemaError::malformed_schema("<inline>", e.to_string()))?;
        Self::validated(schemas, "<inline>")
    }

    fn validated(schemas: Vec<CollectionSchema>, origin: &str) -> SchemaResult<Vec<CollectionSchema>> {
        validate_schemas(&schemas).map_err(|e| SchemaError::malformed_schema(origin, e))?;
        Ok(schemas)
    }
}

//! Schema subsystem
//!
//! Schemas are static descriptions of collections, their key options,
//! their secondary indexes and optional seed data. They are applied once,
//! when a database is first created.
//!
//! # Design Principles
//!
//! - Descriptions are validated before any engine call
//! - Registration runs inside the upgrade transaction
//! - Upgrading a populated database fails loudly

mod errors;
mod loader;
mod registrar;
mod types;

pub use errors::{SchemaError, SchemaErrorCode, SchemaResult, Severity};
pub use loader::SchemaLoader;
pub use registrar::{RegistrationReport, SchemaRegistrar};
pub use types::{validate_schemas, CollectionSchema, IndexSchema};

//! Connection subsystem
//!
//! Opens a named, versioned database from a `ConnectConfig`: registers the
//! declared collections on first creation, seeds their data and hands out
//! the query executor.

mod config;
mod database;
mod errors;

pub use config::ConnectConfig;
pub use database::Database;
pub use errors::{ConnectionError, ConnectionResult};

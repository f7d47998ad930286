//! Observable events
//!
//! Every log line carries one of these stable event names.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Configuration
    /// Connect configuration loaded and validated
    ConfigLoaded,
    /// Schema description loaded
    SchemasLoaded,

    // Connection lifecycle
    /// Database opened and ready
    Connected,
    /// Version change started
    UpgradeBegin,
    /// Collection declared during an upgrade
    CollectionRegistered,
    /// Upgrade from a populated version refused (FATAL)
    MigrationRefused,
    /// Seeding of one collection started
    SeedingStarted,
    /// All seed inserts completed
    SeedingComplete,

    // Queries
    /// Query executed successfully
    QueryExecuted,
    /// Query rejected or failed
    QueryRejected,
    /// Insert payload was neither an object nor an array
    UnsupportedPayload,
    /// Update or delete without a resolvable key
    KeylessWriteSkipped,
    /// Explain produced
    ExplainComplete,

    // Snapshots
    SnapshotSaved,
    SnapshotLoaded,
}

impl Event {
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::SchemasLoaded => "SCHEMAS_LOADED",

            Event::Connected => "CONNECTED",
            Event::UpgradeBegin => "UPGRADE_BEGIN",
            Event::CollectionRegistered => "COLLECTION_REGISTERED",
            Event::MigrationRefused => "MIGRATION_REFUSED",
            Event::SeedingStarted => "SEEDING_STARTED",
            Event::SeedingComplete => "SEEDING_COMPLETE",

            Event::QueryExecuted => "QUERY_COMPLETE",
            Event::QueryRejected => "QUERY_REJECTED",
            Event::UnsupportedPayload => "UNSUPPORTED_PAYLOAD",
            Event::KeylessWriteSkipped => "KEYLESS_WRITE_SKIPPED",
            Event::ExplainComplete => "EXPLAIN_COMPLETE",

            Event::SnapshotSaved => "SNAPSHOT_SAVED",
            Event::SnapshotLoaded => "SNAPSHOT_LOADED",
        }
    }

    /// Returns true if this event indicates a fatal condition
    pub fn is_fatal(&self) -> bool {
        matches!(self, Event::MigrationRefused)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

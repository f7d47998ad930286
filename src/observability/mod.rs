//! Observability subsystem
//!
//! Structured, event-named logging on top of `tracing`. Library code only
//! emits events; installing a subscriber is up to the binary.
//!
//! # Usage
//!
//! ```ignore
//! use keyshelf::observability::{init_tracing, Event, Logger};
//!
//! init_tracing();
//! Logger::info(Event::Connected, &[("name", "app"), ("version", "1")]);
//! ```

mod events;
mod logger;

pub use events::Event;
pub use logger::{render_fields, Logger, Severity};

use tracing_subscriber::EnvFilter;

/// Installs a stderr fmt subscriber filtered by `RUST_LOG` (default `info`).
///
/// Stdout is left untouched so command output stays machine-readable.
/// Calling this more than once is harmless.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

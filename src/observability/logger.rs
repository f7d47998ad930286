//! Structured logger
//!
//! Thin facade over `tracing`: one call = one event, named by an `Event`
//! and carrying `(key, value)` fields in alphabetical key order.

use std::fmt;

use super::events::Event;

/// Log severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Trace = 0,
    Info = 1,
    Warn = 2,
    Error = 3,
    /// Unrecoverable for the current operation
    Fatal = 4,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Trace => "TRACE",
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
            Severity::Fatal => "FATAL",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

pub struct Logger;

impl Logger {
    /// Emits `event` at `severity` with `fields`
    pub fn log(severity: Severity, event: Event, fields: &[(&str, &str)]) {
        let rendered = render_fields(fields);
        let name = event.as_str();
        match severity {
            Severity::Trace => tracing::trace!(event = name, "{}", rendered),
            Severity::Info => tracing::info!(event = name, "{}", rendered),
            Severity::Warn => tracing::warn!(event = name, "{}", rendered),
            Severity::Error => tracing::error!(event = name, "{}", rendered),
            Severity::Fatal => tracing::error!(event = name, fatal = true, "{}", rendered),
        }
    }

    pub fn trace(event: Event, fields: &[(&str, &str)]) {
        Self::log(Severity::Trace, event, fields);
    }

    pub fn info(event: Event, fields: &[(&str, &str)]) {
        Self::log(Severity::Info, event, fields);
    }

    pub fn warn(event: Event, fields: &[(&str, &str)]) {
        Self::log(Severity::Warn, event, fields);
    }

    /// Logs at ERROR, or FATAL for fatal events
    pub fn error(event: Event, fields: &[(&str, &str)]) {
        let severity = if event.is_fatal() {
            Severity::Fatal
        } else {
            Severity::Error
        };
        Self::log(severity, event, fields);
    }
}

/// Renders fields as `key=value` pairs sorted by key.
///
/// Values containing whitespace, quotes or `=` are quoted.
pub fn render_fields(fields: &[(&str, &str)]) -> String {
    let mut sorted: Vec<_> = fields.iter().collect();
    sorted.sort_by_key(|(k, _)| *k);

    let mut output = String::with_capacity(64);
    for (i, (key, value)) in sorted.into_iter().enumerate() {
        if i > 0 {
            output.push(' ');
        }
        output.push_str(key);
        output.push('=');
        if value.is_empty() || value.chars().any(|c| c.is_whitespace() || c == '"' || c == '=') {
            output.push('"');
            for c in value.chars() {
                match c {
                    '"' => output.push_str("\\\""),
                    '\\' => output.push_str("\\\\"),
                    '\n' => output.push_str("\\n"),
                    c => output.push(c),
                }
            }
            output.push('"');
        } else {
            output.push_str(value);
        }
    }
    output
}

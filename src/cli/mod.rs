//! CLI module for keyshelf
//!
//! Provides command-line interface for:
//! - init: Create the database and its snapshot
//! - query: One-shot query execution
//! - run: JSON-lines batch execution
//! - explain: One-shot explain of a select

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{explain, init, query, respond, run, run_batch, run_command};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{read_request, read_requests, write_response};

//! CLI argument definitions using clap
//!
//! Commands:
//! - keyshelf init --config <path>
//! - keyshelf query --config <path>
//! - keyshelf run --config <path>
//! - keyshelf explain --config <path>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// keyshelf - declarative queries over an indexed object store
#[derive(Parser, Debug)]
#[command(name = "keyshelf")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create the database and its snapshot file
    Init {
        /// Path to configuration file
        #[arg(long, default_value = "./keyshelf.json")]
        config: PathBuf,
    },

    /// Execute a single query read from stdin and exit
    Query {
        /// Path to configuration file
        #[arg(long, default_value = "./keyshelf.json")]
        config: PathBuf,
    },

    /// Execute one query per stdin line, answering each on stdout
    Run {
        /// Path to configuration file
        #[arg(long, default_value = "./keyshelf.json")]
        config: PathBuf,

        /// Stop at the first failed query
        #[arg(long)]
        fail_fast: bool,
    },

    /// Describe how a select query read from stdin would execute
    Explain {
        /// Path to configuration file
        #[arg(long, default_value = "./keyshelf.json")]
        config: PathBuf,

        /// Print the plan as text instead of JSON
        #[arg(long)]
        text: bool,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

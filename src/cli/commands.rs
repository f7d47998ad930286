//! CLI command implementations
//!
//! Every command loads the config, connects (registering and seeding on
//! first creation) and answers on stdout in JSON. Logs go to stderr.
//! Successful writes are persisted to the configured snapshot file.

use std::io;
use std::path::Path;

use serde_json::{json, Value};

use crate::connection::{ConnectConfig, Database};
use crate::observability::{init_tracing, Event, Logger};
use crate::planner::Query;

use super::args::{Cli, Command};
use super::errors::{CliError, CliResult};
use super::io::{
    error_response, read_request, read_requests, success_response, write_json, write_response,
    write_text,
};

/// Parse arguments, install logging and run the command
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    init_tracing();
    run_command(cli.command)
}

/// Runs one command on a single-threaded runtime
pub fn run_command(cmd: Command) -> CliResult<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async move {
        match cmd {
            Command::Init { config } => init(&config).await,
            Command::Query { config } => query(&config).await,
            Command::Run { config, fail_fast } => run_batch(&config, fail_fast).await,
            Command::Explain { config, text } => explain(&config, text).await,
        }
    })
}

async fn connect(config_path: &Path) -> CliResult<Database> {
    let config = ConnectConfig::load(config_path)?;
    Logger::info(
        Event::ConfigLoaded,
        &[
            ("name", config.name.as_str()),
            ("path", &config_path.display().to_string()),
        ],
    );
    Ok(Database::connect(&config).await?)
}

/// Creates the database and writes its first snapshot
pub async fn init(config_path: &Path) -> CliResult<()> {
    let config = ConnectConfig::load(config_path)?;
    if let Some(path) = &config.data_file {
        if path.exists() {
            return Err(CliError::already_initialized(path));
        }
    }

    let db = Database::connect(&config).await?;
    let saved = db.save().await?;

    write_response(json!({
        "initialized": true,
        "name": db.name(),
        "version": db.version().await,
        "collections": db.engine().store_names().await,
        "persisted": saved,
    }))
}

/// Parses and executes one request, returning the JSON response.
///
/// Successful writes are saved to the snapshot file before answering.
pub async fn respond(db: &Database, request: Value) -> Value {
    let query: Query = match serde_json::from_value(request) {
        Ok(query) => query,
        Err(e) => {
            let err = CliError::bad_request(format!("Invalid query: {}", e));
            return error_response(err.code_str(), err.message());
        }
    };

    match db.execute(&query).await {
        Ok(output) => {
            if query.is_write() {
                if let Err(e) = db.save().await {
                    return error_response(e.code(), &e.to_string());
                }
            }
            success_response(output.into_json())
        }
        Err(e) => error_response(e.code().code(), &e.to_string()),
    }
}

fn is_error(response: &Value) -> bool {
    response["status"] == "error"
}

/// Executes a single query read from stdin
pub async fn query(config_path: &Path) -> CliResult<()> {
    let db = connect(config_path).await?;
    let request = read_request()?;
    write_json(&respond(&db, request).await)
}

/// Executes one query per stdin line
pub async fn run_batch(config_path: &Path, fail_fast: bool) -> CliResult<()> {
    let db = connect(config_path).await?;

    let mut total = 0;
    let mut failed = 0;
    for request in read_requests(io::stdin().lock()) {
        total += 1;
        let response = match request {
            Ok(request) => respond(&db, request).await,
            Err(e) => error_response(e.code_str(), e.message()),
        };
        write_json(&response)?;

        if is_error(&response) {
            failed += 1;
            if fail_fast {
                break;
            }
        }
    }

    if failed > 0 {
        return Err(CliError::batch_failed(failed, total));
    }
    Ok(())
}

/// Explains a select query read from stdin
pub async fn explain(config_path: &Path, text: bool) -> CliResult<()> {
    let db = connect(config_path).await?;
    let request = read_request()?;

    let select = match serde_json::from_value::<Query>(request)? {
        Query::Select(select) => select,
        other => {
            return Err(CliError::bad_request(format!(
                "explain expects a select query, got '{}'",
                other.kind()
            )))
        }
    };

    let plan = match db.executor().explain(&select).await {
        Ok(plan) => plan,
        Err(e) => return write_json(&error_response(e.code().code(), &e.to_string())),
    };

    if text {
        write_text(&plan.to_string())
    } else {
        write_response(serde_json::to_value(&plan)?)
    }
}

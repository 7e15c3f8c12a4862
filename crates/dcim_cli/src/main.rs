//! `dcim` command-line front end.
//!
//! # Responsibility
//! - Map Create/Read/Replace/Delete onto subcommands.
//! - Render core results as JSON envelopes and core error kinds as exit codes.
//!
//! # Invariants
//! - Success output goes to stdout, failure output to stderr, one JSON line each.
//! - The repository is built once at startup and injected into the service.

use clap::{Parser, Subcommand};
use dcim_core::db::open_db;
use dcim_core::{
    init_logging, ComponentService, CoreConfig, ErrorKind, SqliteComponentRepository,
};
use log::info;
use serde_json::{json, Value};
use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

/// Exit code for a configuration that could not be used (sysexits EX_CONFIG).
const EXIT_CONFIG: u8 = 78;

/// Component inventory for data-center infrastructure
#[derive(Parser, Debug)]
#[command(name = "dcim", version, long_about = None)]
struct Args {
    /// SQLite database file (overrides DCIM_DB_PATH)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Log level: trace|debug|info|warn|error (overrides DCIM_LOG_LEVEL)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Absolute directory for rolling log files (overrides DCIM_LOG_DIR)
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a component from a JSON body
    Create {
        /// Component JSON, or `-` to read it from stdin
        #[arg(long)]
        json: String,
    },
    /// Read a component by uid or xname
    Read { id: String },
    /// Replace the component at a uid with a JSON body
    Replace {
        id: String,
        /// Component JSON, or `-` to read it from stdin
        #[arg(long)]
        json: String,
    },
    /// Delete the component at a uid
    Delete { id: String },
}

/// Rendered failure: stderr body plus process exit code.
struct Failure {
    code: u8,
    body: Value,
}

impl Failure {
    fn from_kind(kind: ErrorKind, message: impl ToString) -> Self {
        Self {
            code: exit_code(kind),
            body: json!({ "error": message.to_string(), "kind": kind.as_str() }),
        }
    }

    fn config(message: impl ToString) -> Self {
        Self {
            code: EXIT_CONFIG,
            body: json!({ "error": message.to_string(), "kind": "config" }),
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run(args) {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(failure) => {
            eprintln!("{}", failure.body);
            ExitCode::from(failure.code)
        }
    }
}

fn run(args: Args) -> Result<Value, Failure> {
    let config = resolve_config(&args)?;
    if let Some(log_dir) = &config.log_dir {
        init_logging(&config.log_level, log_dir).map_err(Failure::config)?;
    }

    let conn = open_db(&config.db_path).map_err(|err| Failure::from_kind(err.kind(), err))?;
    let repo = SqliteComponentRepository::try_new(&conn)
        .map_err(|err| Failure::from_kind(err.kind(), err))?;
    let service = ComponentService::new(repo);
    info!(
        "event=cli_start module=cli status=ok db_path={}",
        config.db_path.display()
    );

    let outcome = match args.command {
        Command::Create { json } => service
            .create(&read_body(&json)?)
            .map(|component| json!({ "component": component })),
        Command::Read { id } => service
            .read(&id)
            .map(|component| json!({ "component": component })),
        Command::Replace { id, json } => service
            .replace(&id, &read_body(&json)?)
            .map(|component| json!({ "component": component })),
        Command::Delete { id } => service
            .delete(&id)
            .map(|uid| json!({ "deleted": uid.to_string() })),
    };
    outcome.map_err(|err| Failure::from_kind(err.kind(), err))
}

fn resolve_config(args: &Args) -> Result<CoreConfig, Failure> {
    let mut config = CoreConfig::from_env().map_err(Failure::config)?;
    if let Some(db) = &args.db {
        config.db_path = db.clone();
    }
    if let Some(level) = &args.log_level {
        config.log_level = level.clone();
    }
    if let Some(dir) = &args.log_dir {
        config.log_dir = Some(dir.clone());
    }
    config.validate().map_err(Failure::config)?;
    Ok(config)
}

fn read_body(arg: &str) -> Result<String, Failure> {
    if arg != "-" {
        return Ok(arg.to_string());
    }
    let mut body = String::new();
    std::io::stdin()
        .read_to_string(&mut body)
        .map_err(|err| Failure::from_kind(ErrorKind::MalformedInput, err))?;
    Ok(body)
}

fn exit_code(kind: ErrorKind) -> u8 {
    match kind {
        ErrorKind::MalformedInput => 2,
        ErrorKind::ValidationFailure => 3,
        ErrorKind::NotFound => 4,
        ErrorKind::Conflict => 5,
        ErrorKind::Unavailable => 69,
        ErrorKind::Internal => 70,
    }
}

//! CLI command implementations
//!
//! `serve` follows a strict boot order:
//!
//! 1. Load and validate config
//! 2. Set the log level
//! 3. Recover every topic on disk
//! 4. Accept HTTP requests
//! 5. On Ctrl-C: stop accepting, then close all topics (drain WALs)

use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde_json::{json, Value};

use crate::config::QueueConfig;
use crate::http_server::HttpServer;
use crate::observability::{log_event, Event, Logger};
use crate::recovery::WalReplayer;
use crate::registry::TopicRegistry;
use crate::topic::{validate_topic_name, Message};
use crate::wal::{topic_log_path, LogEntry, WalReader};

use super::args::Command;
use super::errors::{CliError, CliResult};
use super::io::{write_error, write_response};

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
/// This is the only function that main.rs should call.
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    let result = run_command(cli.command);
    if let Err(ref e) = result {
        // Best effort: stdout may be the thing that failed
        let _ = write_error(e.code_str(), e.message());
    }
    result
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Init { config } => init(&config),
        Command::Serve { config, port } => serve(&config, port),
        Command::Inspect { config, topic } => inspect(&config, &topic),
    }
}

/// Writes a default config at `config_path` if there is none, then creates
/// the data directory it names.
pub fn init(config_path: &Path) -> CliResult<()> {
    let created_config = !config_path.exists();
    if created_config {
        if let Some(parent) = config_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let defaults = serde_json::to_string_pretty(&QueueConfig::default())?;
        fs::write(config_path, defaults + "\n")?;
    }

    let config = QueueConfig::load(config_path)?;
    fs::create_dir_all(config.data_path()).map_err(|e| {
        CliError::io_error(format!(
            "Failed to create data directory {}: {}",
            config.data_dir, e
        ))
    })?;

    write_response(json!({
        "config": config_path.display().to_string(),
        "config_created": created_config,
        "data_dir": config.data_dir,
    }))
}

/// Recovers all topics and serves HTTP until Ctrl-C.
pub fn serve(config_path: &Path, port: Option<u16>) -> CliResult<()> {
    let mut config = QueueConfig::load(config_path)?;
    Logger::set_min_level(config.level());
    log_event(Event::BootStart, &[("config", &config_path.display().to_string())]);

    if let Some(port) = port {
        config.http.port = port;
    }
    log_event(
        Event::ConfigLoaded,
        &[
            ("data_dir", &config.data_dir),
            ("log_level", &config.log_level),
            ("port", &config.http.port.to_string()),
        ],
    );

    let topic_config = config.topic_config();
    let registry = Arc::new(TopicRegistry::new(config.data_path(), topic_config.clone()));
    registry.load_from_disk(&topic_config)?;

    let server = HttpServer::with_config(config.http.clone(), Arc::clone(&registry));

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::boot_failed(format!("Failed to create tokio runtime: {}", e)))?;

    let served = rt.block_on(async {
        server
            .start()
            .await
            .map_err(|e| CliError::boot_failed(format!("HTTP server failed: {}", e)))
    });

    registry.close_all();
    log_event(
        Event::ShutdownComplete,
        &[("topics", &registry.len().to_string())],
    );

    served
}

/// Prints every record of a topic's log plus the state replay would
/// rebuild from it. The file is not modified.
pub fn inspect(config_path: &Path, topic: &str) -> CliResult<()> {
    let config = QueueConfig::load(config_path)?;
    validate_topic_name(topic).map_err(|e| CliError::not_found(e.to_string()))?;

    let path = topic_log_path(config.data_path(), topic);
    if !path.exists() {
        return Err(CliError::not_found(format!(
            "No log for topic {} at {}",
            topic,
            path.display()
        )));
    }

    let mut reader = WalReader::open(&path)?;
    let entries: Vec<Value> = reader.read_all()?.iter().map(entry_json).collect();
    let tail = reader.discarded_tail().map(|tail| {
        json!({
            "offset": tail.offset,
            "bytes": tail.len,
            "reason": tail.reason,
        })
    });

    let recovered = WalReplayer::replay(&mut WalReader::open(&path)?)?;
    let in_flight: Vec<i64> = {
        let mut ids: Vec<i64> = recovered.in_flight.keys().copied().collect();
        ids.sort_unstable();
        ids
    };

    write_response(json!({
        "topic": topic,
        "path": path.display().to_string(),
        "file_size": reader.file_size(),
        "valid_bytes": reader.valid_offset(),
        "discarded_tail": tail,
        "entries": entries,
        "recovered": {
            "pending": recovered.pending.iter().map(|m| m.id).collect::<Vec<_>>(),
            "in_flight": in_flight,
            "next_id": recovered.next_id,
            "completed": recovered.stats.completed,
        },
    }))
}

fn entry_json(entry: &LogEntry) -> Value {
    let Message {
        id,
        payload,
        timestamp,
        acked,
        retries,
    } = &entry.message;

    json!({
        "type": entry.kind.as_str(),
        "id": id,
        "payload": payload,
        "timestamp": timestamp.to_rfc3339(),
        "acked": acked,
        "retries": retries,
    })
}

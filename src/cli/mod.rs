//! CLI module for emberq
//!
//! Provides command-line interface for:
//! - init: Write a default config and create the data directory
//! - serve: Recover topics and serve HTTP
//! - inspect: Decode a topic's write-ahead log

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{init, inspect, run, run_command, serve};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{write_error, write_response};

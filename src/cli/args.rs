//! CLI argument definitions using clap
//!
//! Commands:
//! - emberq init --config <path>
//! - emberq serve --config <path> [--port <port>]
//! - emberq inspect --config <path> --topic <name>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// emberq - a single-node durable message queue
#[derive(Parser, Debug)]
#[command(name = "emberq")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Write a default config if none exists and create the data directory
    Init {
        /// Path to configuration file
        #[arg(long, default_value = "./emberq.json")]
        config: PathBuf,
    },

    /// Recover topics from disk and serve HTTP until Ctrl-C
    Serve {
        /// Path to configuration file
        #[arg(long, default_value = "./emberq.json")]
        config: PathBuf,

        /// Override the configured HTTP port
        #[arg(long)]
        port: Option<u16>,
    },

    /// Decode a topic's log and print its records and recovered state
    Inspect {
        /// Path to configuration file
        #[arg(long, default_value = "./emberq.json")]
        config: PathBuf,

        /// Topic to inspect
        #[arg(long)]
        topic: String,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serve_port_is_optional() {
        let cli = Cli::try_parse_from(["emberq", "serve"]).unwrap();
        match cli.command {
            Command::Serve { config, port } => {
                assert_eq!(config, PathBuf::from("./emberq.json"));
                assert_eq!(port, None);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_inspect_requires_topic() {
        assert!(Cli::try_parse_from(["emberq", "inspect"]).is_err());

        let cli = Cli::try_parse_from(["emberq", "inspect", "--topic", "orders"]).unwrap();
        assert!(matches!(cli.command, Command::Inspect { ref topic, .. } if topic == "orders"));
    }
}

//! Queue configuration
//!
//! Loaded from one JSON file. Every key is optional; an empty object `{}`
//! is a complete configuration.
//!
//! ```json
//! {
//!   "data_dir": "data",
//!   "log_level": "info",
//!   "topic": { "ack_timeout_ms": 30000, "max_retries": 3,
//!              "sweep_interval_ms": 2000, "initial_capacity": 10000 },
//!   "wal": { "batch_max_entries": 100, "flush_interval_ms": 50,
//!            "channel_capacity": 10000, "fsync": true },
//!   "http": { "host": "0.0.0.0", "port": 8080 }
//! }
//! ```

mod errors;

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::http_server::HttpServerConfig;
use crate::observability::Level;
use crate::topic::TopicConfig;
use crate::wal::WalOptions;

pub use errors::{ConfigError, ConfigResult};

/// Top-level configuration file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Directory holding `<topic>.wal` files
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub topic: TopicSection,

    #[serde(default)]
    pub wal: WalSection,

    #[serde(default)]
    pub http: HttpServerConfig,
}

/// Delivery settings applied to every topic
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicSection {
    #[serde(default = "default_ack_timeout_ms")]
    pub ack_timeout_ms: u64,

    #[serde(default = "default_max_retries")]
    pub max_retries: i32,

    #[serde(default = "default_sweep_interval_ms")]
    pub sweep_interval_ms: u64,

    #[serde(default = "default_initial_capacity")]
    pub initial_capacity: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalSection {
    #[serde(default = "default_batch_max_entries")]
    pub batch_max_entries: usize,

    #[serde(default = "default_flush_interval_ms")]
    pub flush_interval_ms: u64,

    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,

    #[serde(default = "default_fsync")]
    pub fsync: bool,
}

fn default_data_dir() -> String {
    "data".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_ack_timeout_ms() -> u64 {
    30_000
}
fn default_max_retries() -> i32 {
    3
}
fn default_sweep_interval_ms() -> u64 {
    2_000
}
fn default_initial_capacity() -> usize {
    10_000
}
fn default_batch_max_entries() -> usize {
    100
}
fn default_flush_interval_ms() -> u64 {
    50
}
fn default_channel_capacity() -> usize {
    10_000
}
fn default_fsync() -> bool {
    true
}

impl Default for TopicSection {
    fn default() -> Self {
        Self {
            ack_timeout_ms: default_ack_timeout_ms(),
            max_retries: default_max_retries(),
            sweep_interval_ms: default_sweep_interval_ms(),
            initial_capacity: default_initial_capacity(),
        }
    }
}

impl Default for WalSection {
    fn default() -> Self {
        Self {
            batch_max_entries: default_batch_max_entries(),
            flush_interval_ms: default_flush_interval_ms(),
            channel_capacity: default_channel_capacity(),
            fsync: default_fsync(),
        }
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_level: default_log_level(),
            topic: TopicSection::default(),
            wal: WalSection::default(),
            http: HttpServerConfig::default(),
        }
    }
}

impl QueueConfig {
    /// Reads, parses and validates the file at `path`.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json(&content).map_err(|e| match e {
            ConfigError::Parse { source, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })?;
        Ok(config)
    }

    /// Parses and validates a JSON document.
    pub fn from_json(content: &str) -> ConfigResult<Self> {
        let config: QueueConfig =
            serde_json::from_str(content).map_err(|source| ConfigError::Parse {
                path: Default::default(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.data_dir.trim().is_empty() {
            return Err(ConfigError::invalid("data_dir", "must not be empty"));
        }
        if Level::parse(&self.log_level).is_none() {
            return Err(ConfigError::invalid(
                "log_level",
                format!("unknown level '{}'", self.log_level),
            ));
        }
        if self.topic.max_retries < 0 {
            return Err(ConfigError::invalid("topic.max_retries", "must be >= 0"));
        }
        if self.topic.sweep_interval_ms == 0 {
            return Err(ConfigError::invalid("topic.sweep_interval_ms", "must be > 0"));
        }
        if self.topic.initial_capacity == 0 {
            return Err(ConfigError::invalid("topic.initial_capacity", "must be > 0"));
        }
        if self.wal.batch_max_entries == 0 {
            return Err(ConfigError::invalid("wal.batch_max_entries", "must be > 0"));
        }
        if self.wal.flush_interval_ms == 0 {
            return Err(ConfigError::invalid("wal.flush_interval_ms", "must be > 0"));
        }
        if self.wal.channel_capacity == 0 {
            return Err(ConfigError::invalid("wal.channel_capacity", "must be > 0"));
        }
        Ok(())
    }

    pub fn data_path(&self) -> &Path {
        Path::new(&self.data_dir)
    }

    /// Parsed `log_level`; INFO if it does not parse.
    pub fn level(&self) -> Level {
        Level::parse(&self.log_level).unwrap_or(Level::Info)
    }

    pub fn wal_options(&self) -> WalOptions {
        WalOptions {
            batch_max_entries: self.wal.batch_max_entries,
            flush_interval: Duration::from_millis(self.wal.flush_interval_ms),
            channel_capacity: self.wal.channel_capacity,
            fsync: self.wal.fsync,
        }
    }

    /// Settings every topic is opened with.
    pub fn topic_config(&self) -> TopicConfig {
        TopicConfig {
            ack_timeout: Duration::from_millis(self.topic.ack_timeout_ms),
            max_retries: self.topic.max_retries,
            sweep_interval: Duration::from_millis(self.topic.sweep_interval_ms),
            initial_capacity: self.topic.initial_capacity,
            wal: self.wal_options(),
        }
    }
}

//! Listener settings for the queue's HTTP surface
//!
//! Read from the `http` section of the queue config file. Every field is
//! optional there; `serve --port` overrides `port` after loading.

use serde::{Deserialize, Serialize};

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpServerConfig {
    /// Interface the listener binds
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Origins allowed by the CORS layer. Left empty, any origin may call
    /// the queue.
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: Vec::new(),
        }
    }
}

impl HttpServerConfig {
    /// Default listener on `port`
    pub fn with_port(port: u16) -> Self {
        Self {
            port,
            ..Default::default()
        }
    }

    /// `host:port`, as handed to the socket address parser
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

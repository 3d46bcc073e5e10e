//! CLI-specific error types
//!
//! Every CLI error ends the process with a non-zero exit code.

use std::fmt;
use std::io;

use crate::config::ConfigError;
use crate::registry::RegistryError;
use crate::wal::WalError;

/// CLI error codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Configuration file missing, malformed or invalid
    ConfigError,
    /// I/O error (stdout, data directory)
    IoError,
    /// Topic name or log does not exist
    NotFound,
    /// Recovery or server start failed
    BootFailed,
}

impl CliErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "EMBERQ_CLI_CONFIG_ERROR",
            Self::IoError => "EMBERQ_CLI_IO_ERROR",
            Self::NotFound => "EMBERQ_CLI_NOT_FOUND",
            Self::BootFailed => "EMBERQ_CLI_BOOT_FAILED",
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, msg)
    }

    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::NotFound, msg)
    }

    pub fn boot_failed(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::BootFailed, msg)
    }

    pub fn code(&self) -> &CliErrorCode {
        &self.code
    }

    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::io_error(format!("JSON error: {}", e))
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        Self::config_error(e.to_string())
    }
}

impl From<RegistryError> for CliError {
    fn from(e: RegistryError) -> Self {
        Self::boot_failed(e.to_string())
    }
}

impl From<WalError> for CliError {
    fn from(e: WalError) -> Self {
        Self::io_error(e.to_string())
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_code() {
        let err = CliError::not_found("no log for topic orders");
        assert_eq!(err.to_string(), "EMBERQ_CLI_NOT_FOUND: no log for topic orders");
        assert_eq!(err.code(), &CliErrorCode::NotFound);
    }

    #[test]
    fn test_config_error_conversion() {
        let err: CliError = ConfigError::Invalid {
            field: "topic.max_retries",
            reason: "must be >= 0".to_string(),
        }
        .into();
        assert_eq!(err.code_str(), "EMBERQ_CLI_CONFIG_ERROR");
        assert!(err.message().contains("topic.max_retries"));
    }
}

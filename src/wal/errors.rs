//! WAL error types
//!
//! Error codes:
//! - EMBERQ_WAL_OPEN_FAILED (FATAL severity)
//! - EMBERQ_WAL_READ_FAILED (FATAL severity)
//! - EMBERQ_WAL_WRITE_FAILED (ERROR severity)
//! - EMBERQ_WAL_CLOSED (ERROR severity)

use std::fmt;
use std::io;

/// Severity levels for WAL errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The operation fails, the topic keeps serving
    Error,
    /// The topic cannot be served
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "ERROR"),
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalErrorCode {
    /// Log file or writer thread could not be set up
    EmberWalOpenFailed,
    /// Log file could not be read during replay
    EmberWalReadFailed,
    /// A batch could not be encoded or written
    EmberWalWriteFailed,
    /// The writer has been shut down
    EmberWalClosed,
}

impl WalErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            WalErrorCode::EmberWalOpenFailed => "EMBERQ_WAL_OPEN_FAILED",
            WalErrorCode::EmberWalReadFailed => "EMBERQ_WAL_READ_FAILED",
            WalErrorCode::EmberWalWriteFailed => "EMBERQ_WAL_WRITE_FAILED",
            WalErrorCode::EmberWalClosed => "EMBERQ_WAL_CLOSED",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            WalErrorCode::EmberWalOpenFailed => Severity::Fatal,
            WalErrorCode::EmberWalReadFailed => Severity::Fatal,
            WalErrorCode::EmberWalWriteFailed => Severity::Error,
            WalErrorCode::EmberWalClosed => Severity::Error,
        }
    }
}

impl fmt::Display for WalErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// WAL error with code, message and optional context
#[derive(Debug)]
pub struct WalError {
    code: WalErrorCode,
    message: String,
    details: Option<String>,
    source: Option<io::Error>,
}

impl WalError {
    pub fn open_failed(message: impl Into<String>, source: io::Error) -> Self {
        Self {
            code: WalErrorCode::EmberWalOpenFailed,
            message: message.into(),
            details: None,
            source: Some(source),
        }
    }

    pub fn read_failed(offset: u64, source: io::Error) -> Self {
        Self {
            code: WalErrorCode::EmberWalReadFailed,
            message: "Failed to read WAL record".to_string(),
            details: Some(format!("byte_offset: {}", offset)),
            source: Some(source),
        }
    }

    pub fn write_failed(message: impl Into<String>) -> Self {
        Self {
            code: WalErrorCode::EmberWalWriteFailed,
            message: message.into(),
            details: None,
            source: None,
        }
    }

    /// A record that cannot be represented in the on-disk layout
    pub fn record_too_large(message_id: i64, payload_len: usize) -> Self {
        Self {
            code: WalErrorCode::EmberWalWriteFailed,
            message: format!("Payload of {} bytes exceeds the record limit", payload_len),
            details: Some(format!("message_id: {}", message_id)),
            source: None,
        }
    }

    pub fn closed(topic: &str) -> Self {
        Self {
            code: WalErrorCode::EmberWalClosed,
            message: "WAL writer is closed".to_string(),
            details: Some(format!("topic: {}", topic)),
            source: None,
        }
    }

    pub fn code(&self) -> WalErrorCode {
        self.code
    }

    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn details(&self) -> Option<&str> {
        self.details.as_deref()
    }

    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

impl fmt::Display for WalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.code.severity(), self.code.code(), self.message)?;
        if let Some(ref details) = self.details {
            write!(f, " ({})", details)?;
        }
        if let Some(ref source) = self.source {
            write!(f, ": {}", source)?;
        }
        Ok(())
    }
}

impl std::error::Error for WalError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// Result type for WAL operations
pub type WalResult<T> = Result<T, WalError>;

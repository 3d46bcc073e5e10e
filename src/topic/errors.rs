//! Topic errors

use std::io;

use thiserror::Error;

use crate::wal::WalError;

/// Result type for topic construction and lifecycle
pub type TopicResult<T> = Result<T, TopicError>;

/// Failures that keep a topic from being served.
///
/// Delivery operations themselves never fail; these come from opening,
/// flushing or starting a topic.
#[derive(Debug, Error)]
pub enum TopicError {
    /// Name is empty, too long, or would escape the data directory
    #[error("Invalid topic name: {0:?}")]
    InvalidName(String),

    /// Log could not be replayed, opened or flushed
    #[error(transparent)]
    Wal(#[from] WalError),

    /// Retry sweeper thread could not be spawned
    #[error("Failed to start retry sweeper for topic {topic}: {source}")]
    SweeperStart {
        topic: String,
        #[source]
        source: io::Error,
    },
}

impl TopicError {
    /// Whether the topic cannot be served at all
    pub fn is_fatal(&self) -> bool {
        match self {
            TopicError::InvalidName(_) => false,
            TopicError::Wal(e) => e.is_fatal(),
            TopicError::SweeperStart { .. } => true,
        }
    }
}

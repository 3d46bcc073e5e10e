//! Registry errors

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::topic::TopicError;

pub type RegistryResult<T> = Result<T, RegistryError>;

#[derive(Debug, Error)]
pub enum RegistryError {
    /// A topic could not be opened
    #[error("Topic {name}: {source}")]
    Topic {
        name: String,
        #[source]
        source: TopicError,
    },

    /// The data directory could not be listed
    #[error("Failed to scan data directory {}: {source}", dir.display())]
    Scan {
        dir: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl RegistryError {
    pub(crate) fn topic(name: &str, source: TopicError) -> Self {
        RegistryError::Topic {
            name: name.to_string(),
            source,
        }
    }

    /// True when the failure is the caller's topic name rather than storage
    pub fn is_invalid_name(&self) -> bool {
        matches!(
            self,
            RegistryError::Topic {
                source: TopicError::InvalidName(_),
                ..
            }
        )
    }
}

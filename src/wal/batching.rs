//! WAL batching
//!
//! The writer thread encodes entries into one contiguous buffer and writes
//! the whole buffer with a single `write_all`. Record boundaries and order
//! are preserved: a batch on disk is indistinguishable from the same
//! records written one at a time.

use super::errors::WalResult;
use super::record::LogEntry;

/// Encoded records awaiting a flush
#[derive(Debug, Default)]
pub struct WalBatch {
    buffer: Vec<u8>,
    entries: usize,
}

impl WalBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(bytes: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(bytes),
            entries: 0,
        }
    }

    /// Encodes `entry` onto the end of the batch.
    ///
    /// A record that cannot be encoded is rejected whole; the batch is
    /// unchanged.
    pub fn push(&mut self, entry: &LogEntry) -> WalResult<()> {
        entry.encode_into(&mut self.buffer)?;
        self.entries += 1;
        Ok(())
    }

    pub fn bytes(&self) -> &[u8] {
        &self.buffer
    }

    /// Number of records in the batch
    pub fn len(&self) -> usize {
        self.entries
    }

    pub fn byte_len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries == 0
    }

    /// Empties the batch, keeping its allocation.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.entries = 0;
    }
}

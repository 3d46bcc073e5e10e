//! Sequential WAL reader
//!
//! Replay reads a topic's log from the first byte. The log is trusted up to
//! the first record that does not decode: a record cut short by a crash, or
//! bytes that do not form a record, end the log. Everything before that
//! point is returned; the reader remembers where and why it stopped so the
//! caller can cut the file back before appending to it again.
//!
//! I/O errors other than an early end of file are not a damaged tail and
//! fail the read.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use super::errors::{WalError, WalResult};
use super::record::{DecodeError, LogEntry};

/// Where and why reading stopped before the end of the file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscardedTail {
    /// Byte offset of the first record that failed to decode
    pub offset: u64,
    /// Bytes from `offset` to the end of the file
    pub len: u64,
    pub reason: String,
}

/// WAL reader for sequential replay.
pub struct WalReader {
    path: PathBuf,
    reader: BufReader<File>,
    offset: u64,
    file_size: u64,
    records_read: u64,
    tail: Option<DiscardedTail>,
}

impl WalReader {
    /// Opens a WAL file for reading.
    ///
    /// # Errors
    ///
    /// `EMBERQ_WAL_READ_FAILED` if the file cannot be opened or its size
    /// cannot be determined.
    pub fn open(path: &Path) -> WalResult<Self> {
        let file = File::open(path).map_err(|e| WalError::read_failed(0, e))?;
        let file_size = file
            .metadata()
            .map_err(|e| WalError::read_failed(0, e))?
            .len();

        Ok(Self {
            path: path.to_path_buf(),
            reader: BufReader::new(file),
            offset: 0,
            file_size,
            records_read: 0,
            tail: None,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Byte length of the file when it was opened
    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    /// End of the last record read successfully.
    ///
    /// Once reading has finished this is the length the file should have.
    pub fn valid_offset(&self) -> u64 {
        self.offset
    }

    pub fn records_read(&self) -> u64 {
        self.records_read
    }

    /// Set once a damaged tail has ended the log
    pub fn discarded_tail(&self) -> Option<&DiscardedTail> {
        self.tail.as_ref()
    }

    /// Reads the next record.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(entry))` for each valid record, in file order
    /// - `Ok(None)` at the end of the file or at the first damaged record
    ///   (see `discarded_tail`)
    ///
    /// # Errors
    ///
    /// `EMBERQ_WAL_READ_FAILED` if the file itself cannot be read.
    pub fn read_next(&mut self) -> WalResult<Option<LogEntry>> {
        if self.tail.is_some() || self.offset >= self.file_size {
            return Ok(None);
        }

        let remaining = self.file_size - self.offset;
        match LogEntry::decode(&mut self.reader, remaining) {
            Ok(Some((entry, consumed))) => {
                self.offset += consumed as u64;
                self.records_read += 1;
                Ok(Some(entry))
            }
            Ok(None) => Ok(None),
            Err(DecodeError::Io(e)) => Err(WalError::read_failed(self.offset, e)),
            Err(e) => {
                self.tail = Some(DiscardedTail {
                    offset: self.offset,
                    len: remaining,
                    reason: e.to_string(),
                });
                Ok(None)
            }
        }
    }

    /// Reads every remaining valid record.
    pub fn read_all(&mut self) -> WalResult<Vec<LogEntry>> {
        let mut entries = Vec::new();
        while let Some(entry) = self.read_next()? {
            entries.push(entry);
        }
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topic::Message;
    use crate::wal::EventKind;
    use chrono::Utc;
    use std::fs;
    use tempfile::TempDir;

    fn write_records(path: &Path, entries: &[LogEntry]) -> Vec<u8> {
        let mut bytes = Vec::new();
        for entry in entries {
            entry.encode_into(&mut bytes).unwrap();
        }
        fs::write(path, &bytes).unwrap();
        bytes
    }

    fn entry(kind: EventKind, id: i64) -> LogEntry {
        LogEntry::new(kind, Message::new(id, format!("payload-{}", id), Utc::now()))
    }

    #[test]
    fn test_empty_file_reads_nothing() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("empty.wal");
        fs::write(&path, b"").unwrap();

        let mut reader = WalReader::open(&path).unwrap();
        assert!(reader.read_next().unwrap().is_none());
        assert!(reader.discarded_tail().is_none());
        assert_eq!(reader.valid_offset(), 0);
    }

    #[test]
    fn test_missing_file_fails() {
        let temp = TempDir::new().unwrap();
        let err = WalReader::open(&temp.path().join("missing.wal")).err().unwrap();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_reads_records_in_order() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("t.wal");
        let bytes = write_records(
            &path,
            &[
                entry(EventKind::Enqueue, 1),
                entry(EventKind::Enqueue, 2),
                entry(EventKind::Deliver, 1),
            ],
        );

        let mut reader = WalReader::open(&path).unwrap();
        let entries = reader.read_all().unwrap();

        let seen: Vec<(EventKind, i64)> =
            entries.iter().map(|e| (e.kind, e.message.id)).collect();
        assert_eq!(
            seen,
            vec![
                (EventKind::Enqueue, 1),
                (EventKind::Enqueue, 2),
                (EventKind::Deliver, 1)
            ]
        );
        assert_eq!(reader.valid_offset(), bytes.len() as u64);
        assert_eq!(reader.records_read(), 3);
    }

    #[test]
    fn test_truncated_tail_is_reported_not_fatal() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("t.wal");
        let bytes = write_records(
            &path,
            &[entry(EventKind::Enqueue, 1), entry(EventKind::Enqueue, 2)],
        );
        let first_len = entry(EventKind::Enqueue, 1).encoded_len() as u64;
        fs::write(&path, &bytes[..bytes.len() - 3]).unwrap();

        let mut reader = WalReader::open(&path).unwrap();
        let entries = reader.read_all().unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(reader.valid_offset(), first_len);
        let tail = reader.discarded_tail().unwrap();
        assert_eq!(tail.offset, first_len);
        assert_eq!(tail.len, bytes.len() as u64 - 3 - first_len);
    }

    #[test]
    fn test_garbage_after_valid_records_ends_log() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("t.wal");
        let mut bytes = write_records(&path, &[entry(EventKind::Enqueue, 1)]);
        let valid = bytes.len() as u64;
        bytes.extend_from_slice(&[4, 0, b'j', b'u', b'n', b'k']);
        bytes.extend_from_slice(&[0u8; 32]);
        fs::write(&path, &bytes).unwrap();

        let mut reader = WalReader::open(&path).unwrap();
        assert_eq!(reader.read_all().unwrap().len(), 1);
        assert_eq!(reader.valid_offset(), valid);
        assert!(reader.discarded_tail().unwrap().reason.contains("malformed"));

        // Stays stopped
        assert!(reader.read_next().unwrap().is_none());
    }
}

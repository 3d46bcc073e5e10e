//! Replay source backed by a topic's log file

use std::path::Path;

use crate::observability::{log_event, Event};
use crate::wal::{LogEntry, Wal, WalReader, WalResult};

use super::replay::{RecoveredTopic, WalRead, WalReplayer};

impl WalRead for WalReader {
    fn read_next(&mut self) -> WalResult<Option<LogEntry>> {
        WalReader::read_next(self)
    }

    fn current_offset(&self) -> u64 {
        self.valid_offset()
    }
}

/// Replays the log at `path` for `topic`.
///
/// A missing file is a fresh topic. If replay stopped at a damaged record,
/// the file is cut back to the last valid record so later appends line up
/// with record boundaries.
pub fn recover_topic_log(path: &Path, topic: &str) -> WalResult<RecoveredTopic> {
    if !path.exists() {
        return Ok(RecoveredTopic::empty());
    }

    let mut reader = WalReader::open(path)?;
    let recovered = WalReplayer::replay(&mut reader)?;

    if let Some(tail) = reader.discarded_tail() {
        log_event(
            Event::WalTailDiscarded,
            &[
                ("topic", topic),
                ("offset", &tail.offset.to_string()),
                ("bytes", &tail.len.to_string()),
                ("reason", &tail.reason),
            ],
        );
        Wal::discard_tail(path, reader.valid_offset())?;
    }

    Ok(recovered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topic::Message;
    use crate::wal::{topic_log_path, EventKind};
    use chrono::Utc;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_missing_log_is_fresh_topic() {
        let temp = TempDir::new().unwrap();
        let recovered = recover_topic_log(&topic_log_path(temp.path(), "t"), "t").unwrap();
        assert_eq!(recovered, RecoveredTopic::empty());
    }

    #[test]
    fn test_damaged_tail_is_cut_off() {
        let temp = TempDir::new().unwrap();
        let path = topic_log_path(temp.path(), "t");

        let mut bytes = LogEntry::new(EventKind::Enqueue, Message::new(1, "kept", Utc::now()))
            .encode()
            .unwrap();
        let valid = bytes.len();
        let partial = LogEntry::new(EventKind::Enqueue, Message::new(2, "lost", Utc::now()))
            .encode()
            .unwrap();
        bytes.extend_from_slice(&partial[..partial.len() / 2]);
        fs::write(&path, &bytes).unwrap();

        let recovered = recover_topic_log(&path, "t").unwrap();

        assert_eq!(recovered.pending.len(), 1);
        assert_eq!(recovered.pending[0].payload, "kept");
        assert_eq!(recovered.next_id, 2);
        assert_eq!(fs::metadata(&path).unwrap().len(), valid as u64);
    }
}

//! WAL replay for topic recovery
//!
//! Reads a topic's log from the start and rebuilds the state it describes.
//! For every message id only the latest Enqueue/Deliver record matters,
//! until an Ack makes the id terminal:
//!
//! | records seen for an id | restored as |
//! |------------------------|-------------|
//! | any Ack                | nothing     |
//! | Deliver, no Ack        | in flight   |
//! | Enqueue only           | pending     |
//!
//! Replay is a pure function of the log: the same bytes always give the
//! same `RecoveredTopic`.

use std::collections::{BTreeMap, HashMap};

use crate::topic::Message;
use crate::wal::{EventKind, LogEntry, WalResult};

/// Source of log entries for replay
pub trait WalRead {
    /// Next valid entry, or `None` once the log has ended.
    fn read_next(&mut self) -> WalResult<Option<LogEntry>>;

    /// End of the last entry returned
    fn current_offset(&self) -> u64;
}

/// Counts gathered while replaying
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplayStats {
    pub records_replayed: u64,
    pub enqueues: u64,
    pub deliveries: u64,
    pub acks: u64,
    /// Ids that reached a terminal Ack
    pub completed: u64,
    /// Offset just past the last valid record
    pub final_offset: u64,
}

/// Topic state rebuilt from a log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveredTopic {
    /// Never-delivered messages, in id order
    pub pending: Vec<Message>,
    pub in_flight: HashMap<i64, Message>,
    /// One past the largest id in the log, at least 1
    pub next_id: i64,
    pub stats: ReplayStats,
}

impl RecoveredTopic {
    /// State of a topic with no log.
    pub fn empty() -> Self {
        Self {
            pending: Vec::new(),
            in_flight: HashMap::new(),
            next_id: 1,
            stats: ReplayStats::default(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty() && self.in_flight.is_empty()
    }
}

struct IdState {
    message: Message,
    delivered: bool,
    acked: bool,
}

/// Folds a log into a `RecoveredTopic`.
pub struct WalReplayer;

impl WalReplayer {
    /// Replays every entry `wal` yields.
    ///
    /// # Errors
    ///
    /// Only errors from `wal` itself. A damaged tail is the reader's
    /// business and simply ends the stream.
    pub fn replay<W: WalRead>(wal: &mut W) -> WalResult<RecoveredTopic> {
        let mut ids: BTreeMap<i64, IdState> = BTreeMap::new();
        let mut stats = ReplayStats::default();
        let mut max_id = 0i64;

        while let Some(entry) = wal.read_next()? {
            stats.records_replayed += 1;
            let LogEntry { kind, message } = entry;
            max_id = max_id.max(message.id);

            match kind {
                EventKind::Enqueue => stats.enqueues += 1,
                EventKind::Deliver => stats.deliveries += 1,
                EventKind::Ack => stats.acks += 1,
            }

            let id = message.id;
            let state = ids.entry(id).or_insert_with(|| IdState {
                message: message.clone(),
                delivered: false,
                acked: false,
            });

            if state.acked {
                continue;
            }

            match kind {
                EventKind::Enqueue => state.message = message,
                EventKind::Deliver => {
                    state.message = message;
                    state.delivered = true;
                }
                EventKind::Ack => state.acked = true,
            }
        }

        stats.final_offset = wal.current_offset();

        let mut recovered = RecoveredTopic {
            next_id: max_id.saturating_add(1).max(1),
            ..RecoveredTopic::empty()
        };

        for (id, state) in ids {
            if state.acked {
                stats.completed += 1;
            } else if state.delivered {
                recovered.in_flight.insert(id, state.message);
            } else {
                recovered.pending.push(state.message);
            }
        }

        recovered.stats = stats;
        Ok(recovered)
    }
}

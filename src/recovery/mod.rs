//! Topic recovery
//!
//! Before a topic serves traffic its log is replayed from byte 0 to rebuild
//! the pending buffer, the in-flight table and the id counter.
//!
//! # Order
//!
//! 1. Open the topic's log (absent means a fresh topic)
//! 2. Decode records until the end or the first damaged record
//! 3. Fold them into per-id state
//! 4. Cut a damaged tail off the file
//! 5. Hand the state to the topic, which then reopens the log for append

mod adapters;
mod replay;

pub use adapters::recover_topic_log;
pub use replay::{RecoveredTopic, ReplayStats, WalRead, WalReplayer};

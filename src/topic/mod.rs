//! Topics
//!
//! A topic owns a pending buffer, an in-flight table, a write-ahead log and
//! a retry sweeper. Producers enqueue, consumers dequeue and acknowledge,
//! and the sweeper redelivers or drops messages whose acknowledgment is
//! overdue.

mod errors;
mod message;
mod name;
mod sweeper;
#[allow(clippy::module_inception)]
mod topic;

pub use errors::{TopicError, TopicResult};
pub use message::{Message, TopicConfig};
pub use name::{validate_topic_name, MAX_TOPIC_NAME_LEN};
pub use sweeper::RetrySweeper;
pub use topic::{SweepOutcome, Topic, TopicStats};

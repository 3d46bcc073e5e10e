//! Write-ahead log for topics
//!
//! Every topic owns one append-only file, `<data_dir>/<topic>.wal`, holding
//! one record per state transition of a message (enqueued, delivered,
//! acknowledged). Records are appended through a bounded channel to a
//! background writer thread that batches them, so producers and consumers
//! never wait on disk I/O.
//!
//! # Guarantees
//!
//! - Records reach the file in the order they were submitted
//! - A flush writes a whole batch with one `write_all`
//! - Replay stops at the first record that does not decode
//!
//! Writes are best-effort: a record still queued when the process dies is
//! lost, and write failures are logged and counted rather than returned.

mod batching;
mod errors;
mod reader;
mod record;
mod writer;

pub use batching::WalBatch;
pub use errors::{Severity, WalError, WalErrorCode, WalResult};
pub use reader::{DiscardedTail, WalReader};
pub use record::{DecodeError, EventKind, LogEntry};
pub use writer::{topic_log_path, Wal, WalOptions, WAL_FILE_EXTENSION};

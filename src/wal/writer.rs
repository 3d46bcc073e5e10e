//! Asynchronous WAL writer
//!
//! `append_event` hands the entry to a bounded channel and returns; a
//! dedicated thread per topic owns the file and writes entries in batches.
//!
//! ```text
//! Topic ─→ [sync_channel] ─→ writer thread ─→ write_all ─→ sync_data
//! ```
//!
//! A batch is flushed when it reaches `batch_max_entries`, when its oldest
//! entry has waited `flush_interval`, on an explicit flush or close, and
//! when the channel disconnects.
//!
//! Durability is best-effort: an entry still in the channel or batch when
//! the process dies is lost, and a failed write is logged and the batch
//! dropped. Nothing is reported back to the caller of `append_event`.
//!
//! A failed batch is cut back out of the file, so the log always ends on a
//! record boundary and later batches stay readable. If that cut fails too,
//! the writer halts and drops every later batch rather than append behind
//! a partial record.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::observability::{log_event, Event, QueueMetrics};
use crate::sync::lock;
use crate::topic::Message;

use super::batching::WalBatch;
use super::errors::{WalError, WalResult};
use super::record::{EventKind, LogEntry};

/// File extension of per-topic logs
pub const WAL_FILE_EXTENSION: &str = "wal";

/// Returns `<data_dir>/<topic>.wal`.
pub fn topic_log_path(data_dir: &Path, topic: &str) -> PathBuf {
    data_dir.join(format!("{}.{}", topic, WAL_FILE_EXTENSION))
}

/// Writer thread tuning
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalOptions {
    /// Flush as soon as a batch holds this many entries
    pub batch_max_entries: usize,
    /// Flush a non-empty batch after it has waited this long
    pub flush_interval: Duration,
    /// Bound of the submission channel; a full channel blocks producers
    pub channel_capacity: usize,
    /// `sync_data` after every flush
    pub fsync: bool,
}

impl Default for WalOptions {
    fn default() -> Self {
        Self {
            batch_max_entries: 100,
            flush_interval: Duration::from_millis(50),
            channel_capacity: 10_000,
            fsync: true,
        }
    }
}

/// Storage the writer thread appends to
trait LogSink: Send {
    /// Current length in bytes
    fn size(&self) -> io::Result<u64>;
    fn append(&mut self, bytes: &[u8]) -> io::Result<()>;
    fn sync(&mut self) -> io::Result<()>;
    fn truncate(&mut self, len: u64) -> io::Result<()>;
}

impl LogSink for File {
    fn size(&self) -> io::Result<u64> {
        Ok(self.metadata()?.len())
    }

    fn append(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.write_all(bytes)?;
        self.flush()
    }

    fn sync(&mut self) -> io::Result<()> {
        self.sync_data()
    }

    fn truncate(&mut self, len: u64) -> io::Result<()> {
        self.set_len(len)
    }
}

enum WalCommand {
    Append(LogEntry),
    Flush(mpsc::Sender<Result<(), String>>),
    Close,
}

/// Handle to a topic's log and its writer thread.
pub struct Wal {
    topic: String,
    path: PathBuf,
    sender: Mutex<Option<SyncSender<WalCommand>>>,
    writer: Mutex<Option<JoinHandle<()>>>,
}

impl Wal {
    /// Opens (creating if needed) the log at `path` for append and starts
    /// the writer thread.
    ///
    /// # Errors
    ///
    /// `EMBERQ_WAL_OPEN_FAILED` if the directory, file, or thread cannot be
    /// created. A topic must not serve traffic without its log.
    pub fn open(
        path: &Path,
        topic: &str,
        options: WalOptions,
        metrics: Arc<QueueMetrics>,
    ) -> WalResult<Self> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(|e| {
                WalError::open_failed(
                    format!("Failed to create WAL directory: {}", dir.display()),
                    e,
                )
            })?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| {
                WalError::open_failed(format!("Failed to open WAL file: {}", path.display()), e)
            })?;

        Self::start(path, topic, options, metrics, file)
    }

    fn start<S: LogSink + 'static>(
        path: &Path,
        topic: &str,
        options: WalOptions,
        metrics: Arc<QueueMetrics>,
        sink: S,
    ) -> WalResult<Self> {
        let (sender, receiver) = mpsc::sync_channel(options.channel_capacity.max(1));
        let writer = WalWriter::new(topic, sink, options, metrics);

        let handle = thread::Builder::new()
            .name(format!("emberq-wal-{}", topic))
            .spawn(move || writer.run(receiver))
            .map_err(|e| WalError::open_failed("Failed to start WAL writer thread", e))?;

        log_event(
            Event::WalOpened,
            &[("topic", topic), ("path", &path.display().to_string())],
        );

        Ok(Self {
            topic: topic.to_string(),
            path: path.to_path_buf(),
            sender: Mutex::new(Some(sender)),
            writer: Mutex::new(Some(handle)),
        })
    }

    /// Cuts the log at `path` back to `len` bytes.
    ///
    /// Used before `open` when replay stopped at a damaged record, so new
    /// records are never appended behind bytes replay cannot cross.
    pub fn discard_tail(path: &Path, len: u64) -> WalResult<()> {
        let file = OpenOptions::new().write(true).open(path).map_err(|e| {
            WalError::open_failed(format!("Failed to open WAL file: {}", path.display()), e)
        })?;
        file.set_len(len)
            .and_then(|_| file.sync_all())
            .map_err(|e| {
                WalError::open_failed(format!("Failed to truncate WAL file: {}", path.display()), e)
            })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Queues a record of `message` in state `kind`.
    ///
    /// Blocks while the channel is full; never blocks on disk I/O.
    ///
    /// # Errors
    ///
    /// `EMBERQ_WAL_CLOSED` once `close` has been called. Write failures
    /// happen later on the writer thread and are not reported here.
    pub fn append_event(&self, kind: EventKind, message: &Message) -> WalResult<()> {
        let sender = lock(&self.sender);
        let sender = sender.as_ref().ok_or_else(|| WalError::closed(&self.topic))?;
        sender
            .send(WalCommand::Append(LogEntry::new(kind, message.clone())))
            .map_err(|_| WalError::closed(&self.topic))
    }

    /// Waits until every entry queued before this call has been written.
    pub fn flush(&self) -> WalResult<()> {
        let (reply_tx, reply_rx) = mpsc::channel();
        {
            let sender = lock(&self.sender);
            let sender = sender.as_ref().ok_or_else(|| WalError::closed(&self.topic))?;
            sender
                .send(WalCommand::Flush(reply_tx))
                .map_err(|_| WalError::closed(&self.topic))?;
        }

        match reply_rx.recv() {
            Ok(Ok(())) => Ok(()),
            Ok(Err(reason)) => Err(WalError::write_failed(reason)),
            Err(_) => Err(WalError::closed(&self.topic)),
        }
    }

    /// Stops the writer after it has flushed everything queued so far, and
    /// waits for it to exit. Idempotent.
    pub fn close(&self) {
        if let Some(sender) = lock(&self.sender).take() {
            // A send error means the writer is already gone; join handles it.
            let _ = sender.send(WalCommand::Close);
        }

        if let Some(handle) = lock(&self.writer).take() {
            if handle.join().is_err() {
                log_event(
                    Event::WalWriteFailed,
                    &[("topic", &self.topic), ("reason", "writer thread panicked")],
                );
            }
        }
    }

    pub fn is_closed(&self) -> bool {
        lock(&self.sender).is_none()
    }
}

impl Drop for Wal {
    fn drop(&mut self) {
        self.close();
    }
}

/// State owned by the writer thread
struct WalWriter<S> {
    topic: String,
    sink: S,
    batch: WalBatch,
    options: WalOptions,
    metrics: Arc<QueueMetrics>,
    /// Set when a failed batch could not be cut back out of the log
    halted: bool,
}

impl<S: LogSink> WalWriter<S> {
    fn new(topic: &str, sink: S, options: WalOptions, metrics: Arc<QueueMetrics>) -> Self {
        Self {
            topic: topic.to_string(),
            sink,
            batch: WalBatch::with_capacity(64 * 1024),
            options,
            metrics,
            halted: false,
        }
    }

    fn run(mut self, receiver: Receiver<WalCommand>) {
        // Set when the first entry of a batch arrives
        let mut deadline: Option<Instant> = None;

        loop {
            let received = match deadline {
                None => receiver.recv().map_err(|_| RecvTimeoutError::Disconnected),
                Some(at) => receiver.recv_timeout(at.saturating_duration_since(Instant::now())),
            };

            match received {
                Ok(WalCommand::Append(entry)) => {
                    self.stage(&entry);
                    if self.batch.len() >= self.options.batch_max_entries {
                        let _ = self.flush();
                        deadline = None;
                    } else if deadline.is_none() && !self.batch.is_empty() {
                        deadline = Some(Instant::now() + self.options.flush_interval);
                    }
                }
                Ok(WalCommand::Flush(reply)) => {
                    let result = self.flush();
                    deadline = None;
                    let _ = reply.send(result);
                }
                Err(RecvTimeoutError::Timeout) => {
                    let _ = self.flush();
                    deadline = None;
                }
                Ok(WalCommand::Close) | Err(RecvTimeoutError::Disconnected) => {
                    let _ = self.flush();
                    break;
                }
            }
        }

        log_event(Event::WalClosed, &[("topic", &self.topic)]);
    }

    fn stage(&mut self, entry: &LogEntry) {
        if let Err(e) = self.batch.push(entry) {
            self.metrics.increment_wal_write_failures();
            log_event(
                Event::WalWriteFailed,
                &[
                    ("topic", &self.topic),
                    ("message_id", &entry.message.id.to_string()),
                    ("reason", &e.to_string()),
                ],
            );
        }
    }

    /// Writes the batch out. On failure the batch is dropped.
    fn flush(&mut self) -> Result<(), String> {
        if self.batch.is_empty() {
            return Ok(());
        }

        let entries = self.batch.len();
        let bytes = self.batch.byte_len();

        let result = if self.halted {
            Err(io::Error::other("writer halted after a failed rollback"))
        } else {
            self.write_batch()
        };
        self.batch.clear();

        match result {
            Ok(()) => {
                self.metrics.record_flush(entries as u64, bytes as u64);
                log_event(
                    Event::WalFlushed,
                    &[
                        ("topic", &self.topic),
                        ("entries", &entries.to_string()),
                        ("bytes", &bytes.to_string()),
                    ],
                );
                Ok(())
            }
            Err(e) => {
                let reason = format!("Failed to write {} WAL entries: {}", entries, e);
                self.metrics.increment_wal_write_failures();
                log_event(
                    Event::WalWriteFailed,
                    &[("topic", &self.topic), ("reason", &reason)],
                );
                Err(reason)
            }
        }
    }

    /// Appends the batch. On error the log is cut back to where it ended
    /// before the batch, dropping any partial record.
    fn write_batch(&mut self) -> io::Result<()> {
        let end = self.sink.size()?;

        let mut result = self.sink.append(self.batch.bytes());
        if result.is_ok() && self.options.fsync {
            result = self.sink.sync();
        }

        if let Err(e) = result {
            if let Err(rollback) = self.sink.truncate(end) {
                self.halted = true;
                log_event(
                    Event::WalWriteFailed,
                    &[
                        ("topic", &self.topic),
                        (
                            "reason",
                            &format!("Failed to cut WAL back to {} bytes: {}", end, rollback),
                        ),
                        ("halted", "true"),
                    ],
                );
            }
            return Err(e);
        }
        Ok(())
    }
}

//! Topic state machine
//!
//! Per message id:
//!
//! ```text
//! enqueue ─→ Pending ─dequeue─→ InFlight ─acknowledge─→ Acked
//!               ↑                  │
//!               └──── sweep ───────┤ retries < max_retries
//!                                  └─→ Dropped   otherwise
//! ```
//!
//! A live id is in exactly one of the pending buffer and the in-flight
//! table. One mutex covers the buffer, the table and the id counter and is
//! held for the whole of each operation, sweeps included. WAL records are
//! submitted under that mutex so the log sees transitions in the order
//! they happened.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::buffer::CircularBuffer;
use crate::observability::{log_event, Event, MetricsSnapshot, ObservationScope, QueueMetrics};
use crate::recovery::{recover_topic_log, RecoveredTopic};
use crate::sync::lock;
use crate::wal::{topic_log_path, EventKind, Wal};

use super::errors::{TopicError, TopicResult};
use super::message::{Message, TopicConfig};
use super::name::validate_topic_name;
use super::sweeper::RetrySweeper;

/// What one sweep pass did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepOutcome {
    /// Re-pushed to the pending tail
    pub retried: usize,
    /// Retries exhausted; gone for good
    pub dropped: usize,
}

/// Point-in-time view of a topic
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopicStats {
    pub name: String,
    pub pending: usize,
    pub in_flight: usize,
    pub capacity: usize,
    pub next_id: i64,
    pub metrics: MetricsSnapshot,
}

struct TopicState {
    pending: CircularBuffer<Message>,
    in_flight: HashMap<i64, Message>,
    next_id: i64,
}

/// Everything the sweeper thread shares with the topic handle
struct TopicCore {
    name: String,
    config: TopicConfig,
    state: Mutex<TopicState>,
    wal: Wal,
    metrics: Arc<QueueMetrics>,
}

/// A named queue with its own log and retry sweeper.
pub struct Topic {
    core: Arc<TopicCore>,
    sweeper: Mutex<Option<RetrySweeper>>,
    closed: AtomicBool,
}

impl Topic {
    /// Opens the topic `name` stored under `data_dir`.
    ///
    /// Replays `<data_dir>/<name>.wal` if it exists, reopens it for append,
    /// and starts the retry sweeper. Nothing is served before replay has
    /// finished.
    ///
    /// # Errors
    ///
    /// - `InvalidName` if `name` is not a usable topic name
    /// - `Wal` if the log cannot be read, repaired or opened
    /// - `SweeperStart` if the sweeper thread cannot be spawned
    pub fn open(data_dir: &Path, name: &str, config: TopicConfig) -> TopicResult<Self> {
        validate_topic_name(name)?;
        let path = topic_log_path(data_dir, name);

        let scope = ObservationScope::with_fields("WAL_REPLAY", &[("topic", name)]);
        let recovered = match recover_topic_log(&path, name) {
            Ok(recovered) => recovered,
            Err(e) => {
                scope.fail(&e.to_string());
                return Err(e.into());
            }
        };
        scope.complete_with_fields(&[
            ("records", &recovered.stats.records_replayed.to_string()),
            ("pending", &recovered.pending.len().to_string()),
            ("in_flight", &recovered.in_flight.len().to_string()),
            ("next_id", &recovered.next_id.to_string()),
        ]);

        let metrics = Arc::new(QueueMetrics::new());
        let wal = Wal::open(&path, name, config.wal.clone(), Arc::clone(&metrics))?;
        let state = Self::restore_state(&config, recovered);

        let core = Arc::new(TopicCore {
            name: name.to_string(),
            config,
            state: Mutex::new(state),
            wal,
            metrics,
        });

        let sweep_core = Arc::clone(&core);
        let sweeper = RetrySweeper::start(name, core.config.sweep_interval, move || {
            sweep_core.sweep_expired(Utc::now());
        })
        .map_err(|source| {
            core.wal.close();
            TopicError::SweeperStart {
                topic: name.to_string(),
                source,
            }
        })?;

        Ok(Self {
            core,
            sweeper: Mutex::new(Some(sweeper)),
            closed: AtomicBool::new(false),
        })
    }

    fn restore_state(config: &TopicConfig, recovered: RecoveredTopic) -> TopicState {
        let mut pending = CircularBuffer::new(config.initial_capacity);
        for message in recovered.pending {
            pending.enqueue(message);
        }

        TopicState {
            pending,
            in_flight: recovered.in_flight,
            next_id: recovered.next_id,
        }
    }

    pub fn name(&self) -> &str {
        &self.core.name
    }

    pub fn config(&self) -> &TopicConfig {
        &self.core.config
    }

    pub fn metrics(&self) -> &QueueMetrics {
        &self.core.metrics
    }

    pub fn log_path(&self) -> &Path {
        self.core.wal.path()
    }

    /// Appends `payload` and returns its id.
    ///
    /// Ids are strictly increasing within a topic, across restarts too.
    pub fn enqueue(&self, payload: impl Into<String>) -> i64 {
        self.core.enqueue(payload.into())
    }

    /// Hands out the oldest pending message and moves it in flight.
    ///
    /// `None` means nothing is pending; it is not an error.
    pub fn dequeue(&self) -> Option<Message> {
        self.core.dequeue()
    }

    /// Completes an in-flight message.
    ///
    /// Returns false for ids that are unknown, still pending, or already
    /// acknowledged.
    pub fn acknowledge(&self, id: i64) -> bool {
        self.core.acknowledge(id)
    }

    /// Runs one retry pass as if the clock read `now`.
    ///
    /// The background sweeper calls this with the current time.
    pub fn sweep_expired(&self, now: DateTime<Utc>) -> SweepOutcome {
        self.core.sweep_expired(now)
    }

    pub fn stats(&self) -> TopicStats {
        let state = lock(&self.core.state);
        TopicStats {
            name: self.core.name.clone(),
            pending: state.pending.size(),
            in_flight: state.in_flight.len(),
            capacity: state.pending.capacity(),
            next_id: state.next_id,
            metrics: self.core.metrics.snapshot(),
        }
    }

    /// Pending messages from head to tail.
    pub fn pending_messages(&self) -> Vec<Message> {
        lock(&self.core.state).pending.iter().cloned().collect()
    }

    /// In-flight messages ordered by id.
    pub fn in_flight_messages(&self) -> Vec<Message> {
        let state = lock(&self.core.state);
        let mut messages: Vec<Message> = state.in_flight.values().cloned().collect();
        messages.sort_by_key(|m| m.id);
        messages
    }

    /// Blocks until every WAL record submitted so far is written.
    pub fn flush(&self) -> TopicResult<()> {
        self.core.wal.flush().map_err(TopicError::from)
    }

    /// Stops the sweeper, then drains and closes the log. Idempotent.
    ///
    /// Operations after close still change in-memory state but their WAL
    /// records are rejected and logged.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }

        if let Some(mut sweeper) = lock(&self.sweeper).take() {
            sweeper.stop();
        }
        self.core.wal.close();

        log_event(Event::TopicClosed, &[("topic", &self.core.name)]);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl Drop for Topic {
    fn drop(&mut self) {
        self.close();
    }
}

impl TopicCore {
    fn enqueue(&self, payload: String) -> i64 {
        let mut state = lock(&self.state);

        let id = state.next_id;
        state.next_id += 1;

        let message = Message::new(id, payload, Utc::now());
        self.record(EventKind::Enqueue, &message);
        state.pending.enqueue(message);

        self.metrics.increment_enqueued();
        id
    }

    fn dequeue(&self) -> Option<Message> {
        let mut state = lock(&self.state);

        let mut message = state.pending.dequeue()?;
        message.timestamp = Utc::now();
        message.acked = false;

        self.record(EventKind::Deliver, &message);
        state.in_flight.insert(message.id, message.clone());

        self.metrics.increment_delivered();
        Some(message)
    }

    fn acknowledge(&self, id: i64) -> bool {
        let mut state = lock(&self.state);

        let Some(mut message) = state.in_flight.remove(&id) else {
            return false;
        };
        message.acked = true;
        self.record(EventKind::Ack, &message);

        self.metrics.increment_acked();
        true
    }

    fn sweep_expired(&self, now: DateTime<Utc>) -> SweepOutcome {
        let mut state = lock(&self.state);
        let mut outcome = SweepOutcome::default();

        let mut expired: Vec<i64> = state
            .in_flight
            .values()
            .filter(|m| !m.acked && m.age(now) > self.config.ack_timeout)
            .map(|m| m.id)
            .collect();
        // Stable re-push order regardless of map iteration order
        expired.sort_unstable();

        for id in expired {
            let Some(mut message) = state.in_flight.remove(&id) else {
                continue;
            };

            if message.retries < self.config.max_retries {
                message.retries += 1;
                log_event(
                    Event::MessageRetried,
                    &[
                        ("topic", &self.name),
                        ("message_id", &id.to_string()),
                        ("retries", &message.retries.to_string()),
                    ],
                );
                state.pending.enqueue(message);
                self.metrics.increment_retried();
                outcome.retried += 1;
            } else {
                log_event(
                    Event::MessageDropped,
                    &[
                        ("topic", &self.name),
                        ("message_id", &id.to_string()),
                        ("retries", &message.retries.to_string()),
                    ],
                );
                self.metrics.increment_dropped();
                outcome.dropped += 1;
            }
        }

        outcome
    }

    /// Submits a WAL record. A closed log is logged and otherwise ignored.
    fn record(&self, kind: EventKind, message: &Message) {
        if let Err(e) = self.wal.append_event(kind, message) {
            log_event(
                Event::WalAppendRejected,
                &[
                    ("topic", &self.name),
                    ("kind", kind.as_str()),
                    ("message_id", &message.id.to_string()),
                    ("reason", &e.to_string()),
                ],
            );
        }
    }
}

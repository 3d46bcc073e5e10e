//! Message and per-topic configuration types

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::wal::WalOptions;

/// A queued message.
///
/// `id` is unique within its topic and assigned in increasing order.
/// `retries` counts timeout-triggered redeliveries only. `acked` becomes
/// true only through a successful acknowledge, after which the message is
/// never delivered again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub id: i64,
    pub payload: String,
    /// Enqueue time, then the time of the latest delivery
    pub timestamp: DateTime<Utc>,
    pub acked: bool,
    pub retries: i32,
}

impl Message {
    /// Creates a fresh, never-delivered message.
    pub fn new(id: i64, payload: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            id,
            payload: payload.into(),
            timestamp,
            acked: false,
            retries: 0,
        }
    }

    /// Time elapsed since `timestamp`, or zero if `timestamp` is in the future.
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        (now - self.timestamp).to_std().unwrap_or(Duration::ZERO)
    }
}

/// Delivery settings for one topic
#[derive(Debug, Clone)]
pub struct TopicConfig {
    /// How long a delivered message may stay unacknowledged
    pub ack_timeout: Duration,
    /// Redeliveries allowed before a message is dropped
    pub max_retries: i32,
    /// Period of the retry sweeper
    pub sweep_interval: Duration,
    /// Initial pending-buffer capacity
    pub initial_capacity: usize,
    pub wal: WalOptions,
}

impl Default for TopicConfig {
    fn default() -> Self {
        Self {
            ack_timeout: Duration::from_secs(30),
            max_retries: 3,
            sweep_interval: Duration::from_secs(2),
            initial_capacity: 10_000,
            wal: WalOptions::default(),
        }
    }
}

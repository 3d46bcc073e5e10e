//! Per-topic counters
//!
//! Counters only increase and reset only on process start. Relaxed ordering
//! is enough: each counter is independent and read for reporting only.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Operational counters for one topic and its WAL writer.
#[derive(Debug, Default)]
pub struct QueueMetrics {
    enqueued: AtomicU64,
    delivered: AtomicU64,
    acked: AtomicU64,
    retried: AtomicU64,
    dropped: AtomicU64,
    wal_records_written: AtomicU64,
    wal_bytes_written: AtomicU64,
    wal_flushes: AtomicU64,
    wal_write_failures: AtomicU64,
}

impl QueueMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    // Delivery state machine

    pub fn increment_enqueued(&self) {
        self.enqueued.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_delivered(&self) {
        self.delivered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_acked(&self) {
        self.acked.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_retried(&self) {
        self.retried.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_dropped(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    // WAL writer

    /// Records one successful batch flush of `records` entries and `bytes` bytes.
    pub fn record_flush(&self, records: u64, bytes: u64) {
        self.wal_flushes.fetch_add(1, Ordering::Relaxed);
        self.wal_records_written.fetch_add(records, Ordering::Relaxed);
        self.wal_bytes_written.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn increment_wal_write_failures(&self) {
        self.wal_write_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            enqueued: self.enqueued.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
            acked: self.acked.load(Ordering::Relaxed),
            retried: self.retried.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            wal_records_written: self.wal_records_written.load(Ordering::Relaxed),
            wal_bytes_written: self.wal_bytes_written.load(Ordering::Relaxed),
            wal_flushes: self.wal_flushes.load(Ordering::Relaxed),
            wal_write_failures: self.wal_write_failures.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time copy of a topic's counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub enqueued: u64,
    pub delivered: u64,
    pub acked: u64,
    pub retried: u64,
    pub dropped: u64,
    pub wal_records_written: u64,
    pub wal_bytes_written: u64,
    pub wal_flushes: u64,
    pub wal_write_failures: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_metrics_are_zero() {
        let metrics = QueueMetrics::new();
        assert_eq!(metrics.snapshot(), MetricsSnapshot::default());
    }

    #[test]
    fn test_record_flush_accumulates() {
        let metrics = QueueMetrics::new();
        metrics.record_flush(3, 120);
        metrics.record_flush(2, 80);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.wal_flushes, 2);
        assert_eq!(snapshot.wal_records_written, 5);
        assert_eq!(snapshot.wal_bytes_written, 200);
    }

    #[test]
    fn test_snapshot_serializes() {
        let metrics = QueueMetrics::new();
        metrics.increment_enqueued();
        metrics.increment_dropped();

        let json = serde_json::to_value(metrics.snapshot()).unwrap();
        assert_eq!(json["enqueued"], 1);
        assert_eq!(json["dropped"], 1);
        assert_eq!(json["acked"], 0);
    }

    #[test]
    fn test_concurrent_increments() {
        use std::sync::Arc;
        use std::thread;

        let metrics = Arc::new(QueueMetrics::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let metrics = Arc::clone(&metrics);
                thread::spawn(move || {
                    for _ in 0..250 {
                        metrics.increment_delivered();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(metrics.snapshot().delivered, 2000);
    }
}

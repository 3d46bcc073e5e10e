//! Observability subsystem for emberq
//!
//! - Structured JSON logging with a process-wide minimum level
//! - Typed event names
//! - Per-topic counters
//!
//! Observability is read-only: nothing here may fail an operation or
//! change queue state.
//!
//! # Usage
//!
//! ```ignore
//! use emberq::observability::{log_event, Event, QueueMetrics};
//!
//! log_event(Event::TopicCreated, &[("topic", "orders")]);
//!
//! let metrics = QueueMetrics::new();
//! metrics.increment_enqueued();
//! ```

mod events;
mod logger;
mod metrics;
mod scope;

pub use events::Event;
pub use logger::{Level, Logger};
pub use metrics::{MetricsSnapshot, QueueMetrics};
pub use scope::ObservationScope;

/// Logs a typed event at the event's own level.
pub fn log_event(event: Event, fields: &[(&str, &str)]) {
    Logger::log(event.level(), event.as_str(), fields);
}

//! Observable queue events
//!
//! Every log line the queue emits is named by one of these variants, so the
//! set of things an operator can grep for is closed and typed.

use std::fmt;

use super::logger::Level;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Lifecycle
    BootStart,
    ConfigLoaded,
    Serving,
    ShutdownBegin,
    ShutdownComplete,

    // Registry
    TopicCreated,
    TopicRecovered,
    TopicClosed,
    TopicRejected,
    RegistryLoadEmpty,

    // WAL
    WalOpened,
    WalTailDiscarded,
    WalFlushed,
    WalWriteFailed,
    WalAppendRejected,
    WalClosed,

    // Delivery state machine
    MessageRetried,
    MessageDropped,

    // Buffer
    BufferResized,
}

impl Event {
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::BootStart => "EMBERQ_STARTUP_BEGIN",
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::Serving => "EMBERQ_SERVING",
            Event::ShutdownBegin => "SHUTDOWN_BEGIN",
            Event::ShutdownComplete => "SHUTDOWN_COMPLETE",

            Event::TopicCreated => "TOPIC_CREATED",
            Event::TopicRecovered => "TOPIC_RECOVERED",
            Event::TopicClosed => "TOPIC_CLOSED",
            Event::TopicRejected => "TOPIC_REJECTED",
            Event::RegistryLoadEmpty => "REGISTRY_LOAD_EMPTY",

            Event::WalOpened => "WAL_OPENED",
            Event::WalTailDiscarded => "WAL_TAIL_DISCARDED",
            Event::WalFlushed => "WAL_FLUSHED",
            Event::WalWriteFailed => "WAL_WRITE_FAILED",
            Event::WalAppendRejected => "WAL_APPEND_REJECTED",
            Event::WalClosed => "WAL_CLOSED",

            Event::MessageRetried => "MESSAGE_RETRIED",
            Event::MessageDropped => "MESSAGE_DROPPED",

            Event::BufferResized => "BUFFER_RESIZED",
        }
    }

    /// Level this event is logged at.
    pub fn level(&self) -> Level {
        match self {
            Event::WalFlushed => Level::Trace,
            Event::BufferResized | Event::WalOpened => Level::Debug,
            Event::WalTailDiscarded | Event::MessageDropped | Event::RegistryLoadEmpty => {
                Level::Warn
            }
            Event::WalWriteFailed | Event::WalAppendRejected | Event::TopicRejected => {
                Level::Error
            }
            _ => Level::Info,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

//! emberq - A single-node durable message queue
//!
//! Producers append messages to named topics, consumers pull and
//! acknowledge them, and unacknowledged messages are redelivered a bounded
//! number of times before being dropped.

pub mod buffer;
pub mod cli;
pub mod config;
pub mod http_server;
pub mod observability;
pub mod recovery;
pub mod registry;
mod sync;
pub mod topic;
pub mod wal;

//! Pending-message storage for topics
//!
//! A growable ring buffer: FIFO order, amortized O(1) insert, and capacity
//! doubling instead of rejection when full.

mod circular;

pub use circular::CircularBuffer;

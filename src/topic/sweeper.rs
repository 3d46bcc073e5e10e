//! Retry sweeper thread
//!
//! Runs a sweep callback on a fixed interval until stopped. Stopping sends
//! a signal and joins, so once `stop` returns no sweep is running or will
//! run again.

use std::io;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Shortest accepted sweep period
const MIN_INTERVAL: Duration = Duration::from_millis(1);

pub struct RetrySweeper {
    stop: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl RetrySweeper {
    /// Spawns a thread that calls `sweep` every `interval`.
    ///
    /// The first sweep happens one interval after start.
    pub fn start<F>(topic: &str, interval: Duration, mut sweep: F) -> io::Result<Self>
    where
        F: FnMut() + Send + 'static,
    {
        let interval = interval.max(MIN_INTERVAL);
        let (stop_tx, stop_rx) = mpsc::channel::<()>();

        let handle = thread::Builder::new()
            .name(format!("emberq-sweep-{}", topic))
            .spawn(move || loop {
                match stop_rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => sweep(),
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            })?;

        Ok(Self {
            stop: Some(stop_tx),
            handle: Some(handle),
        })
    }

    /// Signals the thread and waits for it. Idempotent.
    pub fn stop(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }
}

impl Drop for RetrySweeper {
    fn drop(&mut self) {
        self.stop();
    }
}

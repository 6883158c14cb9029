//! Transaction Log Writer
//!
//! Write mode of the log. Callers enqueue events on a bounded channel; one
//! blocking task owns the file, numbers each event and appends it. The
//! first I/O failure is published on a watch channel and stops the writer.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::error::{KvError, Result};
use crate::wal::Event;

/// First writer failure, `None` while the writer is healthy.
pub type LogFailure = Option<Arc<KvError>>;

// == Transaction Log Writer ==
/// Handle used to append mutations to the log.
pub struct TransactionLogWriter {
    /// Taken on close so the writer can drain and exit
    events: Mutex<Option<mpsc::Sender<Event>>>,
    errors: watch::Receiver<LogFailure>,
    last_sequence: Arc<AtomicU64>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl TransactionLogWriter {
    // == Spawn ==
    /// Starts the writer task, which takes exclusive ownership of `file`.
    ///
    /// Must be called from within a Tokio runtime.
    pub(crate) fn spawn(file: File, last_sequence: u64, buffer: usize) -> Self {
        let (events_tx, events_rx) = mpsc::channel(buffer.max(1));
        let (errors_tx, errors_rx) = watch::channel(None);
        let sequence = Arc::new(AtomicU64::new(last_sequence));

        let task_sequence = Arc::clone(&sequence);
        let handle = tokio::task::spawn_blocking(move || {
            write_loop(file, events_rx, errors_tx, task_sequence)
        });

        Self {
            events: Mutex::new(Some(events_tx)),
            errors: errors_rx,
            last_sequence: sequence,
            handle: Mutex::new(Some(handle)),
        }
    }

    // == Write Put ==
    /// Enqueues a Put event, waiting while the buffer is full.
    pub async fn write_put(&self, key: &str, value: Bytes) -> Result<()> {
        self.enqueue(Event::put(key, value)).await
    }

    // == Write Delete ==
    /// Enqueues a Delete event, waiting while the buffer is full.
    pub async fn write_delete(&self, key: &str) -> Result<()> {
        self.enqueue(Event::delete(key)).await
    }

    async fn enqueue(&self, event: Event) -> Result<()> {
        if let Some(failure) = self.failure() {
            return Err(KvError::LogUnavailable(failure.to_string()));
        }

        // Clone the sender out so the lock is not held across the await
        let events = self.events.lock().clone();
        let events = events
            .ok_or_else(|| KvError::LogUnavailable("transaction log is closed".to_string()))?;

        events.send(event).await.map_err(|_| self.unavailable())
    }

    // == Err ==
    /// Subscribes to writer failures.
    pub fn err(&self) -> watch::Receiver<LogFailure> {
        self.errors.clone()
    }

    /// Returns the failure that stopped the writer, if any.
    pub fn failure(&self) -> LogFailure {
        self.errors.borrow().clone()
    }

    /// Sequence number of the last event handed to the file.
    pub fn last_sequence(&self) -> u64 {
        self.last_sequence.load(Ordering::Acquire)
    }

    // == Close ==
    /// Stops accepting events, waits for queued ones to be written and
    /// synced to disk, and returns the last written sequence.
    pub async fn close(&self) -> Result<u64> {
        self.events.lock().take();

        let handle = self.handle.lock().take();
        if let Some(handle) = handle {
            handle
                .await
                .map_err(|e| KvError::Internal(format!("log writer task failed: {}", e)))?;
        }

        match self.failure() {
            Some(failure) => Err(KvError::LogUnavailable(failure.to_string())),
            None => Ok(self.last_sequence()),
        }
    }

    fn unavailable(&self) -> KvError {
        match self.failure() {
            Some(failure) => KvError::LogUnavailable(failure.to_string()),
            None => KvError::LogUnavailable("transaction log writer stopped".to_string()),
        }
    }
}

// == Write Loop ==
/// Body of the writer task. Flushes whenever the queue runs dry.
fn write_loop(
    file: File,
    mut events: mpsc::Receiver<Event>,
    errors: watch::Sender<LogFailure>,
    sequence: Arc<AtomicU64>,
) {
    let mut writer = BufWriter::new(file);
    let mut line = Vec::new();
    let mut next = sequence.load(Ordering::Acquire);
    info!(last_sequence = next, "transaction log writer started");

    while let Some(mut event) = events.blocking_recv() {
        next += 1;
        event.sequence = next;

        line.clear();
        event.encode(&mut line);

        let written = writer.write_all(&line).and_then(|_| {
            if events.is_empty() {
                writer.flush()
            } else {
                Ok(())
            }
        });

        if let Err(err) = written {
            error!(sequence = next, error = %err, "transaction log append failed, writer stopping");
            errors.send_replace(Some(Arc::new(KvError::LogIo(err))));
            events.close();
            return;
        }
        sequence.store(next, Ordering::Release);
    }

    if let Err(err) = writer.flush().and_then(|_| writer.get_ref().sync_all()) {
        error!(error = %err, "transaction log flush failed on close");
        errors.send_replace(Some(Arc::new(KvError::LogIo(err))));
        return;
    }
    debug!(last_sequence = next, "transaction log writer stopped");
}

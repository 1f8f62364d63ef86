// CLASSIFICATION: COMMUNITY
// Filename: store.rs v0.3
// Author: Lukas Bower
// Date Modified: 2026-03-02

//! Persisted pipeline state: the pending-payload queue and the
//! last-sent record.
//!
//! Both are single overwritten JSON snapshots, not append logs, and
//! both are owned exclusively by this pipeline. Every mutation is a
//! read-whole / mutate / write-whole cycle, which is only safe under
//! the device's single-threaded main loop; a threaded port must wrap
//! each store in a mutex.

use std::fs;
use std::path::{Path, PathBuf};

use log::warn;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::telemetry::payload::TelemetryPayload;

/// Default bound on queued payloads during a prolonged outage.
pub const DEFAULT_QUEUE_CAPACITY: usize = 100;

/// Errors from store persistence.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store io failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("store encode failed: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Single overwritten `{ts, ok}` record backing the logging screen.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LastSentRecord {
    pub ts: u64,
    pub ok: bool,
}

/// Owner of the last-sent record file.
#[derive(Clone, Debug)]
pub struct StatusStore {
    path: PathBuf,
}

impl StatusStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Overwrite the record. Best-effort: losing the status display is
    /// not worth failing a telemetry attempt over.
    pub fn write(&self, ts: u64, ok: bool) {
        let record = LastSentRecord { ts, ok };
        match serde_json::to_string(&record) {
            Ok(text) => {
                if let Err(e) = fs::write(&self.path, text) {
                    warn!("status store: write {} failed: {e}", self.path.display());
                }
            }
            Err(e) => warn!("status store: encode failed: {e}"),
        }
    }

    /// Read the record back; missing or corrupt file reads as `None`.
    pub fn read(&self) -> Option<LastSentRecord> {
        let text = fs::read_to_string(&self.path).ok()?;
        serde_json::from_str(&text).ok()
    }
}

/// Capacity-bounded FIFO of pending payloads on non-volatile storage.
#[derive(Clone, Debug)]
pub struct QueueStore {
    path: PathBuf,
    capacity: usize,
}

impl QueueStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_capacity(path, DEFAULT_QUEUE_CAPACITY)
    }

    pub fn with_capacity(path: impl Into<PathBuf>, capacity: usize) -> Self {
        Self { path: path.into(), capacity: capacity.max(1) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the whole queue; missing or corrupt snapshot reads empty.
    pub fn load(&self) -> Vec<TelemetryPayload> {
        let Ok(text) = fs::read_to_string(&self.path) else {
            return Vec::new();
        };
        serde_json::from_str(&text).unwrap_or_else(|e| {
            warn!("queue store: snapshot unreadable ({e}), starting empty");
            Vec::new()
        })
    }

    /// Overwrite the whole snapshot.
    pub fn save(&self, queue: &[TelemetryPayload]) -> Result<(), StoreError> {
        fs::write(&self.path, serde_json::to_string(queue)?)?;
        Ok(())
    }

    /// Append a payload, evicting from the front once over capacity.
    ///
    /// Dropping the oldest unsent samples bounds flash use during long
    /// outages; telemetry is best-effort, not a durable ledger.
    pub fn enqueue(&self, payload: TelemetryPayload) -> Result<(), StoreError> {
        let mut queue = self.load();
        queue.push(payload);
        if queue.len() > self.capacity {
            let excess = queue.len() - self.capacity;
            queue.drain(..excess);
        }
        self.save(&queue)
    }

    pub fn len(&self) -> usize {
        self.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

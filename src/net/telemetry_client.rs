// CLASSIFICATION: COMMUNITY
// Filename: telemetry_client.rs v0.4
// Author: Lukas Bower
// Date Modified: 2026-03-02

//! Retry, backoff and store-and-forward policy around a [`Transport`].
//!
//! A payload gets up to three delivery attempts with exponential
//! backoff. Exhausting them parks the payload in the persistent queue;
//! the next successful send opportunistically drains a bounded slice of
//! that queue, oldest first, stopping at the first failure so order is
//! preserved. Delivery is at-least-once: a crash between "send
//! succeeded" and "queue rewritten" may duplicate an item on restart.

use std::thread;
use std::time::Duration;

use log::{debug, warn};

use crate::net::Transport;
use crate::telemetry::payload::TelemetryPayload;
use crate::telemetry::store::QueueStore;

const DEFAULT_RETRIES: u32 = 3;
const DEFAULT_BACKOFF: Duration = Duration::from_secs(1);
/// Drain at most this many queued items per successful send, so one
/// send call cannot monopolize the main loop after a long outage.
const DEFAULT_DRAIN_MAX: usize = 10;

/// Result of one send call, for the scheduler and the logging screen.
#[derive(Clone, Debug)]
pub struct SendOutcome {
    pub delivered: bool,
    pub status: String,
}

/// Telemetry delivery client. Owns the persistent queue exclusively.
pub struct TelemetryClient<T: Transport> {
    transport: T,
    queue: QueueStore,
    retries: u32,
    backoff_base: Duration,
    drain_max: usize,
}

impl<T: Transport> TelemetryClient<T> {
    pub fn new(transport: T, queue: QueueStore) -> Self {
        Self {
            transport,
            queue,
            retries: DEFAULT_RETRIES,
            backoff_base: DEFAULT_BACKOFF,
            drain_max: DEFAULT_DRAIN_MAX,
        }
    }

    /// Override retry count and backoff base. Tests use millisecond
    /// backoffs; the device keeps the defaults.
    pub fn with_retry(mut self, retries: u32, backoff_base: Duration) -> Self {
        self.retries = retries.max(1);
        self.backoff_base = backoff_base;
        self
    }

    pub fn with_drain_max(mut self, drain_max: usize) -> Self {
        self.drain_max = drain_max;
        self
    }

    /// Send one payload, falling back to the queue on failure.
    ///
    /// Never panics and never propagates: every failure path degrades
    /// to a `delivered == false` outcome with a status string.
    pub fn send(&self, payload: &TelemetryPayload) -> SendOutcome {
        let body = match serde_json::to_string(payload) {
            Ok(body) => body,
            Err(e) => {
                warn!("telemetry: payload encode failed: {e}");
                return SendOutcome { delivered: false, status: format!("encode failed: {e}") };
            }
        };

        let mut backoff = self.backoff_base;
        let mut last_err = String::new();
        for attempt in 1..=self.retries {
            match self.transport.post_json(&body) {
                Ok(()) => {
                    let drained = self.flush(self.drain_max);
                    if drained > 0 {
                        debug!("telemetry: drained {drained} queued payloads");
                    }
                    return SendOutcome { delivered: true, status: "sent".into() };
                }
                Err(e) => {
                    debug!("telemetry: attempt {attempt}/{} failed: {e}", self.retries);
                    last_err = e.to_string();
                }
            }
            thread::sleep(backoff);
            backoff *= 2;
        }

        // Best-effort park. Losing the ability to queue is not fatal.
        if let Err(e) = self.queue.enqueue(payload.clone()) {
            warn!("telemetry: queue write failed: {e}");
        }
        SendOutcome { delivered: false, status: format!("queued ({last_err})") }
    }

    /// Resend queued payloads from the front, oldest first, up to
    /// `max_items`. Stops at the first failure; the failed item and
    /// everything behind it keep their positions. Returns the number
    /// actually delivered.
    pub fn flush(&self, max_items: usize) -> usize {
        let mut queue = self.queue.load();
        if queue.is_empty() {
            return 0;
        }

        let mut sent = 0;
        while sent < max_items && !queue.is_empty() {
            let body = match serde_json::to_string(&queue[0]) {
                Ok(body) => body,
                Err(e) => {
                    warn!("telemetry: queued payload encode failed: {e}");
                    break;
                }
            };
            match self.transport.post_json(&body) {
                Ok(()) => {
                    queue.remove(0);
                    sent += 1;
                }
                Err(e) => {
                    debug!("telemetry: drain stopped: {e}");
                    break;
                }
            }
        }

        if sent > 0 {
            if let Err(e) = self.queue.save(&queue) {
                warn!("telemetry: queue rewrite failed: {e}");
            }
        }
        sent
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::TransportError;
    use crate::telemetry::payload::TelemetryValues;
    use std::cell::{Cell, RefCell};
    use std::collections::VecDeque;
    use tempfile::tempdir;

    /// Transport that replays a scripted outcome per call and falls
    /// back to success once the script runs dry.
    struct Scripted {
        script: RefCell<VecDeque<Result<(), TransportError>>>,
        calls: Cell<usize>,
    }

    impl Scripted {
        fn new(script: Vec<Result<(), TransportError>>) -> Self {
            Self { script: RefCell::new(script.into()), calls: Cell::new(0) }
        }

        fn failing(n: usize) -> Self {
            Self::new((0..n).map(|_| Err(TransportError::Server(500))).collect())
        }
    }

    impl Transport for Scripted {
        fn post_json(&self, _body: &str) -> Result<(), TransportError> {
            self.calls.set(self.calls.get() + 1);
            self.script.borrow_mut().pop_front().unwrap_or(Ok(()))
        }
    }

    fn payload(n: u64) -> TelemetryPayload {
        TelemetryPayload::auto_log(
            n,
            TelemetryValues { eco2_ppm: Some(650), ..Default::default() },
        )
    }

    fn client(transport: Scripted, queue: QueueStore) -> TelemetryClient<Scripted> {
        TelemetryClient::new(transport, queue).with_retry(3, Duration::from_millis(1))
    }

    #[test]
    fn first_attempt_success_sends_once() {
        let dir = tempdir().unwrap();
        let c = client(Scripted::new(vec![]), QueueStore::new(dir.path().join("q.json")));
        let out = c.send(&payload(1));
        assert!(out.delivered);
        assert_eq!(out.status, "sent");
        assert_eq!(c.transport.calls.get(), 1);
        assert_eq!(c.queue_len(), 0);
    }

    #[test]
    fn exhausted_retries_park_payload_in_queue() {
        let dir = tempdir().unwrap();
        let c = client(Scripted::failing(3), QueueStore::new(dir.path().join("q.json")));
        let out = c.send(&payload(7));
        assert!(!out.delivered);
        assert!(out.status.starts_with("queued"));
        assert!(out.status.contains("HTTP 500"));
        assert_eq!(c.transport.calls.get(), 3);
        let q = c.queue.load();
        assert_eq!(q.len(), 1);
        assert_eq!(q[0].recorded_at, 7);
    }

    #[test]
    fn success_drains_queue_oldest_first() {
        let dir = tempdir().unwrap();
        let queue = QueueStore::new(dir.path().join("q.json"));
        queue.enqueue(payload(1)).unwrap();
        queue.enqueue(payload(2)).unwrap();
        let c = client(Scripted::new(vec![]), queue);
        let out = c.send(&payload(3));
        assert!(out.delivered);
        // fresh payload plus both queued items
        assert_eq!(c.transport.calls.get(), 3);
        assert_eq!(c.queue_len(), 0);
    }

    #[test]
    fn drain_stops_at_first_failure_preserving_order() {
        let dir = tempdir().unwrap();
        let queue = QueueStore::new(dir.path().join("q.json"));
        for n in [10, 20, 30] {
            queue.enqueue(payload(n)).unwrap();
        }
        // A succeeds, B fails: B and C must keep their slots.
        let c = client(
            Scripted::new(vec![Ok(()), Err(TransportError::Server(503))]),
            queue,
        );
        let sent = c.flush(10);
        assert_eq!(sent, 1);
        let left: Vec<u64> = c.queue.load().iter().map(|p| p.recorded_at).collect();
        assert_eq!(left, vec![20, 30]);
    }

    #[test]
    fn drain_is_bounded_per_call() {
        let dir = tempdir().unwrap();
        let queue = QueueStore::new(dir.path().join("q.json"));
        for n in 0..8u64 {
            queue.enqueue(payload(n)).unwrap();
        }
        let c = client(Scripted::new(vec![]), queue);
        assert_eq!(c.flush(5), 5);
        assert_eq!(c.queue_len(), 3);
        let left: Vec<u64> = c.queue.load().iter().map(|p| p.recorded_at).collect();
        assert_eq!(left, vec![5, 6, 7]);
    }

    #[test]
    fn retry_then_success_still_counts_as_delivered() {
        let dir = tempdir().unwrap();
        let c = client(
            Scripted::new(vec![Err(TransportError::Timeout), Ok(())]),
            QueueStore::new(dir.path().join("q.json")),
        );
        let out = c.send(&payload(1));
        assert!(out.delivered);
        assert_eq!(c.transport.calls.get(), 2);
        assert_eq!(c.queue_len(), 0);
    }
}

// CLASSIFICATION: COMMUNITY
// Filename: telemetry_pipeline.rs v0.4
// Author: Lukas Bower
// Date Modified: 2026-08-29

//! End-to-end delivery tests against a local collector endpoint.

use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use tiny_http::{Response, Server, StatusCode};

use airbuddy::net::{HttpTransport, TelemetryClient};
use airbuddy::telemetry::{QueueStore, TelemetryPayload, TelemetryValues};

#[derive(Clone, Debug)]
struct Captured {
    method: String,
    url: String,
    device_id: Option<String>,
    device_key: Option<String>,
    status_returned: u16,
    body: String,
}

/// Serve exactly `statuses.len()` requests, answering with the scripted
/// status codes in order, and capture what arrived.
fn spawn_collector(
    statuses: Vec<u16>,
) -> (u16, Arc<Mutex<Vec<Captured>>>, thread::JoinHandle<()>) {
    let server = Server::http("127.0.0.1:0").unwrap();
    let port = server.server_addr().to_ip().unwrap().port();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let srv_seen = seen.clone();
    let handle = thread::spawn(move || {
        for status in statuses {
            let Ok(mut rq) = server.recv() else { break };
            let mut body = String::new();
            let _ = rq.as_reader().read_to_string(&mut body);
            let header = |name: &'static str| {
                rq.headers()
                    .iter()
                    .find(|h| h.field.equiv(name))
                    .map(|h| h.value.as_str().to_string())
            };
            srv_seen.lock().unwrap().push(Captured {
                method: rq.method().to_string(),
                url: rq.url().to_string(),
                device_id: header("X-Device-Id"),
                device_key: header("X-Device-Key"),
                status_returned: status,
                body,
            });
            let _ = rq.respond(Response::empty(StatusCode(status)));
        }
    });
    (port, seen, handle)
}

fn payload(n: u64) -> TelemetryPayload {
    TelemetryPayload::auto_log(
        n,
        TelemetryValues { eco2_ppm: Some(650), tvoc_ppb: Some(12), ..Default::default() },
    )
}

fn client(port: u16, queue: QueueStore) -> TelemetryClient<HttpTransport> {
    let transport = HttpTransport::new(&format!("http://127.0.0.1:{port}"), "AB-9", "key-9");
    TelemetryClient::new(transport, queue).with_retry(3, Duration::from_millis(5))
}

#[test]
fn posts_payload_with_device_headers() {
    if TcpListener::bind("127.0.0.1:0").is_err() {
        eprintln!("skipping test: cannot bind local port");
        return;
    }
    let (port, seen, handle) = spawn_collector(vec![200]);
    let dir = tempfile::tempdir().unwrap();
    let c = client(port, QueueStore::new(dir.path().join("q.json")));

    let sent = payload(1_700_000_111);
    let out = c.send(&sent);
    assert!(out.delivered, "status: {}", out.status);
    assert_eq!(c.queue_len(), 0);

    handle.join().unwrap();
    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].method, "POST");
    assert_eq!(seen[0].url, "/api/v1/telemetry");
    assert_eq!(seen[0].device_id.as_deref(), Some("AB-9"));
    assert_eq!(seen[0].device_key.as_deref(), Some("key-9"));
    let wire: TelemetryPayload = serde_json::from_str(&seen[0].body).unwrap();
    assert_eq!(wire, sent);
}

#[test]
fn server_errors_exhaust_retries_and_queue() {
    if TcpListener::bind("127.0.0.1:0").is_err() {
        eprintln!("skipping test: cannot bind local port");
        return;
    }
    let (port, seen, handle) = spawn_collector(vec![500, 500, 500]);
    let dir = tempfile::tempdir().unwrap();
    let queue = QueueStore::new(dir.path().join("q.json"));
    let c = client(port, queue.clone());

    let out = c.send(&payload(42));
    assert!(!out.delivered);
    assert!(out.status.starts_with("queued"));

    handle.join().unwrap();
    assert_eq!(seen.lock().unwrap().len(), 3);
    let parked = queue.load();
    assert_eq!(parked.len(), 1);
    assert_eq!(parked[0].recorded_at, 42);
}

#[test]
fn recovery_send_drains_parked_payloads_in_order() {
    if TcpListener::bind("127.0.0.1:0").is_err() {
        eprintln!("skipping test: cannot bind local port");
        return;
    }
    // Outage for the first payload's three attempts, then healthy for
    // the fresh payload and the drain of the parked one.
    let (port, seen, handle) = spawn_collector(vec![500, 500, 500, 200, 200]);
    let dir = tempfile::tempdir().unwrap();
    let queue = QueueStore::new(dir.path().join("q.json"));
    let c = client(port, queue.clone());

    let out = c.send(&payload(1));
    assert!(!out.delivered);
    assert_eq!(queue.len(), 1);

    let out = c.send(&payload(2));
    assert!(out.delivered);
    assert_eq!(queue.len(), 0);

    handle.join().unwrap();
    let seen = seen.lock().unwrap();
    let delivered: Vec<u64> = seen
        .iter()
        .filter(|c| c.status_returned == 200)
        .map(|c| serde_json::from_str::<TelemetryPayload>(&c.body).unwrap().recorded_at)
        .collect();
    // the fresh payload goes out first, then the parked one
    assert_eq!(delivered, vec![2, 1]);
}

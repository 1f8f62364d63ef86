// CLASSIFICATION: COMMUNITY
// Filename: mod.rs v0.3
// Author: Lukas Bower
// Date Modified: 2026-03-02

//! Blocking transport to the collector service.
//!
//! One HTTP POST per payload, authenticated with the device id/key
//! header pair. The underlying agent is built lazily on first use and
//! reused for connection pooling; it is not safe to share across
//! threads, which is fine under the single-threaded main loop.

pub mod telemetry_client;

pub use telemetry_client::{SendOutcome, TelemetryClient};

use std::time::Duration;

use once_cell::sync::OnceCell;
use thiserror::Error;
use ureq::{Agent, AgentBuilder};

use crate::config::Config;

/// Request timeout; the main loop blocks for at most this long per attempt.
const HTTP_TIMEOUT: Duration = Duration::from_secs(8);

/// One failed delivery attempt, classified.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,
    #[error("transport failure: {0}")]
    Io(String),
    #[error("server rejected payload: HTTP {0}")]
    Server(u16),
    #[error("payload encode failed: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Seam between retry/queue policy and the actual wire.
pub trait Transport {
    /// Deliver one serialized payload. `Ok` means HTTP 2xx.
    fn post_json(&self, body: &str) -> Result<(), TransportError>;
}

/// `POST {api_base}/api/v1/telemetry` over a pooled blocking agent.
pub struct HttpTransport {
    endpoint: String,
    device_id: String,
    device_key: String,
    agent: OnceCell<Agent>,
}

impl HttpTransport {
    pub fn new(api_base: &str, device_id: &str, device_key: &str) -> Self {
        Self {
            endpoint: format!("{}/api/v1/telemetry", api_base.trim_end_matches('/')),
            device_id: device_id.to_string(),
            device_key: device_key.to_string(),
            agent: OnceCell::new(),
        }
    }

    pub fn from_config(cfg: &Config) -> Self {
        Self::new(&cfg.api_base, &cfg.device_id, &cfg.device_key)
    }

    fn agent(&self) -> &Agent {
        self.agent
            .get_or_init(|| AgentBuilder::new().timeout(HTTP_TIMEOUT).build())
    }
}

impl Transport for HttpTransport {
    fn post_json(&self, body: &str) -> Result<(), TransportError> {
        let resp = self
            .agent()
            .post(&self.endpoint)
            .set("Content-Type", "application/json")
            .set("X-Device-Id", &self.device_id)
            .set("X-Device-Key", &self.device_key)
            .send_string(body)
            .map_err(classify)?;
        let status = resp.status();
        if !(200..300).contains(&status) {
            return Err(TransportError::Server(status));
        }
        Ok(())
    }
}

fn classify(err: ureq::Error) -> TransportError {
    match err {
        ureq::Error::Status(code, _) => TransportError::Server(code),
        ureq::Error::Transport(t) => {
            let text = t.to_string();
            // ureq surfaces socket timeouts as transport-level io errors
            if text.contains("timed out") {
                TransportError::Timeout
            } else {
                TransportError::Io(text)
            }
        }
    }
}

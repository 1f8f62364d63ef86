// CLASSIFICATION: COMMUNITY
// Filename: mod.rs v0.2
// Author: Lukas Bower
// Date Modified: 2026-03-02

//! Telemetry pipeline: payload shape, persisted stores, send scheduler.

pub mod payload;
pub mod scheduler;
pub mod store;

pub use payload::{TelemetryFlags, TelemetryPayload, TelemetryValues};
pub use scheduler::{LastSentStatus, ScheduleState, TelemetryScheduler};
pub use store::{LastSentRecord, QueueStore, StatusStore, StoreError};

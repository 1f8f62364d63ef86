// CLASSIFICATION: COMMUNITY
// Filename: lib.rs v0.3
// Author: Lukas Bower
// Date Modified: 2026-03-02

//! Root library for the AirBuddy telemetry core.
//!
//! The crate covers the confidence-gated pipeline from raw gas-sensor
//! samples to the remote collector: bounded-retry acquisition, interval
//! scheduling with a real-data gate, and store-and-forward delivery over
//! an intermittent link. Display, input and boot orchestration live in
//! the device tree, not here.

/// Device configuration loaded from `config.json`.
pub mod config;

/// Hardware abstraction traits plus deterministic simulations.
pub mod hal;

/// Air sensor acquisition and the eCO2 confidence model.
pub mod sensors;

/// Payload building, persistent stores and the send scheduler.
pub mod telemetry;

/// Blocking HTTP transport to the collector service.
pub mod net;

// CLASSIFICATION: COMMUNITY
// Filename: mod.rs v0.2
// Author: Lukas Bower
// Date Modified: 2026-03-02

//! Hardware abstraction seams for the telemetry pipeline.
//!
//! The pipeline never talks to an I2C bus, a radio or a wall clock
//! directly; it goes through these traits so the acquisition and
//! scheduling logic can be driven deterministically off-device.

pub mod sim;

use std::time::{SystemTime, UNIX_EPOCH};

use crate::sensors::SensorError;

/// One raw sample off the gas/climate sensor pair.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RawSample {
    pub temp_c: f32,
    pub humidity: f32,
    /// Coarse air quality index, 1 (excellent) .. 5 (unhealthy).
    pub aqi: u8,
    pub tvoc_ppb: u16,
    pub eco2_ppm: u16,
}

/// Sensor bus transaction owner.
pub trait SensorBus {
    /// Feed ambient temperature/humidity into the gas sensor's internal
    /// correction before the next read.
    fn set_environment(&mut self, temp_c: f32, rh: f32) -> Result<(), SensorError>;

    /// Read one raw sample.
    fn read_raw(&mut self) -> Result<RawSample, SensorError>;
}

/// Wireless link state, owned by the connection manager.
pub trait NetworkStatus {
    fn is_connected(&self) -> bool;
}

/// Wall clock source (RTC-synced on real hardware).
pub trait ClockSource {
    fn now_unix_seconds(&self) -> u64;
}

/// Clock backed by the system time.
pub struct SystemClock;

impl ClockSource for SystemClock {
    fn now_unix_seconds(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}

// CLASSIFICATION: COMMUNITY
// Filename: payload.rs v0.3
// Author: Lukas Bower
// Date Modified: 2026-03-02

//! Wire payload for the collector service.
//!
//! The values block is a statically-typed record rather than a loose
//! key/value map; absent fields are skipped on the wire so the JSON
//! stays compact. Field names match the collector's v1 schema.

use serde::{Deserialize, Serialize};

use crate::sensors::AirReading;

/// Sensor values carried in one telemetry post.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TelemetryValues {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eco2_ppm: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tvoc_ppb: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temp_c: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rh: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aqi: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ready: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<u8>,
    /// Board temperature from the RTC die, when the clock driver is up.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rtc_temp_c: Option<f32>,
}

impl TelemetryValues {
    /// Map a reading (plus optional RTC die temperature) onto the wire
    /// record. A `None` reading yields an empty block the gate rejects.
    pub fn from_reading(reading: Option<&AirReading>, rtc_temp_c: Option<f32>) -> Self {
        let mut values = match reading {
            Some(r) => Self {
                eco2_ppm: Some(r.eco2_ppm),
                tvoc_ppb: Some(r.tvoc_ppb),
                temp_c: Some(r.temp_c),
                rh: Some(r.humidity),
                aqi: Some(r.aqi),
                ready: Some(r.ready),
                confidence: r.confidence,
                rtc_temp_c: None,
            },
            None => Self::default(),
        };
        values.rtc_temp_c = rtc_temp_c;
        values
    }

    /// Real-data gate: true when at least one field carries a plausible
    /// measurement and the reading is not explicitly flagged not-ready.
    /// Stops placeholder/zero records from polluting the remote store.
    pub fn has_real_data(&self) -> bool {
        if self.ready == Some(false) {
            return false;
        }
        if self.eco2_ppm.map_or(false, |v| v > 0) {
            return true;
        }
        if self.tvoc_ppb.map_or(false, |v| v > 0) {
            return true;
        }
        if self.temp_c.map_or(false, |t| (-20.0..=80.0).contains(&t)) {
            return true;
        }
        if self.rh.map_or(false, |h| (0.0..=100.0).contains(&h)) {
            return true;
        }
        false
    }
}

/// Post flags understood by the collector.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TelemetryFlags {
    pub auto_log: bool,
}

/// One telemetry post. Built fresh per attempt, immutable once built;
/// this is the unit stored in the queue and sent over the wire.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TelemetryPayload {
    pub recorded_at: u64,
    pub values: TelemetryValues,
    pub flags: TelemetryFlags,
}

impl TelemetryPayload {
    pub fn auto_log(recorded_at: u64, values: TelemetryValues) -> Self {
        Self { recorded_at, values, flags: TelemetryFlags { auto_log: true } }
    }
}

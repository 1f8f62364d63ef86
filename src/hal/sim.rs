// CLASSIFICATION: COMMUNITY
// Filename: sim.rs v0.2
// Author: Lukas Bower
// Date Modified: 2026-03-02

//! Deterministic stand-ins for the hardware seams.
//!
//! `SimulatedBus` replays a scripted sample sequence, holding the final
//! entry once the script is exhausted. Used by `airbuddyd` when no real
//! bus is wired up and by the acquisition tests.

use super::{ClockSource, NetworkStatus, RawSample, SensorBus};
use crate::sensors::SensorError;

/// Scripted sensor bus.
pub struct SimulatedBus {
    script: Vec<Result<RawSample, SensorError>>,
    pos: usize,
    /// Environment compensation writes observed, newest last.
    pub env_writes: Vec<(f32, f32)>,
}

impl SimulatedBus {
    pub fn new(script: Vec<Result<RawSample, SensorError>>) -> Self {
        Self { script, pos: 0, env_writes: Vec::new() }
    }

    /// Bus that always returns the same settled sample.
    pub fn steady(sample: RawSample) -> Self {
        Self::new(vec![Ok(sample)])
    }
}

impl SensorBus for SimulatedBus {
    fn set_environment(&mut self, temp_c: f32, rh: f32) -> Result<(), SensorError> {
        self.env_writes.push((temp_c, rh));
        Ok(())
    }

    fn read_raw(&mut self) -> Result<RawSample, SensorError> {
        if self.script.is_empty() {
            return Err(SensorError::Bus("empty script".into()));
        }
        let idx = self.pos.min(self.script.len() - 1);
        self.pos += 1;
        self.script[idx].clone()
    }
}

/// Link that is always associated.
pub struct AlwaysOnline;

impl NetworkStatus for AlwaysOnline {
    fn is_connected(&self) -> bool {
        true
    }
}

/// Link that never associates.
pub struct AlwaysOffline;

impl NetworkStatus for AlwaysOffline {
    fn is_connected(&self) -> bool {
        false
    }
}

/// Clock pinned to a fixed unix timestamp.
pub struct FixedClock(pub u64);

impl ClockSource for FixedClock {
    fn now_unix_seconds(&self) -> u64 {
        self.0
    }
}

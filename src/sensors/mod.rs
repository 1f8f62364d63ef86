// CLASSIFICATION: COMMUNITY
// Filename: mod.rs v0.3
// Author: Lukas Bower
// Date Modified: 2026-08-29

//! Sensor acquisition subsystem.

pub mod air;
pub mod confidence;
pub mod log;

pub use air::{AirReading, AirSensor, Source};
pub use self::log::SampleLog;

use thiserror::Error;

/// Errors raised at the sensor boundary.
#[derive(Clone, Debug, Error)]
pub enum SensorError {
    /// `acquire` was called while the warm-up window is still open.
    /// Caller error; the sensor does not wait out the window itself.
    #[error("sensor warm-up in progress")]
    WarmupActive,
    /// The bus transaction failed (NACK, short read, driver fault).
    #[error("sensor bus fault: {0}")]
    Bus(String),
}

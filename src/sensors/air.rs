// CLASSIFICATION: COMMUNITY
// Filename: air.rs v0.5
// Author: Lukas Bower
// Date Modified: 2026-08-29

//! ENS160 + AHT21 acquisition with bounded retry.
//!
//! The gas sensor reports garbage until it settles, so a single read is
//! never trusted. `acquire` loops until the validity heuristic passes or
//! a caller-supplied timeout elapses, re-feeding temperature/humidity
//! compensation before every read. The loop never blocks indefinitely
//! and never fabricates data: a timeout hands back the last raw sample
//! observed with `ready == false` and a human-readable reason.

use std::thread;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use log::debug;

use crate::hal::{RawSample, SensorBus};
use crate::sensors::confidence::{self, ConfidenceInputs};
use crate::sensors::log::SampleLog;
use crate::sensors::SensorError;

/// Upper plausibility bound for eCO2 in ppm.
pub const ECO2_MAX_PPM: u16 = 60000;
/// Upper plausibility bound for TVOC in ppb.
pub const TVOC_MAX_PPB: u16 = 65000;

/// Compensation defaults used before any sample has been seen.
const DEFAULT_TEMP_C: f32 = 25.0;
const DEFAULT_RH: f32 = 50.0;

/// Provenance tag carried on every reading.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Source {
    Button,
    Telemetry,
    Boot,
    /// Reading synthesized from the last known good sample.
    Fallback,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Button => "button",
            Source::Telemetry => "telemetry",
            Source::Boot => "boot",
            Source::Fallback => "fallback",
        }
    }
}

/// One acquisition outcome. Immutable once built.
#[derive(Clone, Debug, PartialEq)]
pub struct AirReading {
    pub timestamp: u64,
    pub temp_c: f32,
    pub humidity: f32,
    pub eco2_ppm: u16,
    pub tvoc_ppb: u16,
    pub aqi: u8,
    pub rating: &'static str,
    pub ready: bool,
    pub confidence: Option<u8>,
    pub reason: String,
    pub source: Source,
}

/// True when a raw sample satisfies the ENS160 validity heuristic.
pub fn sample_valid(s: &RawSample) -> bool {
    (1..=5).contains(&s.aqi)
        && s.eco2_ppm > 0
        && s.eco2_ppm <= ECO2_MAX_PPM
        && s.tvoc_ppb <= TVOC_MAX_PPB
}

/// Coarse label shown on the device next to the AQI.
fn rating_from_aqi(aqi: u8) -> &'static str {
    match aqi {
        0 | 1 => "Very good",
        2 => "Good",
        3 => "Ok",
        _ => "Poor",
    }
}

fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Air sensor frontend over a [`SensorBus`].
///
/// Owns the warm-up window state machine: `Idle -> Warming(until) ->
/// Sampling -> Ready | NotReady`. Calling `acquire` while warming is a
/// caller error and is reported, not waited out.
pub struct AirSensor<B: SensorBus> {
    bus: B,
    warmup_until: Option<Instant>,
    warmup_source: Option<Source>,
    /// Warm-up has completed at least once since power-on.
    warmed: bool,
    /// Last raw sample seen on the bus, valid or not.
    last_raw: Option<RawSample>,
    /// Last reading that passed validity; feeds stability scoring.
    last_accepted: Option<AirReading>,
    /// Optional CSV history of accepted readings.
    log: Option<SampleLog>,
}

impl<B: SensorBus> AirSensor<B> {
    pub fn new(bus: B) -> Self {
        Self {
            bus,
            warmup_until: None,
            warmup_source: None,
            warmed: false,
            last_raw: None,
            last_accepted: None,
            log: None,
        }
    }

    /// Record every accepted reading to `log` from here on.
    pub fn attach_log(&mut self, log: SampleLog) {
        self.log = Some(log);
    }

    /// Logged readings so far; zero when no log is attached.
    pub fn log_count(&self) -> usize {
        self.log.as_ref().map(SampleLog::count).unwrap_or(0)
    }

    /// Open a post-power-on settling window. Readings taken before it
    /// elapses are not trusted, so `acquire` refuses to run until then.
    pub fn begin_warmup(&mut self, warmup: Duration, source: Source) {
        self.warmup_until = Some(Instant::now() + warmup);
        self.warmup_source = Some(source);
    }

    /// True once any pending warm-up window has elapsed.
    pub fn is_ready(&self) -> bool {
        match self.warmup_until {
            Some(until) => Instant::now() >= until,
            None => true,
        }
    }

    /// True while a warm-up window is still open.
    pub fn is_warming(&self) -> bool {
        !self.is_ready()
    }

    /// Last reading that passed validity, if any.
    pub fn last_accepted(&self) -> Option<&AirReading> {
        self.last_accepted.as_ref()
    }

    /// Acquire a validated reading within `timeout`, polling every `step`.
    ///
    /// Errors only when called mid-warm-up. Bus faults and invalid
    /// samples do not error; they degrade to a `ready == false` reading
    /// once the timeout elapses.
    pub fn acquire(
        &mut self,
        timeout: Duration,
        step: Duration,
        source: Source,
    ) -> Result<AirReading, SensorError> {
        if self.is_warming() {
            return Err(SensorError::WarmupActive);
        }
        if self.warmup_until.take().is_some() {
            self.warmed = true;
            if let Some(src) = self.warmup_source.take() {
                debug!("air: warm-up ({}) complete", src.as_str());
            }
        }

        let started = Instant::now();
        let mut seen: Option<RawSample> = None;

        loop {
            // Re-apply compensation from the freshest sample we have so
            // the gas sensor corrects against current conditions.
            let (t, h) = seen
                .or(self.last_raw)
                .map(|s| (s.temp_c, s.humidity))
                .unwrap_or((DEFAULT_TEMP_C, DEFAULT_RH));
            if let Err(e) = self.bus.set_environment(t, h) {
                debug!("air: compensation write failed: {e}");
            }

            match self.bus.read_raw() {
                Ok(sample) => {
                    seen = Some(sample);
                    self.last_raw = Some(sample);
                    if sample_valid(&sample) {
                        let reading = self.build_reading(sample, true, String::new(), source);
                        self.last_accepted = Some(reading.clone());
                        if let Some(log) = &self.log {
                            log.append(&reading);
                        }
                        return Ok(reading);
                    }
                }
                Err(e) => debug!("air: raw read failed: {e}"),
            }

            if started.elapsed() >= timeout {
                break;
            }
            thread::sleep(step);
        }

        // Timed out. Hand back whatever was last observed, flagged
        // not-ready, so the caller can distinguish stale from settled.
        let outcome = match seen.or(self.last_raw) {
            Some(sample) => {
                let src = if seen.is_some() { source } else { Source::Fallback };
                self.build_reading(sample, false, "sensor not ready".into(), src)
            }
            None => AirReading {
                timestamp: now_unix(),
                temp_c: 0.0,
                humidity: 0.0,
                eco2_ppm: 0,
                tvoc_ppb: 0,
                aqi: 0,
                rating: rating_from_aqi(0),
                ready: false,
                confidence: None,
                reason: "sensor read failed".into(),
                source,
            },
        };
        Ok(outcome)
    }

    fn build_reading(
        &self,
        sample: RawSample,
        ready: bool,
        reason: String,
        source: Source,
    ) -> AirReading {
        let confidence = confidence::score(&ConfidenceInputs {
            ens_valid: sample_valid(&sample),
            warmup_done: self.warmed,
            temp_c: sample.temp_c,
            rh: sample.humidity,
            eco2_ppm: sample.eco2_ppm,
            last_eco2_ppm: self.last_accepted.as_ref().map(|r| r.eco2_ppm),
            aqi: Some(sample.aqi),
            last_aqi: self.last_accepted.as_ref().map(|r| r.aqi),
            source,
        });
        AirReading {
            timestamp: now_unix(),
            temp_c: sample.temp_c,
            humidity: sample.humidity,
            eco2_ppm: sample.eco2_ppm,
            tvoc_ppb: sample.tvoc_ppb,
            aqi: sample.aqi,
            rating: rating_from_aqi(sample.aqi),
            ready,
            confidence: Some(confidence),
            reason,
            source,
        }
    }
}

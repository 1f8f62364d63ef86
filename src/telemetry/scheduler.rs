// CLASSIFICATION: COMMUNITY
// Filename: scheduler.rs v0.5
// Author: Lukas Bower
// Date Modified: 2026-03-02

//! Telemetry send scheduler.
//!
//! `tick` is called from every main-loop iteration and no-ops unless a
//! send is due. The next due instant is advanced *before* any I/O, so a
//! slow or failing attempt can never cause a retry storm: at most one
//! attempt per interval, full stop. A completed attempt (gate reject or
//! send) writes the last-sent record; pure connectivity or warm-up
//! skips write nothing, keeping "nothing to report yet" distinct from
//! "we tried and failed" on the logging screen.

use std::time::{Duration, Instant};

use chrono::{Local, TimeZone};
use log::{debug, info};

use crate::config::Config;
use crate::hal::{ClockSource, NetworkStatus, SensorBus};
use crate::net::{TelemetryClient, Transport};
use crate::sensors::{AirReading, AirSensor, Source};
use crate::telemetry::payload::{TelemetryPayload, TelemetryValues};
use crate::telemetry::store::StatusStore;

/// First attempt shortly after boot, before the regular cadence.
const FIRST_DUE_DELAY: Duration = Duration::from_secs(3);
/// Bounds on the quick acquisition done per telemetry attempt.
const ACQUIRE_TIMEOUT: Duration = Duration::from_millis(2500);
const ACQUIRE_STEP: Duration = Duration::from_millis(250);
/// Anything below this is an unsynced RTC, not a real wall clock.
const EPOCH_MIN: u64 = 1_000_000_000;

/// When the next attempt is due. `next_due` only moves forward, and
/// always before the attempt it schedules.
#[derive(Clone, Copy, Debug)]
pub struct ScheduleState {
    next_due: Instant,
    interval: Duration,
}

impl ScheduleState {
    pub fn new(now: Instant) -> Self {
        Self { next_due: now + FIRST_DUE_DELAY, interval: Duration::from_secs(120) }
    }

    pub fn is_due(&self, now: Instant) -> bool {
        now >= self.next_due
    }

    /// Re-arm for one interval from `now`. The 10 s floor holds even if
    /// the caller hands in something smaller.
    pub fn arm(&mut self, now: Instant, interval: Duration) {
        self.interval = interval.max(Duration::from_secs(10));
        self.next_due = now + self.interval;
    }

    pub fn next_due(&self) -> Instant {
        self.next_due
    }
}

/// Last-sent summary for the logging screen.
#[derive(Clone, Debug, PartialEq)]
pub struct LastSentStatus {
    pub ts: Option<u64>,
    pub ok: Option<bool>,
    pub text: String,
}

/// Orchestrates acquisition, gating and delivery on a fixed cadence.
pub struct TelemetryScheduler<T: Transport> {
    schedule: ScheduleState,
    client: TelemetryClient<T>,
    status: StatusStore,
    /// Most recent reading, kept across ticks so a transient read
    /// failure can still report the previous sample.
    last_reading: Option<AirReading>,
}

impl<T: Transport> TelemetryScheduler<T> {
    pub fn new(client: TelemetryClient<T>, status: StatusStore) -> Self {
        Self {
            schedule: ScheduleState::new(Instant::now()),
            client,
            status,
            last_reading: None,
        }
    }

    /// Main-loop entry point. Cheap unless a send is due.
    pub fn tick<B: SensorBus>(
        &mut self,
        cfg: &Config,
        air: &mut AirSensor<B>,
        net: &dyn NetworkStatus,
        clock: &dyn ClockSource,
        rtc_temp_c: Option<f32>,
    ) {
        self.tick_at(Instant::now(), cfg, air, net, clock, rtc_temp_c);
    }

    /// `tick` with an explicit monotonic instant, for simulated time.
    pub fn tick_at<B: SensorBus>(
        &mut self,
        now: Instant,
        cfg: &Config,
        air: &mut AirSensor<B>,
        net: &dyn NetworkStatus,
        clock: &dyn ClockSource,
        rtc_temp_c: Option<f32>,
    ) {
        if !cfg.telemetry_enabled {
            return;
        }
        if !self.schedule.is_due(now) {
            return;
        }

        // Re-arm before any I/O so this attempt, however it ends,
        // cannot overlap with the next one.
        self.schedule.arm(now, cfg.post_interval());
        debug!("telemetry: due, interval={:?}", cfg.post_interval());

        if !net.is_connected() {
            debug!("telemetry: skip (link down)");
            return;
        }
        if air.is_warming() {
            debug!("telemetry: skip (sensor warming)");
            return;
        }

        // Best-effort acquisition; a failure proceeds with the cached
        // reading rather than aborting the attempt.
        match air.acquire(ACQUIRE_TIMEOUT, ACQUIRE_STEP, Source::Telemetry) {
            Ok(reading) => self.last_reading = Some(reading),
            Err(e) => debug!("telemetry: acquire failed: {e}"),
        }

        let recorded_at = clock.now_unix_seconds();
        if recorded_at < EPOCH_MIN {
            debug!("telemetry: skip (clock not epoch, t={recorded_at})");
            return;
        }

        let values = TelemetryValues::from_reading(self.last_reading.as_ref(), rtc_temp_c);
        if !values.has_real_data() {
            // Completed attempt with nothing worth sending: record the
            // failure for the UI but never touch the network.
            self.status.write(recorded_at, false);
            debug!("telemetry: skip (no real data)");
            return;
        }

        let payload = TelemetryPayload::auto_log(recorded_at, values);
        let outcome = self.client.send(&payload);
        self.status.write(recorded_at, outcome.delivered);
        info!("telemetry: attempt ok={} status={}", outcome.delivered, outcome.status);
    }

    /// Pending queue depth, for the logging screen.
    pub fn queue_size(&self) -> usize {
        self.client.queue_len()
    }

    /// Last attempt summary, for the logging screen.
    pub fn last_sent(&self) -> LastSentStatus {
        match self.status.read() {
            Some(rec) => LastSentStatus {
                ts: Some(rec.ts),
                ok: Some(rec.ok),
                text: format_ts(rec.ts),
            },
            None => LastSentStatus { ts: None, ok: None, text: "---".into() },
        }
    }
}

fn format_ts(ts: u64) -> String {
    match Local.timestamp_opt(ts as i64, 0).single() {
        Some(dt) => dt.format("%m/%d-%H:%M").to_string(),
        None => ts.to_string(),
    }
}

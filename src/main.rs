// CLASSIFICATION: COMMUNITY
// Filename: main.rs v0.3
// Author: Lukas Bower
// Date Modified: 2026-08-29

//! `airbuddyd` — run the telemetry pipeline as a blocking daemon.
//!
//! Takes an optional data directory argument (default `.`) holding
//! `config.json`, the queue snapshot and the last-sent record. Without
//! real hardware the sensor bus is the deterministic simulation; on the
//! device the loop is identical with the I2C-backed bus swapped in.

use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use anyhow::Result;
use log::info;

use airbuddy::config::Config;
use airbuddy::hal::sim::{AlwaysOnline, SimulatedBus};
use airbuddy::hal::{RawSample, SystemClock};
use airbuddy::net::{HttpTransport, TelemetryClient};
use airbuddy::sensors::{AirSensor, SampleLog, Source};
use airbuddy::telemetry::{QueueStore, StatusStore, TelemetryScheduler};

const LOOP_STEP: Duration = Duration::from_millis(250);
const WARMUP: Duration = Duration::from_secs(20);

fn main() -> Result<()> {
    env_logger::init();

    let data_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    std::fs::create_dir_all(&data_dir)?;

    let cfg = Config::load(&data_dir.join("config.json"));
    info!(
        "airbuddyd: telemetry {} every {}s to {}",
        if cfg.telemetry_enabled { "on" } else { "off" },
        cfg.telemetry_post_every_s,
        cfg.api_base
    );

    let queue = QueueStore::new(data_dir.join("telemetry_queue.json"));
    let status = StatusStore::new(data_dir.join("telemetry_last_sent.json"));
    let client = TelemetryClient::new(HttpTransport::from_config(&cfg), queue);
    let mut scheduler = TelemetryScheduler::new(client, status);

    let mut air = AirSensor::new(SimulatedBus::steady(RawSample {
        temp_c: 21.5,
        humidity: 46.0,
        aqi: 2,
        tvoc_ppb: 40,
        eco2_ppm: 640,
    }));
    air.attach_log(SampleLog::new(data_dir.join("air_records.csv")));
    air.begin_warmup(WARMUP, Source::Boot);
    info!("airbuddyd: sensor warming for {WARMUP:?}");

    // Single-threaded cooperative loop; the scheduler no-ops until due
    // and every failure inside it degrades to a persisted status flag.
    loop {
        scheduler.tick(&cfg, &mut air, &AlwaysOnline, &SystemClock, None);
        thread::sleep(LOOP_STEP);
    }
}

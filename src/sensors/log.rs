// CLASSIFICATION: COMMUNITY
// Filename: log.rs v0.2
// Author: Lukas Bower
// Date Modified: 2026-08-29

//! Lightweight CSV log of accepted readings.
//!
//! One append per validated reading, header written once on open. The
//! log feeds the on-device history screen only; every write is
//! best-effort because losing a log line must never fail an
//! acquisition.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use log::warn;

use crate::sensors::air::AirReading;

const CSV_HEADER: &str = "timestamp,temp_c,humidity,eco2_ppm,tvoc_ppb,aqi,rating,source\n";

/// Append-only sample history on non-volatile storage.
#[derive(Clone, Debug)]
pub struct SampleLog {
    path: PathBuf,
}

impl SampleLog {
    /// Open the log, writing the CSV header if the file is new. A
    /// failure to create the file is reported and tolerated.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let log = Self { path: path.into() };
        if fs::metadata(&log.path).is_err() {
            if let Err(e) = fs::write(&log.path, CSV_HEADER) {
                warn!("sample log: create {} failed: {e}", log.path.display());
            }
        }
        log
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one reading. Best-effort.
    pub fn append(&self, r: &AirReading) {
        let line = format!(
            "{},{:.2},{:.2},{},{},{},{},{}\n",
            r.timestamp,
            r.temp_c,
            r.humidity,
            r.eco2_ppm,
            r.tvoc_ppb,
            r.aqi,
            r.rating,
            r.source.as_str(),
        );
        let appended = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)
            .and_then(|mut f| f.write_all(line.as_bytes()));
        if let Err(e) = appended {
            warn!("sample log: append {} failed: {e}", self.path.display());
        }
    }

    /// Number of logged readings, excluding the header line. A missing
    /// or unreadable file counts as zero.
    pub fn count(&self) -> usize {
        match fs::read_to_string(&self.path) {
            Ok(text) => text.lines().count().saturating_sub(1),
            Err(_) => 0,
        }
    }
}

// CLASSIFICATION: COMMUNITY
// Filename: config.rs v0.2
// Author: Lukas Bower
// Date Modified: 2026-03-02

//! Device configuration stored as `config.json` on flash.
//!
//! Loading applies defaults for missing keys, strips accidental
//! whitespace and clamps the post interval to a safe floor so a bad
//! config can never hammer the collector. Saving goes through a temp
//! file swap to reduce corruption risk on power loss.

use std::fs;
use std::path::Path;
use std::time::Duration;

use log::warn;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Minimum allowed posting interval in seconds.
pub const MIN_POST_INTERVAL_S: u32 = 10;

const DEFAULT_POST_INTERVAL_S: u32 = 120;

/// Errors produced by config persistence.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config io failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("config encode failed: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Device configuration snapshot.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub telemetry_enabled: bool,
    pub telemetry_post_every_s: u32,
    pub api_base: String,
    pub device_id: String,
    pub device_key: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            telemetry_enabled: true,
            telemetry_post_every_s: DEFAULT_POST_INTERVAL_S,
            api_base: "https://air.earthen.io".into(),
            device_id: "AB-0001".into(),
            device_key: "devkey-please-change-me".into(),
        }
    }
}

impl Config {
    /// Load from disk, repairing missing or malformed content.
    ///
    /// Never fails: an unreadable or corrupt file yields defaults, and
    /// the repaired config is written back so the next boot is clean.
    pub fn load(path: &Path) -> Self {
        let existed = path.exists();
        let mut cfg = match fs::read_to_string(path) {
            Ok(text) => match serde_json::from_str::<Config>(&text) {
                Ok(c) => c,
                Err(e) => {
                    warn!("config: {} unparseable ({e}), using defaults", path.display());
                    Config::default()
                }
            },
            Err(_) => Config::default(),
        };
        let repaired = cfg.normalize();
        if !existed || repaired {
            if let Err(e) = cfg.save(path) {
                warn!("config: rewrite of {} failed: {e}", path.display());
            }
        }
        cfg
    }

    /// Safe save via temp file swap.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_string(self)?)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }

    /// Posting interval with the safety floor applied.
    pub fn post_interval(&self) -> Duration {
        Duration::from_secs(u64::from(self.telemetry_post_every_s.max(MIN_POST_INTERVAL_S)))
    }

    /// Enforce types and strip whitespace. Returns true if anything changed.
    fn normalize(&mut self) -> bool {
        let mut changed = false;
        let trimmed = self.api_base.trim().trim_end_matches('/').to_string();
        if trimmed != self.api_base {
            self.api_base = trimmed;
            changed = true;
        }
        for field in [&mut self.device_id, &mut self.device_key] {
            let t = field.trim().to_string();
            if t != *field {
                *field = t;
                changed = true;
            }
        }
        if self.telemetry_post_every_s < MIN_POST_INTERVAL_S {
            self.telemetry_post_every_s = MIN_POST_INTERVAL_S;
            changed = true;
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn load_missing_file_writes_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let cfg = Config::load(&path);
        assert!(cfg.telemetry_enabled);
        assert_eq!(cfg.telemetry_post_every_s, 120);
        assert!(path.exists());
    }

    #[test]
    fn interval_clamped_to_floor() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"telemetry_post_every_s": 3}"#).unwrap();
        let cfg = Config::load(&path);
        assert_eq!(cfg.telemetry_post_every_s, MIN_POST_INTERVAL_S);
        assert_eq!(cfg.post_interval(), Duration::from_secs(10));
    }

    #[test]
    fn strings_trimmed_and_slash_stripped() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{"api_base": "http://air.example/ ", "device_id": " AB-7 "}"#,
        )
        .unwrap();
        let cfg = Config::load(&path);
        assert_eq!(cfg.api_base, "http://air.example");
        assert_eq!(cfg.device_id, "AB-7");
    }

    #[test]
    fn corrupt_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{not json").unwrap();
        let cfg = Config::load(&path);
        assert_eq!(cfg.device_id, "AB-0001");
    }
}

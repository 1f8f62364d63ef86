// CLASSIFICATION: COMMUNITY
// Filename: confidence.rs v0.2
// Author: Lukas Bower
// Date Modified: 2026-03-02

//! Confidence model for ENS160-class eCO2 readings.
//!
//! Weighted additive heuristic, not a statistical model. Given identical
//! inputs the score is identical; that determinism is the only hard
//! requirement. Weights: validity 30, warm-up 10, temp/RH compensation
//! 10 + 10, eCO2 stability up to 20, AQI stability up to 15, provenance 5.

use crate::sensors::Source;

/// Inputs to one confidence evaluation.
#[derive(Clone, Copy, Debug)]
pub struct ConfidenceInputs {
    /// Current raw sample passed the validity heuristic.
    pub ens_valid: bool,
    /// Post-power-on settling window has elapsed.
    pub warmup_done: bool,
    pub temp_c: f32,
    pub rh: f32,
    pub eco2_ppm: u16,
    pub last_eco2_ppm: Option<u16>,
    pub aqi: Option<u8>,
    pub last_aqi: Option<u8>,
    pub source: Source,
}

/// Score a reading, clamped to 1..=100.
pub fn score(inp: &ConfidenceInputs) -> u8 {
    let mut score: u32 = 0;

    if inp.ens_valid {
        score += 30;
    }
    if inp.warmup_done {
        score += 10;
    }

    // Compensation inputs must be physically plausible for the gas
    // sensor's internal correction to mean anything.
    if (-10.0..=60.0).contains(&inp.temp_c) {
        score += 10;
    }
    if (0.0..=100.0).contains(&inp.rh) {
        score += 10;
    }

    match inp.last_eco2_ppm {
        Some(last) => {
            let delta = i32::from(inp.eco2_ppm).abs_diff(i32::from(last));
            if delta < 50 {
                score += 20;
            } else if delta < 150 {
                score += 12;
            } else if delta < 300 {
                score += 5;
            }
        }
        // First reading baseline.
        None => score += 5,
    }

    if let (Some(aqi), Some(last)) = (inp.aqi, inp.last_aqi) {
        if aqi.abs_diff(last) <= 1 {
            score += 15;
        } else {
            score += 5;
        }
    }

    if inp.source != Source::Fallback {
        score += 5;
    }

    score.clamp(1, 100) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> ConfidenceInputs {
        ConfidenceInputs {
            ens_valid: true,
            warmup_done: true,
            temp_c: 22.0,
            rh: 45.0,
            eco2_ppm: 600,
            last_eco2_ppm: Some(610),
            aqi: Some(2),
            last_aqi: Some(2),
            source: Source::Telemetry,
        }
    }

    #[test]
    fn settled_reading_scores_full() {
        // 30 + 10 + 10 + 10 + 20 + 15 + 5
        assert_eq!(score(&base()), 100);
    }

    #[test]
    fn first_reading_gets_flat_baseline() {
        let mut inp = base();
        inp.last_eco2_ppm = None;
        // stability 20 replaced by baseline 5
        assert_eq!(score(&inp), 85);
    }

    #[test]
    fn eco2_stability_tiers() {
        let mut inp = base();
        inp.eco2_ppm = 600;
        for (last, expected) in [(649, 100), (700, 92), (850, 85), (1000, 80)] {
            inp.last_eco2_ppm = Some(last);
            assert_eq!(score(&inp), expected, "last={last}");
        }
    }

    #[test]
    fn aqi_term_needs_both_values() {
        let mut inp = base();
        inp.last_aqi = None;
        assert_eq!(score(&inp), 85);
        inp.last_aqi = Some(5);
        // jump > 1 scores the small stability tier
        assert_eq!(score(&inp), 90);
    }

    #[test]
    fn fallback_source_loses_provenance_bonus() {
        let mut inp = base();
        inp.source = Source::Fallback;
        assert_eq!(score(&inp), 95);
    }

    #[test]
    fn worst_case_clamps_to_one() {
        let inp = ConfidenceInputs {
            ens_valid: false,
            warmup_done: false,
            temp_c: -40.0,
            rh: 120.0,
            eco2_ppm: 0,
            last_eco2_ppm: Some(5000),
            aqi: None,
            last_aqi: None,
            source: Source::Fallback,
        };
        assert_eq!(score(&inp), 1);
    }

    #[test]
    fn deterministic_for_identical_inputs() {
        let inp = base();
        assert_eq!(score(&inp), score(&inp));
    }
}

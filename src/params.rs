// Generation parameters.
//
// Two layers of knobs:
// - Tuning: the fixed performance setup (tempo, tuning root, picking
//   velocities, riff length tiers). Stable across a whole run.
// - RiffParams: the per-riff character roll (chaos, vocabulary size,
//   melody ceiling, category priorities). Randomized fresh for each
//   song section so consecutive riffs differ in feel.
//
// Both serialize, so a run's exact setup can be captured next to its
// MIDI output.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::RiffError;
use crate::scale;

/// Fixed performance setup shared by every riff in a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tuning {
    /// Beats per minute.
    pub tempo_bpm: u16,
    /// MIDI note of the open low string; degree 0 sounds here.
    pub root_note: u8,
    /// Length in beats of every palm-muted stroke (the sixteenth chug).
    /// At most 0.25, the stroke spacing within a figure.
    pub djent_len: f64,
    /// Velocity of a downstroke.
    pub down_velocity: u8,
    /// Velocity of an upstroke.
    pub up_velocity: u8,
    /// Velocity of sustained chords and melody notes.
    pub chord_velocity: u8,
    /// Shortest riff length in beats.
    pub riff_len_min: f64,
    /// Middle riff length in beats.
    pub riff_len_med: f64,
    /// Longest riff length in beats.
    pub riff_len_max: f64,
}

impl Default for Tuning {
    fn default() -> Self {
        // Drop-A seven-string: open low string at MIDI 33
        Tuning {
            tempo_bpm: 140,
            root_note: 33,
            djent_len: 0.25,
            down_velocity: 110,
            up_velocity: 90,
            chord_velocity: 120,
            riff_len_min: 4.0,
            riff_len_med: 8.0,
            riff_len_max: 16.0,
        }
    }
}

impl Tuning {
    /// Reject setups that cannot be rendered.
    pub fn validate(&self) -> Result<(), RiffError> {
        if self.tempo_bpm == 0 {
            return Err(RiffError::InvalidTuning("tempo must be positive".into()));
        }
        // Highest renderable pitch is root + 24 + the fifth above it
        if self.root_note > 96 {
            return Err(RiffError::InvalidTuning(format!(
                "root note {} leaves no room for the two-octave range plus harmony",
                self.root_note
            )));
        }
        for (name, v) in [
            ("down", self.down_velocity),
            ("up", self.up_velocity),
            ("chord", self.chord_velocity),
        ] {
            if v > 127 {
                return Err(RiffError::InvalidTuning(format!(
                    "{name} velocity {v} exceeds the MIDI range"
                )));
            }
        }
        if !self.djent_len.is_finite() || self.djent_len <= 0.0 {
            return Err(RiffError::InvalidTuning(
                "muted stroke length must be positive".into(),
            ));
        }
        // Picking figures place strokes a quarter beat apart
        if self.djent_len > 0.25 {
            return Err(RiffError::InvalidTuning(format!(
                "muted stroke length {} overlaps the next stroke slot (max 0.25)",
                self.djent_len
            )));
        }
        if !(self.riff_len_min > 0.0
            && self.riff_len_min <= self.riff_len_med
            && self.riff_len_med <= self.riff_len_max)
        {
            return Err(RiffError::InvalidTuning(
                "riff length tiers must satisfy 0 < min <= med <= max".into(),
            ));
        }
        for (name, len) in [
            ("min", self.riff_len_min),
            ("med", self.riff_len_med),
            ("max", self.riff_len_max),
        ] {
            // Generation works on a half-beat grid
            if (len * 2.0).fract() != 0.0 {
                return Err(RiffError::InvalidTuning(format!(
                    "riff length tier {name} ({len}) is not on the half-beat grid"
                )));
            }
        }
        Ok(())
    }
}

/// Per-riff character roll.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiffParams {
    /// Chaos intensity added to every transition cell.
    pub chaos: f64,
    /// Number of distinct chord roots to collect.
    pub vocab_size: usize,
    /// Highest scale degree the riff may touch.
    pub ceiling: u8,
    /// Priority weight of palm-muted figures.
    pub pm_weight: f64,
    /// Priority weight of sustained chords.
    pub chord_weight: f64,
    /// Priority weight of melody notes.
    pub melody_weight: f64,
    /// Priority weight of rests.
    pub rest_weight: f64,
}

impl RiffParams {
    /// Roll a fresh character for one riff.
    pub fn randomize(rng: &mut impl Rng) -> Self {
        let candidates = scale::ceiling_candidates();
        RiffParams {
            chaos: rng.random_range(0..2) as f64,
            vocab_size: rng.random_range(2..8),
            ceiling: candidates[rng.random_range(0..candidates.len())],
            pm_weight: rng.random_range(3..9) as f64,
            chord_weight: rng.random_range(3..9) as f64,
            melody_weight: rng.random_range(3..9) as f64,
            rest_weight: rng.random_range(0..4) as f64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_default_tuning_is_valid() {
        let tuning = Tuning::default();
        tuning.validate().unwrap();
        assert_eq!(tuning.tempo_bpm, 140);
        assert_eq!(tuning.root_note, 33);
        assert_eq!(tuning.down_velocity, 110);
    }

    #[test]
    fn test_randomize_stays_in_expected_ranges() {
        let mut rng = StdRng::seed_from_u64(99);
        for _ in 0..200 {
            let p = RiffParams::randomize(&mut rng);
            assert!(p.chaos == 0.0 || p.chaos == 1.0);
            assert!((2..=7).contains(&p.vocab_size));
            assert!(p.ceiling >= 12 && scale::in_scale(p.ceiling));
            assert!((3.0..=8.0).contains(&p.pm_weight));
            assert!((3.0..=8.0).contains(&p.chord_weight));
            assert!((3.0..=8.0).contains(&p.melody_weight));
            assert!((0.0..=3.0).contains(&p.rest_weight));
        }
    }

    #[test]
    fn test_tuning_rejects_out_of_range_velocity() {
        let tuning = Tuning {
            down_velocity: 200,
            ..Tuning::default()
        };
        assert!(matches!(
            tuning.validate(),
            Err(RiffError::InvalidTuning(_))
        ));
    }

    #[test]
    fn test_tuning_rejects_high_root() {
        let tuning = Tuning {
            root_note: 100,
            ..Tuning::default()
        };
        assert!(tuning.validate().is_err());
    }

    #[test]
    fn test_tuning_rejects_disordered_length_tiers() {
        let tuning = Tuning {
            riff_len_med: 2.0,
            ..Tuning::default()
        };
        assert!(tuning.validate().is_err());
    }

    #[test]
    fn test_tuning_rejects_off_grid_length_tier() {
        let tuning = Tuning {
            riff_len_min: 3.75,
            ..Tuning::default()
        };
        assert!(tuning.validate().is_err());
    }

    #[test]
    fn test_tuning_rejects_oversized_stroke_length() {
        // A half-beat stroke would outlast its slot in every figure
        let tuning = Tuning {
            djent_len: 0.5,
            ..Tuning::default()
        };
        assert!(matches!(
            tuning.validate(),
            Err(RiffError::InvalidTuning(_))
        ));
    }
}

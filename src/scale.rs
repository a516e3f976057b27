// Scale and harmony tables for drop-tuned riff generation.
//
// Every pitch in the system is a scale degree: a semitone offset above the
// tuning root that is a member of a fixed 21-entry, two-octave dark minor
// set (natural minor plus the phrygian second, the flat fifth, and the
// leading tone). Degrees are raw semitone counts, not indices, so degree 12
// is the octave and degree 24 the top of the range.
//
// This module provides:
// - The scale table and membership/position lookups
// - Harmony lookup: the in-key third or fifth above a degree
// - The candidate set for the melody ceiling
//
// Used by markov.rs for matrix dimensions, vocabulary.rs for ceiling
// filtering, and engine.rs for dyad construction.

use serde::{Deserialize, Serialize};

use crate::error::RiffError;

/// In-key semitone offsets above the tuning root, spanning two octaves.
pub const SCALE: [u8; 21] = [
    0, 1, 2, 3, 5, 6, 7, 8, 10, 11, 12, 13, 14, 15, 17, 18, 19, 20, 22, 23, 24,
];

/// In-key fifth above each scale degree, indexed by scale position.
/// The supertonic (degree 2 and its octave), whose literal fifth would
/// leave the key, carries a minor sixth instead.
const HARMONY_FIFTH: [u8; 21] = [
    7, 8, 10, 10, 12, 13, 14, 15, 17, 18, 19, 20, 22, 22, 24, 25, 26, 27, 29, 30, 31,
];

/// In-key third above each scale degree, indexed by scale position.
const HARMONY_THIRD: [u8; 21] = [
    3, 5, 5, 7, 8, 10, 10, 12, 14, 14, 15, 17, 17, 19, 20, 22, 22, 24, 26, 26, 27,
];

/// Which harmony note a dyad stacks on top of its root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HarmonyInterval {
    Third,
    Fifth,
}

/// Check if a semitone offset is a scale degree.
pub fn in_scale(degree: u8) -> bool {
    SCALE.contains(&degree)
}

/// Position of a degree within the scale table, or None if out of key.
pub fn scale_position(degree: u8) -> Option<usize> {
    SCALE.iter().position(|&d| d == degree)
}

/// The in-key harmony note above a degree. The result is a semitone
/// offset like the input but may exceed the top of the scale table
/// (the fifth above degree 24 is 31).
pub fn harmony(degree: u8, interval: HarmonyInterval) -> Result<u8, RiffError> {
    let pos = scale_position(degree).ok_or(RiffError::DegreeNotInScale { degree })?;
    Ok(match interval {
        HarmonyInterval::Third => HARMONY_THIRD[pos],
        HarmonyInterval::Fifth => HARMONY_FIFTH[pos],
    })
}

/// Scale degrees at or below a ceiling, in scale order.
pub fn degrees_within(ceiling: u8) -> Vec<u8> {
    SCALE.iter().copied().filter(|&d| d <= ceiling).collect()
}

/// Degrees a randomized melody ceiling is drawn from: the upper octave,
/// so restriction never cuts the range below one full octave.
pub fn ceiling_candidates() -> &'static [u8] {
    &SCALE[10..]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_membership() {
        assert!(in_scale(0));
        assert!(in_scale(12));
        assert!(in_scale(24));
        assert!(!in_scale(4)); // major third is out of key
        assert!(!in_scale(9)); // major sixth is out of key
        assert!(!in_scale(25));
    }

    #[test]
    fn test_scale_position() {
        assert_eq!(scale_position(0), Some(0));
        assert_eq!(scale_position(5), Some(4));
        assert_eq!(scale_position(24), Some(20));
        assert_eq!(scale_position(4), None);
    }

    #[test]
    fn test_harmony_fifths() {
        assert_eq!(harmony(0, HarmonyInterval::Fifth).unwrap(), 7);
        assert_eq!(harmony(5, HarmonyInterval::Fifth).unwrap(), 12);
        // Supertonic's fifth would leave the key; the table substitutes
        // a minor sixth there
        assert_eq!(harmony(2, HarmonyInterval::Fifth).unwrap(), 10);
        assert_eq!(harmony(14, HarmonyInterval::Fifth).unwrap(), 22);
        assert_eq!(harmony(24, HarmonyInterval::Fifth).unwrap(), 31);
    }

    #[test]
    fn test_harmony_thirds() {
        assert_eq!(harmony(0, HarmonyInterval::Third).unwrap(), 3);
        assert_eq!(harmony(2, HarmonyInterval::Third).unwrap(), 5);
        assert_eq!(harmony(24, HarmonyInterval::Third).unwrap(), 27);
    }

    #[test]
    fn test_harmony_rejects_out_of_scale() {
        assert!(matches!(
            harmony(4, HarmonyInterval::Fifth),
            Err(RiffError::DegreeNotInScale { degree: 4 })
        ));
    }

    #[test]
    fn test_degrees_within_ceiling() {
        let within = degrees_within(12);
        assert_eq!(within.len(), 11);
        assert_eq!(within[0], 0);
        assert_eq!(*within.last().unwrap(), 12);

        // Ceiling above the table keeps everything
        assert_eq!(degrees_within(24).len(), SCALE.len());
    }

    #[test]
    fn test_ceiling_candidates_span_upper_octave() {
        let candidates = ceiling_candidates();
        assert_eq!(candidates.len(), 11);
        assert!(candidates.iter().all(|&c| c >= 12 && in_scale(c)));
    }
}

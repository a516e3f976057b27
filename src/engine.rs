// The riff generating engine.
//
// A riff is generated by running a simulated clock from zero to the
// target length in beats. Every iteration first advances the chord
// progression one Markov step, snaps the clock to the half-beat grid,
// then picks one of four categories by a single weighted draw:
// - palm mute: a one-beat picking figure (gallop, reverse gallop,
//   up-down, or double down) on the chord root or the open tonic, or a
//   half-beat figure when the clock sits off the whole beat
// - chords: a sustained root+harmony dyad, occasionally played as one
//   or two muted stabs with the remainder left silent
// - melody: a single note stepped through the melody matrix
// - rest: half a beat or a beat of silence
//
// Category priorities come from RiffParams; whichever category played
// last has its priority multiplied by a stickiness factor, so the riff
// commits to a texture for a few beats instead of strobing between
// them. Zero total priority falls back to rest, so the clock always
// advances and the loop always terminates.
//
// Note lengths are shared state: a chord's drawn length becomes the
// starting note length for the next melody run.

use rand::Rng;

use crate::error::RiffError;
use crate::markov::TransitionMatrix;
use crate::params::{RiffParams, Tuning};
use crate::riff::{Event, EventKind, Riff};
use crate::scale::{self, HarmonyInterval};
use crate::vocabulary::ChordVocabulary;

/// Priority multiplier while palm muting.
pub const PM_STICKINESS: f64 = 2.0;
/// Priority multiplier while playing chords.
pub const CHORD_STICKINESS: f64 = 2.0;
/// Priority multiplier while playing melody notes.
pub const MELODY_STICKINESS: f64 = 4.0;

/// Odds a palm-mute figure chugs the current chord root instead of the
/// open tonic.
const PM_CHORD_ODDS: f64 = 0.5;
/// Odds knob for the chord branch rolls (length tiers, third instead of
/// fifth, muted stabs instead of a sustain).
const CHORD_VARIATION: f64 = 0.2;
/// Odds knob for the melody branch rolls (pull to the chord root,
/// double the note length; halving uses twice this).
const MELODY_VARIATION: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Category {
    PalmMute,
    Chords,
    Melody,
    Rest,
}

/// Mutable state threaded through one riff generation.
struct GenState {
    clock: f64,
    chord: u8,
    note: u8,
    note_len: f64,
    pm_sticky: f64,
    chord_sticky: f64,
    melody_sticky: f64,
}

impl GenState {
    fn new() -> Self {
        GenState {
            clock: 0.0,
            chord: 0,
            note: 0,
            note_len: 0.5,
            pm_sticky: 1.0,
            chord_sticky: 1.0,
            melody_sticky: 1.0,
        }
    }

    /// Boost the category just played, reset the others.
    fn stick_to(&mut self, category: Category) {
        self.pm_sticky = 1.0;
        self.chord_sticky = 1.0;
        self.melody_sticky = 1.0;
        match category {
            Category::PalmMute => self.pm_sticky = PM_STICKINESS,
            Category::Chords => self.chord_sticky = CHORD_STICKINESS,
            Category::Melody => self.melody_sticky = MELODY_STICKINESS,
            Category::Rest => {}
        }
    }
}

/// Draw a riff length from the three tuning tiers (one third odds each).
pub fn pick_riff_length(tuning: &Tuning, rng: &mut impl Rng) -> f64 {
    if rng.random::<f64>() < 1.0 / 3.0 {
        tuning.riff_len_min
    } else if rng.random::<f64>() < 0.5 {
        tuning.riff_len_med
    } else {
        tuning.riff_len_max
    }
}

/// Generate one riff of `length` beats. The length must sit on the
/// half-beat grid; a non-positive length yields an empty riff.
///
/// The melody matrix must cover the vocabulary's degrees (both are
/// normally built from the same ceiling).
pub fn generate_riff(
    tuning: &Tuning,
    params: &RiffParams,
    melody: &TransitionMatrix,
    vocab: &ChordVocabulary,
    length: f64,
    rng: &mut impl Rng,
) -> Result<Riff, RiffError> {
    tuning.validate()?;
    if length > 0.0 && (length * 2.0).fract() != 0.0 {
        return Err(RiffError::InvalidTuning(format!(
            "riff length {length} is not on the half-beat grid"
        )));
    }

    let mut events = Vec::new();
    let mut state = GenState::new();

    while state.clock < length {
        state.chord = vocab.matrix().step(state.chord, rng)?;
        state.clock = snap_to_grid(state.clock);

        let category = pick_category(params, &state, rng);
        match category {
            Category::PalmMute => emit_palm_mute(tuning, &mut state, &mut events, length, rng)?,
            Category::Chords => emit_chord(tuning, &mut state, &mut events, length, rng)?,
            Category::Melody => {
                emit_melody(tuning, &mut state, &mut events, length, melody, rng)?;
            }
            Category::Rest => emit_rest(&mut state, &mut events, length, rng),
        }
        state.stick_to(category);
    }

    log::debug!("generated {} events over {length} beats", events.len());
    Ok(Riff { length, events })
}

/// One weighted draw over the stickiness-scaled priorities.
fn pick_category(params: &RiffParams, state: &GenState, rng: &mut impl Rng) -> Category {
    let weights = [
        (Category::PalmMute, params.pm_weight * state.pm_sticky),
        (Category::Chords, params.chord_weight * state.chord_sticky),
        (Category::Melody, params.melody_weight * state.melody_sticky),
        (Category::Rest, params.rest_weight),
    ];
    let total: f64 = weights.iter().map(|(_, w)| w).sum();
    if total <= 0.0 {
        return Category::Rest;
    }
    let target = rng.random::<f64>() * total;
    let mut cumulative = 0.0;
    for (category, weight) in weights {
        cumulative += weight;
        if cumulative > target {
            return category;
        }
    }
    Category::Rest
}

fn emit_palm_mute(
    tuning: &Tuning,
    state: &mut GenState,
    events: &mut Vec<Event>,
    length: f64,
    rng: &mut impl Rng,
) -> Result<(), RiffError> {
    let degree = if rng.random_bool(PM_CHORD_ODDS) {
        state.chord
    } else {
        0
    };

    // After snapping the clock sits on the half grid, so fract is 0.0
    // or 0.5. A half-beat slot, or a final half beat no whole-beat
    // figure would fit in, gets a short figure to realign.
    if state.clock.fract() != 0.0 || length - state.clock < 1.0 {
        if rng.random_bool(0.5) {
            push_mute(events, tuning, state.clock, degree, None, tuning.down_velocity);
            push_mute(
                events,
                tuning,
                state.clock + 0.25,
                degree,
                None,
                tuning.up_velocity,
            );
        } else {
            // Dyad chugs always stack the fifth
            let harmony = scale::harmony(degree, HarmonyInterval::Fifth)?;
            push_mute(
                events,
                tuning,
                state.clock,
                degree,
                Some(harmony),
                tuning.down_velocity,
            );
        }
        state.clock += 0.5;
        return Ok(());
    }

    // Whole-beat figures: stroke offsets plus downstroke flags
    let strokes: &[(f64, bool)] = match rng.random_range(0..4) {
        0 => &[(0.0, true), (0.5, true), (0.75, false)], // gallop
        1 => &[(0.0, true), (0.25, false), (0.5, true)], // reverse gallop
        2 => &[(0.0, true), (0.25, false), (0.5, true), (0.75, false)], // up-down
        _ => &[(0.0, true), (0.5, true)],                // double down
    };
    for &(offset, down) in strokes {
        let velocity = if down {
            tuning.down_velocity
        } else {
            tuning.up_velocity
        };
        push_mute(events, tuning, state.clock + offset, degree, None, velocity);
    }
    state.clock += 1.0;
    Ok(())
}

fn emit_chord(
    tuning: &Tuning,
    state: &mut GenState,
    events: &mut Vec<Event>,
    length: f64,
    rng: &mut impl Rng,
) -> Result<(), RiffError> {
    state.note_len = if rng.random::<f64>() < CHORD_VARIATION {
        0.5
    } else if rng.random::<f64>() < CHORD_VARIATION {
        1.5
    } else if rng.random::<f64>() < CHORD_VARIATION / 2.0 {
        // long chords are rarer
        2.0
    } else {
        1.0
    };
    if state.note_len > length - state.clock {
        state.note_len = length - state.clock;
    }

    let interval = if rng.random::<f64>() < CHORD_VARIATION {
        HarmonyInterval::Third
    } else {
        HarmonyInterval::Fifth
    };
    let harmony = scale::harmony(state.chord, interval)?;

    if rng.random::<f64>() < CHORD_VARIATION {
        // Muted stabs instead of a sustain: at most two, half a beat
        // apart, with the rest of the slot left silent
        push_mute(
            events,
            tuning,
            state.clock,
            state.chord,
            Some(harmony),
            tuning.down_velocity,
        );
        let mut filled = 0.5;
        if state.note_len >= 1.0 {
            push_mute(
                events,
                tuning,
                state.clock + 0.5,
                state.chord,
                Some(harmony),
                tuning.down_velocity,
            );
            filled = 1.0;
        }
        let remainder = state.note_len - filled;
        if remainder > 0.0 {
            push_rest(events, state.clock + filled, remainder);
        }
    } else {
        events.push(Event {
            kind: EventKind::Chord,
            onset: state.clock,
            duration: state.note_len,
            degree: state.chord,
            harmony: Some(harmony),
            velocity: tuning.chord_velocity,
        });
    }
    state.clock += state.note_len;
    Ok(())
}

fn emit_melody(
    tuning: &Tuning,
    state: &mut GenState,
    events: &mut Vec<Event>,
    length: f64,
    melody: &TransitionMatrix,
    rng: &mut impl Rng,
) -> Result<(), RiffError> {
    if rng.random::<f64>() < MELODY_VARIATION {
        state.note = state.chord;
    }

    if rng.random::<f64>() < MELODY_VARIATION {
        state.note_len *= 2.0;
    } else if rng.random::<f64>() < MELODY_VARIATION * 2.0 {
        state.note_len /= 2.0;
    }
    state.note_len = clamp_note_len(state.note_len);
    if state.note_len > length - state.clock {
        state.note_len = length - state.clock;
    }

    state.note = melody.step(state.note, rng)?;
    events.push(Event {
        kind: EventKind::Note,
        onset: state.clock,
        duration: state.note_len,
        degree: state.note,
        harmony: None,
        velocity: tuning.chord_velocity,
    });
    state.clock += state.note_len;
    Ok(())
}

fn emit_rest(state: &mut GenState, events: &mut Vec<Event>, length: f64, rng: &mut impl Rng) {
    let mut len = if rng.random_bool(0.5) { 0.5 } else { 1.0 };
    if len > length - state.clock {
        len = length - state.clock;
    }
    push_rest(events, state.clock, len);
    state.clock += len;
}

fn push_mute(
    events: &mut Vec<Event>,
    tuning: &Tuning,
    onset: f64,
    degree: u8,
    harmony: Option<u8>,
    velocity: u8,
) {
    events.push(Event {
        kind: EventKind::Mute,
        onset,
        duration: tuning.djent_len,
        degree,
        harmony,
        velocity,
    });
}

fn push_rest(events: &mut Vec<Event>, onset: f64, duration: f64) {
    events.push(Event {
        kind: EventKind::Rest,
        onset,
        duration,
        degree: 0,
        harmony: None,
        velocity: 0,
    });
}

/// Keep note lengths sane: anything outside half a beat to two beats
/// resets to one beat.
fn clamp_note_len(len: f64) -> f64 {
    if len > 2.0 || len < 0.5 { 1.0 } else { len }
}

/// Floor the clock to the half-beat grid, correcting drift from clipped
/// durations.
fn snap_to_grid(clock: f64) -> f64 {
    (clock * 2.0).floor() / 2.0
}

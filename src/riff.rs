// Event-list representation of a riff.
//
// A riff is a flat, onset-ordered list of events on a half-beat grid.
// Four event kinds cover everything the generator can say: palm-muted
// strokes (fixed short length, picked down or up), sustained chords
// (root plus harmony dyad), single melody notes, and rests. Rests are
// real events so the list tiles the riff length exactly; output layers
// that do not render silence skip them.
//
// The riff is the source of truth. MIDI is derived from it and can be
// regenerated at any time.

use serde::{Deserialize, Serialize};

/// What an event sounds like.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    /// Palm-muted stroke.
    Mute,
    /// Sustained root plus harmony dyad.
    Chord,
    /// Single melody note.
    Note,
    /// Silence.
    Rest,
}

/// One entry in a riff. Degrees are scale degrees above the tuning
/// root; onset and duration are in beats from the riff start. Rests
/// carry degree 0 and velocity 0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub kind: EventKind,
    pub onset: f64,
    pub duration: f64,
    pub degree: u8,
    /// Harmony degree sounding above the root, for dyads.
    pub harmony: Option<u8>,
    pub velocity: u8,
}

/// A generated riff: the events plus the length they tile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Riff {
    /// Target length in beats.
    pub length: f64,
    /// Events ordered by onset.
    pub events: Vec<Event>,
}

impl Riff {
    /// Where the last event stops sounding, in beats.
    pub fn end_time(&self) -> f64 {
        self.events
            .iter()
            .map(|e| e.onset + e.duration)
            .fold(0.0, f64::max)
    }

    pub fn stats(&self) -> RiffStats {
        let mut stats = RiffStats {
            length: self.length,
            mutes: 0,
            chords: 0,
            notes: 0,
            rests: 0,
        };
        for event in &self.events {
            match event.kind {
                EventKind::Mute => stats.mutes += 1,
                EventKind::Chord => stats.chords += 1,
                EventKind::Note => stats.notes += 1,
                EventKind::Rest => stats.rests += 1,
            }
        }
        stats
    }

    /// Human-readable dump: one header line, then one line per event.
    pub fn summary(&self) -> String {
        let stats = self.stats();
        let mut out = format!(
            "riff over {} beats: {} mutes, {} chords, {} notes, {} rests\n",
            self.length, stats.mutes, stats.chords, stats.notes, stats.rests
        );
        for event in &self.events {
            let kind = match event.kind {
                EventKind::Mute => "mute",
                EventKind::Chord => "chord",
                EventKind::Note => "note",
                EventKind::Rest => "rest",
            };
            let harmony = match event.harmony {
                Some(h) => format!("+{h}"),
                None => String::new(),
            };
            out.push_str(&format!(
                "  {:>5.2} {kind:<5} d{}{harmony} v{} ({})\n",
                event.onset, event.degree, event.velocity, event.duration
            ));
        }
        out
    }
}

/// Event counts for one riff.
#[derive(Debug)]
pub struct RiffStats {
    pub length: f64,
    pub mutes: usize,
    pub chords: usize,
    pub notes: usize,
    pub rests: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_riff() -> Riff {
        Riff {
            length: 4.0,
            events: vec![
                Event {
                    kind: EventKind::Mute,
                    onset: 0.0,
                    duration: 0.25,
                    degree: 0,
                    harmony: None,
                    velocity: 110,
                },
                Event {
                    kind: EventKind::Chord,
                    onset: 1.0,
                    duration: 2.0,
                    degree: 3,
                    harmony: Some(10),
                    velocity: 120,
                },
                Event {
                    kind: EventKind::Rest,
                    onset: 3.0,
                    duration: 1.0,
                    degree: 0,
                    harmony: None,
                    velocity: 0,
                },
            ],
        }
    }

    #[test]
    fn test_stats_counts_kinds() {
        let stats = sample_riff().stats();
        assert_eq!(stats.mutes, 1);
        assert_eq!(stats.chords, 1);
        assert_eq!(stats.notes, 0);
        assert_eq!(stats.rests, 1);
    }

    #[test]
    fn test_end_time_is_last_event_end() {
        assert_eq!(sample_riff().end_time(), 4.0);
    }

    #[test]
    fn test_summary_lists_every_event() {
        let summary = sample_riff().summary();
        assert!(summary.starts_with("riff over 4 beats"));
        assert_eq!(summary.lines().count(), 4);
        assert!(summary.contains("d3+10"));
    }
}

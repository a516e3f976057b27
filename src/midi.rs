// MIDI output from riffs.
//
// Converts a Riff into a Standard MIDI File (SMF) for playback in a DAW.
// Two tracks: track 0 carries the tempo plus sustained chords and melody
// notes, track 1 carries the palm-muted strokes, each stroke annotated
// with a "PM" text meta so notation software can mark the chugs. Rests
// are skipped; silence needs no MIDI.
//
// Uses the `midly` crate for MIDI writing. Output is SMF Format 1
// (multi-track).

use midly::{
    Format, Header, MetaMessage, MidiMessage, Smf, Timing, Track, TrackEvent, TrackEventKind,
    num::{u4, u7, u15, u24, u28},
};
use std::path::Path;

use crate::error::RiffError;
use crate::params::Tuning;
use crate::riff::{Event, EventKind, Riff};

/// Ticks per quarter note in MIDI output.
const TICKS_PER_QUARTER: u16 = 480;

/// Distortion guitar in the General MIDI instrument set.
const PROGRAM_DISTORTION_GUITAR: u8 = 30;

// Same-tick ordering: close sounding notes before annotating and
// opening new ones.
const RANK_NOTE_OFF: u8 = 0;
const RANK_TEXT: u8 = 1;
const RANK_NOTE_ON: u8 = 2;

/// Convert a riff to MIDI and write it to a file.
pub fn write_midi(riff: &Riff, tuning: &Tuning, path: &Path) -> Result<(), RiffError> {
    tuning.validate()?;
    let smf = riff_to_smf(riff, tuning);
    let mut buf = Vec::new();
    smf.write_std(&mut buf)?;
    std::fs::write(path, &buf)?;
    log::debug!("wrote {} bytes to {}", buf.len(), path.display());
    Ok(())
}

/// Convert a riff to an in-memory SMF.
fn riff_to_smf(riff: &Riff, tuning: &Tuning) -> Smf<'static> {
    let mut smf = Smf::new(Header::new(
        Format::Parallel,
        Timing::Metrical(u15::new(TICKS_PER_QUARTER)),
    ));

    let mut lead: Vec<Timed> = Vec::new();
    let mut palm: Vec<Timed> = Vec::new();

    let tempo_microseconds = 60_000_000 / tuning.tempo_bpm as u32;
    lead.push(Timed {
        tick: 0,
        rank: RANK_TEXT,
        kind: TrackEventKind::Meta(MetaMessage::Tempo(u24::new(tempo_microseconds))),
    });

    for event in &riff.events {
        match event.kind {
            EventKind::Rest => {}
            EventKind::Chord | EventKind::Note => push_note(&mut lead, tuning, event, false),
            EventKind::Mute => push_note(&mut palm, tuning, event, true),
        }
    }

    smf.tracks.push(finish_track(b"Lead", lead));
    smf.tracks.push(finish_track(b"Palm Mute", palm));
    smf
}

/// A track event at an absolute tick, before delta encoding.
struct Timed {
    tick: u32,
    rank: u8,
    kind: TrackEventKind<'static>,
}

/// Append the NoteOn/NoteOff pair(s) for one event, plus the "PM"
/// annotation for muted strokes.
fn push_note(track: &mut Vec<Timed>, tuning: &Tuning, event: &Event, muted: bool) {
    let on = ticks(event.onset);
    let off = ticks(event.onset + event.duration);
    if muted {
        track.push(Timed {
            tick: on,
            rank: RANK_TEXT,
            kind: TrackEventKind::Meta(MetaMessage::Text(b"PM")),
        });
    }

    let mut pitches = vec![tuning.root_note + event.degree];
    if let Some(harmony) = event.harmony {
        pitches.push(tuning.root_note + harmony);
    }
    for pitch in pitches {
        track.push(Timed {
            tick: on,
            rank: RANK_NOTE_ON,
            kind: TrackEventKind::Midi {
                channel: u4::new(0),
                message: MidiMessage::NoteOn {
                    key: u7::new(pitch),
                    vel: u7::new(event.velocity),
                },
            },
        });
        track.push(Timed {
            tick: off,
            rank: RANK_NOTE_OFF,
            kind: TrackEventKind::Midi {
                channel: u4::new(0),
                message: MidiMessage::NoteOff {
                    key: u7::new(pitch),
                    vel: u7::new(0),
                },
            },
        });
    }
}

/// Sort by absolute tick, convert to delta times, and close the track.
fn finish_track(name: &'static [u8], mut timed: Vec<Timed>) -> Track<'static> {
    timed.sort_by_key(|t| (t.tick, t.rank));

    let mut track: Track<'static> = Vec::new();
    track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::TrackName(name)),
    });
    track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Midi {
            channel: u4::new(0),
            message: MidiMessage::ProgramChange {
                program: u7::new(PROGRAM_DISTORTION_GUITAR),
            },
        },
    });

    let mut last_tick: u32 = 0;
    for t in timed {
        track.push(TrackEvent {
            delta: u28::new(t.tick - last_tick),
            kind: t.kind,
        });
        last_tick = t.tick;
    }

    track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    });
    track
}

/// Beats to MIDI ticks.
fn ticks(beats: f64) -> u32 {
    (beats * TICKS_PER_QUARTER as f64).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::riff::EventKind;

    fn event(kind: EventKind, onset: f64, duration: f64, harmony: Option<u8>) -> Event {
        Event {
            kind,
            onset,
            duration,
            degree: 3,
            harmony,
            velocity: 110,
        }
    }

    fn note_ons(track: &Track) -> usize {
        track
            .iter()
            .filter(|e| {
                matches!(
                    e.kind,
                    TrackEventKind::Midi {
                        message: MidiMessage::NoteOn { .. },
                        ..
                    }
                )
            })
            .count()
    }

    #[test]
    fn test_riff_to_smf_two_tracks() {
        let riff = Riff {
            length: 4.0,
            events: vec![
                event(EventKind::Mute, 0.0, 0.25, None),
                event(EventKind::Mute, 0.5, 0.25, Some(10)),
                event(EventKind::Chord, 1.0, 2.0, Some(10)),
                event(EventKind::Rest, 3.0, 0.5, None),
                event(EventKind::Note, 3.5, 0.5, None),
            ],
        };
        let smf = riff_to_smf(&riff, &Tuning::default());

        assert_eq!(smf.header.format, Format::Parallel);
        assert_eq!(smf.tracks.len(), 2);
        // Lead: chord dyad (2) + melody note (1); palm: plain stroke
        // (1) + dyad stab (2). The rest contributes nothing.
        assert_eq!(note_ons(&smf.tracks[0]), 3);
        assert_eq!(note_ons(&smf.tracks[1]), 3);
    }

    #[test]
    fn test_mute_strokes_are_annotated() {
        let riff = Riff {
            length: 1.0,
            events: vec![
                event(EventKind::Mute, 0.0, 0.25, None),
                event(EventKind::Mute, 0.5, 0.25, None),
            ],
        };
        let smf = riff_to_smf(&riff, &Tuning::default());

        let texts = smf.tracks[1]
            .iter()
            .filter(|e| matches!(e.kind, TrackEventKind::Meta(MetaMessage::Text(b"PM"))))
            .count();
        assert_eq!(texts, 2);
    }

    #[test]
    fn test_rest_only_riff_has_no_notes() {
        let riff = Riff {
            length: 2.0,
            events: vec![event(EventKind::Rest, 0.0, 2.0, None)],
        };
        let smf = riff_to_smf(&riff, &Tuning::default());
        assert_eq!(note_ons(&smf.tracks[0]), 0);
        assert_eq!(note_ons(&smf.tracks[1]), 0);
    }

    #[test]
    fn test_note_durations_become_ticks() {
        let riff = Riff {
            length: 2.0,
            events: vec![event(EventKind::Note, 0.5, 1.0, None)],
        };
        let smf = riff_to_smf(&riff, &Tuning::default());

        // Deltas across the lead track recover onset and duration
        let mut on_tick = None;
        let mut off_tick = None;
        let mut tick: u32 = 0;
        for e in &smf.tracks[0] {
            tick += e.delta.as_int();
            match e.kind {
                TrackEventKind::Midi {
                    message: MidiMessage::NoteOn { .. },
                    ..
                } => on_tick = Some(tick),
                TrackEventKind::Midi {
                    message: MidiMessage::NoteOff { .. },
                    ..
                } => off_tick = Some(tick),
                _ => {}
            }
        }
        assert_eq!(on_tick, Some(240));
        assert_eq!(off_tick, Some(720));
    }

    #[test]
    fn test_write_midi_produces_smf_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("riff.mid");
        let riff = Riff {
            length: 1.0,
            events: vec![event(EventKind::Note, 0.0, 1.0, None)],
        };
        write_midi(&riff, &Tuning::default(), &path).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[..4], b"MThd");
    }
}

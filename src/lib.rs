// Riffgen
//
// A Markov-chain metal riff generator tuned for downtempo seven-string
// chugging. Riffs are assembled on a half-beat grid from four kinds of
// material: palm-muted chug figures, sustained or stabbed power chords,
// single-note melody lines, and rests. Two first-order Markov chains
// drive the pitch choices, one for chord roots and one for melody, both
// restricted to a natural-minor scale and warped by a per-riff chaos
// amount. A random walk over the chord chain picks the handful of roots
// each riff is allowed to sit on, which keeps even chaotic riffs
// anchored to a recognizable tonal center.
//
// Architecture:
// - scale.rs: The two-octave minor scale, harmony lookup for power chords
// - markov.rs: Weight tables and row-normalized transition matrices
// - vocabulary.rs: Chord-root selection via a random walk over the chord chain
// - params.rs: Instrument tuning knobs and per-riff generation parameters
// - riff.rs: Event and riff data model plus a readable summary form
// - engine.rs: The clocked generation loop that walks a riff to length
// - midi.rs: Two-track MIDI rendering (lead + palm-mute chugs)
// - song.rs: Batch rendering of sections and parts into .mid files
// - error.rs: Error type shared across the crate
//
// Generation is deterministic given a seed, supporting reproducible output.

pub mod engine;
pub mod error;
pub mod markov;
pub mod midi;
pub mod params;
pub mod riff;
pub mod scale;
pub mod song;
pub mod vocabulary;

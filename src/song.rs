// Batch rendering of riffs into MIDI files.
//
// A run is organized as repeats of song sections: each repeat rolls one
// set of riff parameters, builds the matrices, collects a chord
// vocabulary, and draws one riff length, then generates several parts
// with those shared attributes. Parts of one section lean on the same
// roots and length, so two or three of them chain into AAB/ABAC song
// structures; separate repeats sound unrelated.
//
// Output files are self-describing: bar count and chord roots are baked
// into the name, with a timestamp for uniqueness.

use rand::Rng;
use std::path::PathBuf;

use crate::engine::{generate_riff, pick_riff_length};
use crate::error::RiffError;
use crate::markov::{TransitionMatrix, WeightTables};
use crate::midi::write_midi;
use crate::params::{RiffParams, Tuning};
use crate::vocabulary::ChordVocabulary;

/// Beats per bar in the output naming (riffs are counted in 4/4).
const BEATS_PER_BAR: f64 = 4.0;

/// How much to render and where.
#[derive(Debug, Clone)]
pub struct SongOptions {
    /// Independent sections, each with freshly rolled attributes.
    pub repeats: u32,
    /// Riffs per section, sharing that section's attributes.
    pub parts: u32,
    /// Directory the MIDI files land in.
    pub out_dir: PathBuf,
    /// Fixed per-riff parameters; None rolls fresh ones per section.
    pub params: Option<RiffParams>,
    /// Fixed riff length in beats; None draws from the tuning tiers.
    pub length: Option<f64>,
}

impl Default for SongOptions {
    fn default() -> Self {
        SongOptions {
            repeats: 5,
            parts: 3,
            out_dir: PathBuf::from("."),
            params: None,
            length: None,
        }
    }
}

/// Render every section and part, returning the written paths in order.
pub fn render_song(
    tuning: &Tuning,
    options: &SongOptions,
    tables: &WeightTables,
    rng: &mut impl Rng,
) -> Result<Vec<PathBuf>, RiffError> {
    tuning.validate()?;
    if matches!(options.length, Some(l) if !l.is_finite() || l <= 0.0 || (l * 2.0).fract() != 0.0)
    {
        return Err(RiffError::InvalidTuning(
            "riff length must be a positive half-beat multiple".into(),
        ));
    }
    std::fs::create_dir_all(&options.out_dir)?;

    let mut written = Vec::new();
    for section in 0..options.repeats {
        let params = match &options.params {
            Some(fixed) => fixed.clone(),
            None => RiffParams::randomize(rng),
        };
        let chord = TransitionMatrix::build(&tables.chord, params.ceiling, params.chaos)?;
        let melody = TransitionMatrix::build(&tables.melody, params.ceiling, params.chaos)?;
        let vocab = ChordVocabulary::select(&chord, params.vocab_size, rng)?;
        let length = match options.length {
            Some(fixed) => fixed,
            None => pick_riff_length(tuning, rng),
        };
        log::info!(
            "section {}/{}: {length} beats, roots {:?}, chaos {}",
            section + 1,
            options.repeats,
            vocab.degrees(),
            params.chaos
        );

        for _ in 0..options.parts {
            let riff = generate_riff(tuning, &params, &melody, &vocab, length, rng)?;
            let path = options.out_dir.join(riff_filename(length, vocab.degrees()));
            write_midi(&riff, tuning, &path)?;
            log::info!("wrote {}", path.display());
            written.push(path);
        }
    }
    Ok(written)
}

/// File name carrying bar count, chord roots, and a microsecond
/// timestamp: `b2_0_3_10_20250817_143012.345678.mid`.
pub fn riff_filename(length: f64, degrees: &[u8]) -> String {
    let bars = (length / BEATS_PER_BAR) as u32;
    let roots = degrees
        .iter()
        .map(|d| d.to_string())
        .collect::<Vec<_>>()
        .join("_");
    let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S%.6f");
    format!("b{bars}_{roots}_{stamp}.mid")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    // Fixed-width tail: date (15) + fractional seconds (7) + ".mid" (4)
    const NAME_TAIL_LEN: usize = 26;

    #[test]
    fn test_riff_filename_shape() {
        let name = riff_filename(8.0, &[0, 3, 10]);
        assert!(name.starts_with("b2_0_3_10_"));
        assert!(name.ends_with(".mid"));
        assert_eq!(name.len(), "b2_0_3_10_".len() + NAME_TAIL_LEN);
    }

    #[test]
    fn test_render_song_writes_every_part() {
        let dir = tempfile::tempdir().unwrap();
        let options = SongOptions {
            repeats: 2,
            parts: 3,
            out_dir: dir.path().to_path_buf(),
            ..SongOptions::default()
        };
        let mut rng = StdRng::seed_from_u64(5);
        let written = render_song(
            &Tuning::default(),
            &options,
            &WeightTables::default_tables(),
            &mut rng,
        )
        .unwrap();

        assert_eq!(written.len(), 6);
        for path in &written {
            assert!(path.exists());
        }
        let bytes = std::fs::read(&written[0]).unwrap();
        assert_eq!(&bytes[..4], b"MThd");
    }

    #[test]
    fn test_parts_of_a_section_share_roots_and_length() {
        let dir = tempfile::tempdir().unwrap();
        let options = SongOptions {
            repeats: 2,
            parts: 3,
            out_dir: dir.path().to_path_buf(),
            length: Some(8.0),
            ..SongOptions::default()
        };
        let mut rng = StdRng::seed_from_u64(12);
        let written = render_song(
            &Tuning::default(),
            &options,
            &WeightTables::default_tables(),
            &mut rng,
        )
        .unwrap();

        for section in written.chunks(3) {
            let prefixes: Vec<&str> = section
                .iter()
                .map(|p| {
                    let name = p.file_name().unwrap().to_str().unwrap();
                    &name[..name.len() - NAME_TAIL_LEN]
                })
                .collect();
            assert_eq!(prefixes[0], prefixes[1]);
            assert_eq!(prefixes[1], prefixes[2]);
        }
    }

    #[test]
    fn test_rejects_non_positive_length() {
        let dir = tempfile::tempdir().unwrap();
        let options = SongOptions {
            repeats: 1,
            parts: 1,
            out_dir: dir.path().to_path_buf(),
            length: Some(0.0),
            ..SongOptions::default()
        };
        let mut rng = StdRng::seed_from_u64(1);
        assert!(matches!(
            render_song(
                &Tuning::default(),
                &options,
                &WeightTables::default_tables(),
                &mut rng,
            ),
            Err(RiffError::InvalidTuning(_))
        ));
    }
}

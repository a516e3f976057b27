// Chord vocabulary selection.
//
// A riff does not use the whole scale for its power chords. Before
// generation an open random walk over the chord matrix, starting on the
// tonic, collects a small set of distinct root degrees. The chord matrix
// restricted to that set (rows renormalized) is what the generator
// actually steps through, so progressions can only touch roots the walk
// discovered.
//
// The walk itself moves on every draw; a draw that lands on an already
// collected degree changes the walk position without growing the set.

use rand::Rng;

use crate::error::RiffError;
use crate::markov::TransitionMatrix;

/// Draw budget for the collection walk. A table whose tonic component is
/// smaller than the requested size would otherwise never terminate.
const MAX_WALK_DRAWS: u32 = 10_000;

/// The root degrees a riff's chords are drawn from, with the chord
/// matrix restricted to exactly those degrees.
#[derive(Debug, Clone)]
pub struct ChordVocabulary {
    degrees: Vec<u8>,
    matrix: TransitionMatrix,
}

impl ChordVocabulary {
    /// Collect `size` distinct chord roots by walking `chord_matrix`
    /// from the tonic, then restrict the matrix to the collected set.
    pub fn select(
        chord_matrix: &TransitionMatrix,
        size: usize,
        rng: &mut impl Rng,
    ) -> Result<Self, RiffError> {
        if size == 0 {
            return Err(RiffError::EmptyVocabulary);
        }
        let available = chord_matrix.degrees().len();
        if size > available {
            let ceiling = chord_matrix.degrees().last().copied().unwrap_or(0);
            return Err(RiffError::VocabularyUnreachable {
                requested: size,
                available,
                ceiling,
            });
        }

        let mut degrees = vec![0u8];
        let mut current = 0u8;
        let mut draws = 0u32;
        while degrees.len() < size {
            if draws >= MAX_WALK_DRAWS {
                return Err(RiffError::VocabularyWalkStalled {
                    draws,
                    found: degrees.len(),
                    wanted: size,
                });
            }
            draws += 1;
            current = chord_matrix.step(current, rng)?;
            if !degrees.contains(&current) {
                degrees.push(current);
            }
        }

        let matrix = chord_matrix.restrict(&degrees)?;
        log::debug!("chord vocabulary {degrees:?} after {draws} draws");
        Ok(ChordVocabulary { degrees, matrix })
    }

    /// Collected roots in discovery order; the tonic is always first.
    pub fn degrees(&self) -> &[u8] {
        &self.degrees
    }

    /// The restricted, renormalized chord matrix.
    pub fn matrix(&self) -> &TransitionMatrix {
        &self.matrix
    }
}

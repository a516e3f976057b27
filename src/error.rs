// Error types for riff generation.
//
// Library code returns RiffError; the CLI wraps it in anyhow for context.
// Most variants are configuration mistakes (a degree outside the scale, a
// vocabulary request the ceiling cannot satisfy) surfaced before any
// events are generated.

use thiserror::Error;

/// Errors that can occur while building matrices, selecting a chord
/// vocabulary, or writing output files.
#[derive(Debug, Error)]
pub enum RiffError {
    #[error("degree {degree} is not in the scale")]
    DegreeNotInScale { degree: u8 },
    #[error("degree {degree} has no row in the transition matrix")]
    DegreeNotInMatrix { degree: u8 },
    #[error("weight table has no row for degree {degree}")]
    MissingWeightRow { degree: u8 },
    #[error("transition row for degree {degree} sums to zero")]
    ZeroSumRow { degree: u8 },
    #[error("weight {weight} from degree {from} to degree {to} is not a finite non-negative number")]
    InvalidWeight { from: u8, to: u8, weight: f64 },
    #[error("chaos intensity {value} is not a finite non-negative number")]
    InvalidChaos { value: f64 },
    #[error("chord vocabulary is empty")]
    EmptyVocabulary,
    #[error(
        "requested {requested} chord degrees but only {available} scale degrees lie at or below ceiling {ceiling}"
    )]
    VocabularyUnreachable {
        requested: usize,
        available: usize,
        ceiling: u8,
    },
    #[error("chord walk stalled after {draws} draws with {found} of {wanted} degrees collected")]
    VocabularyWalkStalled {
        draws: u32,
        found: usize,
        wanted: usize,
    },
    #[error("invalid tuning: {0}")]
    InvalidTuning(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("weight table parse failed: {0}")]
    Json(#[from] serde_json::Error),
}

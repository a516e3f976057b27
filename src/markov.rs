// Transition weight tables and row-stochastic matrices.
//
// Pitch movement is first-order Markov: a weight table maps each scale
// degree to the degrees it can move to, and a TransitionMatrix is that
// table restricted to a melody ceiling, flattened by a chaos intensity,
// and row-normalized. Two stock tables ship with the generator:
// - chord: heavy diagonal, so progressions dwell on a root for a while
//   before moving
// - melody: no dwell tier, wider reach per degree
//
// Tables are plain degree-keyed maps so an alternate tuning can be loaded
// from JSON. Absent cells carry zero weight until chaos raises them.
//
// Used by vocabulary.rs for the chord walk and engine.rs for per-event
// pitch movement.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::RiffError;
use crate::scale;

/// Weight for staying on the current degree (chord table diagonal).
pub const W_STAY: f64 = 100.0;
/// Weight for a strongly favored move.
pub const W_HIGH: f64 = 20.0;
/// Weight for an occasional move.
pub const W_MID: f64 = 5.0;

/// One table row: to-degree -> weight. Absent degrees are zero.
pub type WeightRow = BTreeMap<u8, f64>;

/// The two stock transition tables, from-degree keyed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightTables {
    /// Chord-root movement weights.
    pub chord: BTreeMap<u8, WeightRow>,
    /// Melody-note movement weights.
    pub melody: BTreeMap<u8, WeightRow>,
}

impl WeightTables {
    /// Load an alternate set of tables from a JSON file. The file must
    /// carry the same shape as the stock tables: a row for all 21 scale
    /// degrees in each table, scale degrees only, finite non-negative
    /// weights.
    pub fn load(path: &Path) -> Result<Self, RiffError> {
        let data = std::fs::read_to_string(path)?;
        let tables: WeightTables = serde_json::from_str(&data)?;
        tables.validate()?;
        log::info!("loaded weight tables from {}", path.display());
        Ok(tables)
    }

    /// The built-in tuning.
    pub fn default_tables() -> Self {
        WeightTables {
            chord: default_chord(),
            melody: default_melody(),
        }
    }

    /// Check both tables for full scale coverage with usable weights.
    pub fn validate(&self) -> Result<(), RiffError> {
        for table in [&self.chord, &self.melody] {
            for &degree in &scale::SCALE {
                if !table.contains_key(&degree) {
                    return Err(RiffError::MissingWeightRow { degree });
                }
            }
            for (&from, row) in table {
                if !scale::in_scale(from) {
                    return Err(RiffError::DegreeNotInScale { degree: from });
                }
                for (&to, &weight) in row {
                    if !scale::in_scale(to) {
                        return Err(RiffError::DegreeNotInScale { degree: to });
                    }
                    if !weight.is_finite() || weight < 0.0 {
                        return Err(RiffError::InvalidWeight { from, to, weight });
                    }
                }
            }
        }
        Ok(())
    }
}

/// Build one table row from per-tier target lists.
fn row(stay: &[u8], high: &[u8], mid: &[u8]) -> WeightRow {
    let mut r = WeightRow::new();
    for &d in stay {
        r.insert(d, W_STAY);
    }
    for &d in high {
        r.insert(d, W_HIGH);
    }
    for &d in mid {
        r.insert(d, W_MID);
    }
    r
}

/// Stock chord-root table. Every row keeps its own degree in the stay
/// tier; movement targets skew toward the tonic, the octave, and near
/// scale neighbours.
fn default_chord() -> BTreeMap<u8, WeightRow> {
    let mut t = BTreeMap::new();
    t.insert(0, row(&[0], &[], &[1, 3, 5, 6, 7, 8, 10, 11, 12]));
    t.insert(1, row(&[1], &[0], &[3]));
    t.insert(2, row(&[2], &[3], &[0]));
    t.insert(3, row(&[3], &[10], &[0, 1, 2, 7, 8]));
    t.insert(5, row(&[5], &[2, 10], &[0]));
    t.insert(6, row(&[6], &[0], &[1, 3, 7, 12]));
    t.insert(7, row(&[7], &[3], &[0, 8, 10]));
    t.insert(8, row(&[8], &[3, 7], &[0, 5, 10]));
    t.insert(10, row(&[10], &[0], &[3, 8]));
    t.insert(11, row(&[11], &[0, 12], &[]));
    t.insert(12, row(&[12], &[0, 8, 10], &[3]));
    t.insert(13, row(&[13], &[1, 12], &[0, 3, 15]));
    t.insert(14, row(&[14], &[2, 12], &[0, 3, 15]));
    t.insert(15, row(&[15], &[3, 12], &[0, 7, 8, 10, 13, 14, 19, 20, 22]));
    t.insert(17, row(&[17], &[5, 12], &[0, 10, 14, 22]));
    t.insert(18, row(&[18], &[6, 12], &[0, 7, 13, 15, 19, 24]));
    t.insert(19, row(&[19], &[7, 12], &[0, 8, 10, 15, 20, 22]));
    t.insert(20, row(&[20], &[8, 12], &[0, 10, 15, 17, 19, 22]));
    t.insert(22, row(&[22], &[10, 12], &[0, 15, 20]));
    t.insert(23, row(&[23], &[11, 12], &[0, 24]));
    t.insert(24, row(&[24], &[12], &[0, 15, 20, 22]));
    t
}

/// Stock melody table. The current degree sits in the high tier of its
/// own row, alongside its octave partner and in-key chord tones, so
/// lines circle a degree without being pinned to it.
fn default_melody() -> BTreeMap<u8, WeightRow> {
    let mut t = BTreeMap::new();
    t.insert(0, row(&[], &[0, 3, 7, 12], &[1, 5, 6, 8, 10, 11]));
    t.insert(1, row(&[], &[0, 1, 5, 8, 12, 13], &[3, 6]));
    t.insert(2, row(&[], &[2, 3, 5, 10, 12, 14], &[0, 1, 6, 13]));
    t.insert(3, row(&[], &[3, 7, 10, 12, 15], &[0, 1, 2, 6, 8, 13]));
    t.insert(5, row(&[], &[2, 5, 7, 11, 12, 17], &[0, 1, 6, 10, 13]));
    t.insert(6, row(&[], &[0, 6, 12, 13, 18], &[1, 3, 7]));
    t.insert(7, row(&[], &[3, 7, 12, 14, 19], &[0, 1, 6, 8, 10, 13, 18]));
    t.insert(8, row(&[], &[3, 7, 8, 12, 15, 20], &[0, 1, 5, 6, 10, 13, 18]));
    t.insert(10, row(&[], &[0, 5, 10, 12, 14, 17, 22], &[1, 3, 6, 8, 15, 18, 19]));
    t.insert(11, row(&[], &[0, 6, 11, 12, 14, 18, 23], &[1, 13]));
    t.insert(12, row(&[], &[0, 3, 7, 12, 15, 19, 24], &[1, 5, 6, 8, 10, 13, 17, 18]));
    t.insert(13, row(&[], &[0, 1, 5, 8, 12, 13, 17], &[3, 6, 15, 18]));
    t.insert(14, row(&[], &[2, 3, 5, 10, 12, 14, 15, 17], &[0, 6, 13, 18]));
    t.insert(15, row(&[], &[3, 7, 10, 12, 15, 19], &[0, 6, 8, 13, 14, 18, 20, 22]));
    t.insert(17, row(&[], &[5, 7, 12, 14, 17, 19], &[0, 2, 6, 10, 13, 18, 22]));
    t.insert(18, row(&[], &[6, 12, 18], &[0, 7, 13, 15, 19, 24]));
    t.insert(19, row(&[], &[7, 12, 15, 19], &[0, 3, 8, 10, 13, 18, 20, 22]));
    t.insert(20, row(&[], &[8, 12, 15, 19, 20], &[0, 3, 7, 10, 13, 17, 18, 22]));
    t.insert(22, row(&[], &[10, 12, 17, 22], &[0, 5, 13, 15, 18, 20]));
    t.insert(23, row(&[], &[11, 12, 18, 23], &[0, 6, 13, 24]));
    t.insert(24, row(&[], &[12, 15, 19, 24], &[0, 3, 7, 13, 18, 20, 22]));
    t
}

/// A weight table restricted to a ceiling, chaos-flattened, and
/// row-normalized. Rows and columns share one degree ordering.
#[derive(Debug, Clone)]
pub struct TransitionMatrix {
    degrees: Vec<u8>,
    rows: Vec<Vec<f64>>,
}

impl TransitionMatrix {
    /// Build a matrix over the scale degrees at or below `ceiling`.
    /// Chaos is added to every cell before normalization, so a positive
    /// intensity makes every in-range move possible. Every in-range
    /// degree must have a table row; absent cells within a row are zero,
    /// but an entry that is present must be finite and non-negative.
    pub fn build(
        table: &BTreeMap<u8, WeightRow>,
        ceiling: u8,
        chaos: f64,
    ) -> Result<Self, RiffError> {
        if !chaos.is_finite() || chaos < 0.0 {
            return Err(RiffError::InvalidChaos { value: chaos });
        }
        let degrees = scale::degrees_within(ceiling);
        let mut rows = Vec::with_capacity(degrees.len());
        for &from in &degrees {
            let weights = table
                .get(&from)
                .ok_or(RiffError::MissingWeightRow { degree: from })?;
            let mut raw = Vec::with_capacity(degrees.len());
            for &to in &degrees {
                let w = weights.get(&to).copied().unwrap_or(0.0);
                if !w.is_finite() || w < 0.0 {
                    return Err(RiffError::InvalidWeight { from, to, weight: w });
                }
                raw.push(w + chaos);
            }
            rows.push(normalize(raw, from)?);
        }
        Ok(TransitionMatrix { degrees, rows })
    }

    /// Restrict to a subset of degrees, renormalizing each surviving row.
    /// `keep` must be distinct degrees already covered by this matrix.
    pub fn restrict(&self, keep: &[u8]) -> Result<Self, RiffError> {
        if keep.is_empty() {
            return Err(RiffError::EmptyVocabulary);
        }
        let mut indices = Vec::with_capacity(keep.len());
        for &degree in keep {
            let i = self
                .degrees
                .iter()
                .position(|&d| d == degree)
                .ok_or(RiffError::DegreeNotInMatrix { degree })?;
            indices.push(i);
        }
        let mut rows = Vec::with_capacity(keep.len());
        for (&from, &i) in keep.iter().zip(&indices) {
            let raw: Vec<f64> = indices.iter().map(|&j| self.rows[i][j]).collect();
            rows.push(normalize(raw, from)?);
        }
        Ok(TransitionMatrix {
            degrees: keep.to_vec(),
            rows,
        })
    }

    /// Degrees covered by this matrix, in row order: ascending as built,
    /// selection order after a restrict.
    pub fn degrees(&self) -> &[u8] {
        &self.degrees
    }

    pub fn contains(&self, degree: u8) -> bool {
        self.degrees.contains(&degree)
    }

    /// One Markov step: sample the next degree from `from`'s row.
    pub fn step(&self, from: u8, rng: &mut impl Rng) -> Result<u8, RiffError> {
        let i = self
            .degrees
            .iter()
            .position(|&d| d == from)
            .ok_or(RiffError::DegreeNotInMatrix { degree: from })?;
        let probs = &self.rows[i];
        let total: f64 = probs.iter().sum();
        let target = rng.random::<f64>() * total;
        let mut cumulative = 0.0;
        for (&degree, &p) in self.degrees.iter().zip(probs) {
            cumulative += p;
            if cumulative > target {
                return Ok(degree);
            }
        }
        // Rounding can leave the scan short of the target; take the last degree.
        Ok(self.degrees.last().copied().unwrap_or(from))
    }
}

/// Divide a raw row by its sum, rejecting rows with nothing to move to.
fn normalize(mut raw: Vec<f64>, degree: u8) -> Result<Vec<f64>, RiffError> {
    let total: f64 = raw.iter().sum();
    if total <= 0.0 {
        return Err(RiffError::ZeroSumRow { degree });
    }
    for w in &mut raw {
        *w /= total;
    }
    Ok(raw)
}

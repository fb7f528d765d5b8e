//! Nucleotide diversity (π).
//!
//! π is the mean, over all unordered pairs of sequences, of the proportion
//! of compared columns at which the two sequences differ (case-insensitive).
//!
//! Gap policy:
//! - `ignore_gaps = true`: a column is compared only when neither sequence
//!   has a gap there. A pair with no such column is left out of the mean.
//! - `ignore_gaps = false`: every column is compared and a gap is an ordinary
//!   character.

use crate::model::{Alignment, GAP};

/// Mismatch and comparable-column counts for one pair of sequences.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PairDistance {
    pub mismatches: usize,
    pub compared: usize,
}

impl PairDistance {
    /// Proportion of differing columns, or `None` when nothing was compared.
    pub fn proportion(&self) -> Option<f64> {
        (self.compared > 0).then(|| self.mismatches as f64 / self.compared as f64)
    }
}

/// Counts mismatches between two equal-length residue strings.
pub fn pair_distance(a: &[u8], b: &[u8], ignore_gaps: bool) -> PairDistance {
    debug_assert_eq!(a.len(), b.len());
    let mut mismatches = 0;
    let mut compared = 0;

    for (&x, &y) in a.iter().zip(b) {
        if ignore_gaps && (x == GAP || y == GAP) {
            continue;
        }
        compared += 1;
        if !x.eq_ignore_ascii_case(&y) {
            mismatches += 1;
        }
    }

    PairDistance {
        mismatches,
        compared,
    }
}

/// Computes π for an alignment.
///
/// Returns `None` with fewer than two sequences. Returns `Some(0.0)` when
/// there are at least two sequences but no pair has a comparable column.
pub fn nucleotide_diversity(alignment: &Alignment, ignore_gaps: bool) -> Option<f64> {
    let records = alignment.records();
    if records.len() < 2 {
        return None;
    }

    let mut total = 0.0;
    let mut included = 0usize;
    for (i, a) in records.iter().enumerate() {
        for b in &records[i + 1..] {
            if let Some(p) = pair_distance(a.as_bytes(), b.as_bytes(), ignore_gaps).proportion() {
                total += p;
                included += 1;
            }
        }
    }

    if included == 0 {
        return Some(0.0);
    }
    Some(total / included as f64)
}

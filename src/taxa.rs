//! Taxon-level utilities: header normalization, random sampling and subsetting.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use rand::seq::index;
use rand::Rng;
use thiserror::Error;

use crate::model::{Alignment, MalformedAlignment, Sequence};

#[derive(Error, Debug)]
pub enum TaxaError {
    #[error("Cannot sample {requested} taxa from an alignment of {available}")]
    SampleSize { requested: usize, available: usize },

    #[error("None of the requested taxa are present in the alignment")]
    EmptySelection,

    #[error("Invalid alignment after renaming: {0}")]
    Malformed(#[from] MalformedAlignment),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Header text before the first '-' or '_'.
///
/// Gene-specific suffixes such as `Homo_sapiens` -> `Homo` or
/// `sp12-gene3` -> `sp12` are stripped so that records from different genes
/// share one taxon id.
pub fn canonical_taxon_id(header: &str) -> &str {
    header
        .split(|c: char| c == '-' || c == '_')
        .next()
        .unwrap_or(header)
}

/// Rewrites every id with [`canonical_taxon_id`].
///
/// Fails with [`MalformedAlignment::DuplicateId`] when two records collapse
/// onto the same id.
pub fn normalize_headers(alignment: Alignment) -> Result<Alignment, TaxaError> {
    let sequences = alignment
        .into_records()
        .into_iter()
        .map(|seq| {
            let id = canonical_taxon_id(&seq.id).to_string();
            Sequence::from_bytes(id, seq.as_bytes().to_vec())
        })
        .collect();
    Ok(Alignment::new(sequences)?)
}

/// Draws `k` distinct taxon ids without replacement, returned in file order.
pub fn sample_taxa<R: Rng + ?Sized>(
    alignment: &Alignment,
    k: usize,
    rng: &mut R,
) -> Result<Vec<String>, TaxaError> {
    let available = alignment.sequence_count();
    if k == 0 || k > available {
        return Err(TaxaError::SampleSize {
            requested: k,
            available,
        });
    }

    let mut picked = index::sample(rng, available, k).into_vec();
    picked.sort_unstable();
    Ok(picked
        .into_iter()
        .filter_map(|i| alignment.get(i))
        .map(|seq| seq.id.clone())
        .collect())
}

/// Keeps only the records whose id is in `wanted`, in file order.
pub fn retain_taxa<S: AsRef<str>>(alignment: &Alignment, wanted: &[S]) -> Result<Alignment, TaxaError> {
    let wanted: HashSet<&str> = wanted.iter().map(|s| s.as_ref()).collect();
    let kept: Vec<Sequence> = alignment
        .records()
        .iter()
        .filter(|seq| wanted.contains(seq.id.as_str()))
        .cloned()
        .collect();
    if kept.is_empty() {
        return Err(TaxaError::EmptySelection);
    }
    Ok(Alignment::new(kept)?)
}

/// Reads one taxon id per line; blank lines are ignored and a leading '>' is dropped.
pub fn read_taxon_list<P: AsRef<Path>>(path: P) -> Result<Vec<String>, TaxaError> {
    let content = fs::read_to_string(path)?;
    Ok(content
        .lines()
        .map(|line| line.trim().trim_start_matches('>'))
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

//! Supermatrix concatenation.
//!
//! Merges single-gene alignments into one alignment restricted to the taxa
//! present in every gene. The taxon set is folded in as a running
//! intersection; fragments are appended in gene order and the output rows are
//! sorted by taxon id.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use log::{info, warn};
use thiserror::Error;

use crate::formats::fasta::{write_fasta_file, FastaError};
use crate::formats::{discover_alignments, load};
use crate::model::{Alignment, MalformedAlignment, Sequence};

/// Errors that abort a concatenation without writing anything.
#[derive(Error, Debug)]
pub enum ConcatError {
    #[error("Input folder '{0}' does not exist")]
    MissingInput(PathBuf),

    #[error("No alignment files could be loaded")]
    NoAlignments,

    #[error("No taxa are shared by all {alignments} alignments")]
    EmptyIntersection { alignments: usize },

    #[error("Invalid concatenated alignment: {0}")]
    Malformed(#[from] MalformedAlignment),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Could not write output: {0}")]
    Fasta(#[from] FastaError),
}

/// Folds alignments one at a time into a concatenated alignment.
#[derive(Debug, Default)]
pub struct Concatenator {
    common: Option<BTreeSet<String>>,
    fragments: BTreeMap<String, Vec<u8>>,
    genes: usize,
}

impl Concatenator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of alignments folded in so far.
    pub fn gene_count(&self) -> usize {
        self.genes
    }

    /// Narrows the taxon intersection to `alignment` and appends its
    /// fragments for the taxa that remain.
    pub fn add(&mut self, alignment: &Alignment) {
        let taxa: BTreeSet<String> = alignment.taxon_ids().map(str::to_string).collect();
        let common = match self.common.take() {
            None => taxa,
            Some(previous) => previous.intersection(&taxa).cloned().collect(),
        };

        self.fragments.retain(|taxon, _| common.contains(taxon));
        for seq in alignment.records() {
            if common.contains(&seq.id) {
                self.fragments
                    .entry(seq.id.clone())
                    .or_default()
                    .extend(seq.as_bytes().iter().map(u8::to_ascii_uppercase));
            }
        }

        self.common = Some(common);
        self.genes += 1;
    }

    /// Builds the concatenated alignment, one row per common taxon in sorted order.
    pub fn finish(self) -> Result<Alignment, ConcatError> {
        if self.fragments.is_empty() {
            return Err(ConcatError::EmptyIntersection {
                alignments: self.genes,
            });
        }
        let sequences = self
            .fragments
            .into_iter()
            .map(|(taxon, data)| Sequence::from_bytes(taxon, data))
            .collect();
        Ok(Alignment::new(sequences)?)
    }
}

/// Concatenates alignments in the given order.
pub fn concatenate<'a, I>(alignments: I) -> Result<Alignment, ConcatError>
where
    I: IntoIterator<Item = &'a Alignment>,
{
    let mut concatenator = Concatenator::new();
    for alignment in alignments {
        concatenator.add(alignment);
    }
    if concatenator.gene_count() == 0 {
        return Err(ConcatError::NoAlignments);
    }
    concatenator.finish()
}

/// Outcome of a corpus concatenation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConcatSummary {
    pub alignments: usize,
    pub skipped: usize,
    pub taxa: usize,
    pub length: usize,
}

/// Concatenates every alignment under `input_dir` into `output_file`.
///
/// Files are processed in sorted path order; malformed files are skipped with
/// a warning. Nothing is written unless at least one taxon is shared by all
/// loaded alignments.
pub fn concatenate_corpus(input_dir: &Path, output_file: &Path) -> Result<ConcatSummary, ConcatError> {
    if !input_dir.is_dir() {
        return Err(ConcatError::MissingInput(input_dir.to_path_buf()));
    }

    let mut concatenator = Concatenator::new();
    let mut skipped = 0;
    for path in discover_alignments(input_dir)? {
        match load(&path) {
            Ok(alignment) => concatenator.add(&alignment),
            Err(e) => {
                warn!("Skipping {}: {}", path.display(), e);
                skipped += 1;
            }
        }
    }

    let alignments = concatenator.gene_count();
    if alignments == 0 {
        return Err(ConcatError::NoAlignments);
    }
    info!("Found {} valid alignment files", alignments);

    let merged = concatenator.finish()?;
    info!("Common taxa: {}", merged.sequence_count());

    write_fasta_file(&merged, output_file)?;
    info!("Concatenated alignment written to {}", output_file.display());

    Ok(ConcatSummary {
        alignments,
        skipped,
        taxa: merged.sequence_count(),
        length: merged.length(),
    })
}

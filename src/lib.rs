//! # alnsieve - Alignment Quality Control
//!
//! Filters corpora of gene alignments by polymorphism, nucleotide diversity
//! or NG86 dN/dS, and concatenates the survivors over their shared taxa.
//!
//! ## Architecture
//!
//! - `model`: `Sequence` and validated `Alignment`
//! - `formats`: FASTA reading/writing and corpus discovery
//! - `sites`, `diversity`, `dnds`: the metrics themselves
//! - `genetic_code`, `codon`: translation tables and ORF extraction used by NG86
//! - `threshold`: inclusive ranges and the pass/fail gate
//! - `metrics`: one `Metric` trait over every metric
//! - `pipeline`: parallel folder filter and single-file checks
//! - `concat`: supermatrix concatenation
//! - `taxa`: header normalization, sampling and subsetting
//! - `cli`: command-line argument model

pub mod cli;
pub mod codon;
pub mod concat;
pub mod diversity;
pub mod dnds;
pub mod formats;
pub mod genetic_code;
pub mod metrics;
pub mod model;
pub mod pipeline;
pub mod sites;
pub mod taxa;
pub mod threshold;

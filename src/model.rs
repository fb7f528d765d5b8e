//! Data model for gene alignments.
//!
//! This module contains the in-memory representation of a multiple
//! sequence alignment:
//! - `Sequence`: one taxon id with its residues
//! - `Alignment`: an ordered, validated set of equal-length sequences
//!
//! An `Alignment` can only be built through [`Alignment::new`], which
//! enforces the invariants every metric relies on. Once built it is never
//! mutated; transformations (subsetting, renaming, concatenation) return
//! new alignments.

use std::collections::HashSet;

use thiserror::Error;

/// Gap symbol used in alignments.
pub const GAP: u8 = b'-';

/// Reasons an alignment is rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MalformedAlignment {
    #[error("alignment contains no sequence records")]
    Empty,

    #[error("sequence '{id}' has length {found}, expected {expected} (not an alignment)")]
    UnequalLength {
        id: String,
        expected: usize,
        found: usize,
    },

    #[error("record {index} has an empty taxon identifier")]
    EmptyId { index: usize },

    #[error("duplicate taxon identifier '{0}'")]
    DuplicateId(String),
}

/// Represents a single sequence with its taxon identifier and residues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sequence {
    /// The taxon identifier (from the FASTA header, without '>')
    pub id: String,
    /// Header text following the id, including its leading separator
    description: String,
    /// Raw residues, one byte per alignment column
    data: Vec<u8>,
}

impl Sequence {
    /// Creates a new sequence.
    pub fn new(id: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: String::new(),
            data: data.into().into_bytes(),
        }
    }

    /// Creates a sequence from raw bytes.
    pub fn from_bytes(id: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            id: id.into(),
            description: String::new(),
            data,
        }
    }

    /// Attaches the header text that followed the id, e.g. `" some description"`.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Header text after the id, empty when the header was the id alone.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Full header line without the leading '>'.
    pub fn header(&self) -> String {
        format!("{}{}", self.id, self.description)
    }

    /// Returns the length of the sequence.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the sequence is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the residues as bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Returns the residues as a string slice.
    ///
    /// Returns an empty string if the residues are not valid UTF-8, which
    /// cannot happen for sequences built by the FASTA parser.
    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.data).unwrap_or("")
    }
}

/// An ordered set of equal-length sequences with unique taxon ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alignment {
    sequences: Vec<Sequence>,
    length: usize,
}

impl Alignment {
    /// Builds an alignment, checking that it has at least one record, that
    /// all records share one length, and that taxon ids are non-empty and
    /// unique. Record order is preserved.
    pub fn new(sequences: Vec<Sequence>) -> Result<Self, MalformedAlignment> {
        let first = sequences.first().ok_or(MalformedAlignment::Empty)?;
        let length = first.len();

        let mut seen = HashSet::with_capacity(sequences.len());
        for (index, seq) in sequences.iter().enumerate() {
            if seq.id.is_empty() {
                return Err(MalformedAlignment::EmptyId { index });
            }
            if !seen.insert(seq.id.as_str()) {
                return Err(MalformedAlignment::DuplicateId(seq.id.clone()));
            }
            if seq.len() != length {
                return Err(MalformedAlignment::UnequalLength {
                    id: seq.id.clone(),
                    expected: length,
                    found: seq.len(),
                });
            }
        }

        Ok(Self { sequences, length })
    }

    /// Returns the number of columns (L).
    pub fn length(&self) -> usize {
        self.length
    }

    /// Returns the number of sequences.
    pub fn sequence_count(&self) -> usize {
        self.sequences.len()
    }

    /// Returns the records in file order.
    pub fn records(&self) -> &[Sequence] {
        &self.sequences
    }

    /// Gets a sequence by index.
    pub fn get(&self, index: usize) -> Option<&Sequence> {
        self.sequences.get(index)
    }

    /// Finds a sequence by taxon id.
    pub fn find(&self, id: &str) -> Option<&Sequence> {
        self.sequences.iter().find(|s| s.id == id)
    }

    /// Iterates over taxon ids in file order.
    pub fn taxon_ids(&self) -> impl Iterator<Item = &str> {
        self.sequences.iter().map(|s| s.id.as_str())
    }

    /// Consumes the alignment, returning its records.
    pub fn into_records(self) -> Vec<Sequence> {
        self.sequences
    }
}

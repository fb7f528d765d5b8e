//! FASTA alignment reader and writer.
//!
//! This module handles reading and writing FASTA alignments.
//! It supports both single-line and multi-line sequences.
//!
//! ## FASTA Format
//!
//! ```text
//! >taxon_identifier optional description
//! ACGTACGTACGT...
//! >another_taxon
//! TGCATGCATGCA...
//! ```
//!
//! The taxon id is the header text up to the first whitespace; the rest of
//! the header is kept as the description and written back unchanged. Header
//! normalization (e.g. cutting at '-' or '_') is left to
//! [`crate::taxa::normalize_headers`].

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use thiserror::Error;

use crate::model::{Alignment, MalformedAlignment, Sequence};

/// Residues per line when writing FASTA.
pub const LINE_WIDTH: usize = 60;

/// Errors that can occur while reading or writing FASTA alignments.
#[derive(Error, Debug)]
pub enum FastaError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid FASTA format: {0}")]
    InvalidFormat(String),

    #[error("Sequence without header at line {0}")]
    SequenceWithoutHeader(usize),

    #[error("Malformed alignment: {0}")]
    Malformed(#[from] MalformedAlignment),
}

/// Result type for FASTA operations.
pub type FastaResult<T> = Result<T, FastaError>;

/// Reads and validates a FASTA alignment file.
///
/// # Examples
///
/// ```no_run
/// use alnsieve::formats::fasta::read_fasta_file;
///
/// let alignment = read_fasta_file("gene.fasta").unwrap();
/// println!("Loaded {} sequences", alignment.sequence_count());
/// ```
pub fn read_fasta_file<P: AsRef<Path>>(path: P) -> FastaResult<Alignment> {
    let content = fs::read_to_string(path)?;
    parse_fasta_str(&content)
}

/// Parses FASTA content from a string and validates it as an alignment.
///
/// Works on slices of the pre-loaded content; a record with a header but no
/// residue lines is kept as an empty sequence so that the length check can
/// reject it.
pub fn parse_fasta_str(content: &str) -> FastaResult<Alignment> {
    let mut sequences = Vec::new();
    let mut current_id: Option<(&str, &str)> = None;
    let mut current_seq: Vec<u8> = Vec::new();

    for (index, line) in content.lines().enumerate() {
        let line_number = index + 1;
        let line = line.trim();

        if line.is_empty() {
            continue;
        }

        if let Some(header) = line.strip_prefix('>') {
            if let Some((id, description)) = current_id.take() {
                let capacity = current_seq.len();
                let data = std::mem::replace(&mut current_seq, Vec::with_capacity(capacity));
                sequences.push(Sequence::from_bytes(id, data).with_description(description));
            }

            let header = header.trim_start();
            let id_end = header.find(char::is_whitespace).unwrap_or(header.len());
            let (id, description) = header.split_at(id_end);
            if id.is_empty() {
                return Err(FastaError::InvalidFormat(format!(
                    "Empty sequence identifier at line {}",
                    line_number
                )));
            }
            current_id = Some((id, description));
        } else {
            if current_id.is_none() {
                return Err(FastaError::SequenceWithoutHeader(line_number));
            }

            // Most lines have no internal whitespace
            if line.bytes().all(|b| !b.is_ascii_whitespace()) {
                current_seq.extend_from_slice(line.as_bytes());
            } else {
                current_seq.extend(line.bytes().filter(|b| !b.is_ascii_whitespace()));
            }
        }
    }

    if let Some((id, description)) = current_id {
        sequences.push(Sequence::from_bytes(id, current_seq).with_description(description));
    }

    Ok(Alignment::new(sequences)?)
}

/// Writes an alignment as FASTA, wrapping residues at [`LINE_WIDTH`].
///
/// Headers are written back in full, id followed by any description.
pub fn write_fasta<W: Write>(alignment: &Alignment, mut writer: W) -> std::io::Result<()> {
    for seq in alignment.records() {
        writeln!(writer, ">{}{}", seq.id, seq.description())?;
        for chunk in seq.as_bytes().chunks(LINE_WIDTH) {
            writer.write_all(chunk)?;
            writer.write_all(b"\n")?;
        }
    }
    writer.flush()
}

/// Writes an alignment to a FASTA file, creating parent directories.
pub fn write_fasta_file<P: AsRef<Path>>(alignment: &Alignment, path: P) -> FastaResult<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let file = File::create(path)?;
    write_fasta(alignment, BufWriter::new(file))?;
    Ok(())
}

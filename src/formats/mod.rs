//! Alignment file recognition and corpus discovery.
//!
//! Alignments are FASTA files recognized by extension:
//! `.fasta`, `.fa`, `.fas`, `.fna` (case-insensitive).
//!
//! Discovery walks a directory recursively and returns every recognized file
//! once, sorted lexicographically by path, so that every tool processes a
//! corpus in the same reproducible order.

pub mod fasta;

use std::collections::BTreeSet;
use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::model::Alignment;
use fasta::{read_fasta_file, FastaResult};

/// Recognized alignment extensions, in resolution order.
pub const FASTA_EXTENSIONS: [&str; 4] = ["fasta", "fa", "fas", "fna"];

/// Returns true if the path carries a recognized alignment extension.
pub fn is_alignment_file<P: AsRef<Path>>(path: P) -> bool {
    path.as_ref()
        .extension()
        .and_then(OsStr::to_str)
        .map(|ext| {
            let ext = ext.to_lowercase();
            FASTA_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// Loads one alignment file.
///
/// Fails if the file cannot be read, has no parseable records, has records of
/// different lengths, or has empty or duplicated taxon ids.
pub fn load<P: AsRef<Path>>(path: P) -> FastaResult<Alignment> {
    read_fasta_file(path)
}

/// Recursively lists alignment files under `dir`, deduplicated and sorted.
///
/// Symlinked directories are not descended into; symlinked files are listed
/// when their target is a regular file.
pub fn discover_alignments<P: AsRef<Path>>(dir: P) -> io::Result<Vec<PathBuf>> {
    let mut found = BTreeSet::new();
    let mut pending = vec![dir.as_ref().to_path_buf()];

    while let Some(current) = pending.pop() {
        for entry in fs::read_dir(&current)? {
            let entry = entry?;
            let path = entry.path();
            let file_type = entry.file_type()?;

            if file_type.is_dir() {
                pending.push(path);
            } else if !is_alignment_file(&path) {
                continue;
            } else if file_type.is_file() || (file_type.is_symlink() && path.is_file()) {
                found.insert(path);
            }
        }
    }

    Ok(found.into_iter().collect())
}

/// Resolves an alignment given either as a file name or as a base name
/// without extension.
///
/// Tries, in order:
/// 1. The path as given
/// 2. The path with each recognized extension appended
pub fn resolve_alignment_path<P: AsRef<Path>>(base: P) -> Option<PathBuf> {
    let base = base.as_ref();
    if base.is_file() {
        return Some(base.to_path_buf());
    }
    if base.extension().is_some() {
        return None;
    }
    FASTA_EXTENSIONS
        .iter()
        .map(|ext| base.with_extension(ext))
        .find(|candidate| candidate.is_file())
}

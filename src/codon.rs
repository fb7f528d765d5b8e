//! Open reading frame extraction.
//!
//! Turns a raw nucleotide sequence into the clean codons of its first open
//! reading frame:
//!
//! 1. Uppercase, strip whitespace, and (unless gaps are kept) delete gap
//!    symbols, which shifts the reading frame.
//! 2. Start at the first literal `ATG`; no `ATG` means no ORF.
//! 3. Read non-overlapping triplets until the first `TAA`, `TAG` or `TGA`
//!    (excluded) or until fewer than three symbols remain.
//! 4. Keep only triplets made of `A`, `C`, `G`, `T`; any other triplet is
//!    dropped from the frame rather than masked.

use crate::model::GAP;

/// A validated codon: three bytes, each one of `A`, `C`, `G`, `T`.
pub type Codon = [u8; 3];

pub const START_CODON: Codon = *b"ATG";
pub const STOP_CODONS: [Codon; 3] = [*b"TAA", *b"TAG", *b"TGA"];

fn is_nucleotide(base: u8) -> bool {
    matches!(base, b'A' | b'C' | b'G' | b'T')
}

/// Extracts the clean codons of the first ORF in `sequence`.
///
/// Returns an empty vector when the sequence has no start codon.
pub fn extract_orf_codons(sequence: &str, include_gaps: bool) -> Vec<Codon> {
    let cleaned: Vec<u8> = sequence
        .bytes()
        .filter(|b| !b.is_ascii_whitespace())
        .filter(|&b| include_gaps || b != GAP)
        .map(|b| b.to_ascii_uppercase())
        .collect();

    let Some(start) = cleaned.windows(3).position(|w| w == &START_CODON[..]) else {
        return Vec::new();
    };

    let mut codons = Vec::with_capacity((cleaned.len() - start) / 3);
    for chunk in cleaned[start..].chunks_exact(3) {
        let codon: Codon = [chunk[0], chunk[1], chunk[2]];
        if STOP_CODONS.contains(&codon) {
            break;
        }
        if codon.iter().all(|&b| is_nucleotide(b)) {
            codons.push(codon);
        }
    }
    codons
}

/// Joins codons back into a nucleotide string.
pub fn codons_to_string(codons: &[Codon]) -> String {
    codons.iter().flatten().map(|&b| b as char).collect()
}

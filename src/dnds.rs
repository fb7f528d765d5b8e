//! dN/dS estimation with the Nei-Gojobori (1986) counting method.
//!
//! For two equal-length codon sequences, NG86 accumulates over aligned codon
//! positions:
//! - synonymous (S) and nonsynonymous (N) sites, averaged between the two
//!   codons at each position;
//! - synonymous (Sd) and nonsynonymous (Nd) differences, averaged over every
//!   minimal mutational pathway between the two codons.
//!
//! `ds = Sd / S` and `dn = Nd / N` are raw proportions (no Jukes-Cantor
//! correction).
//!
//! Every site and difference count is a multiple of 1/6 (site fractions are
//! thirds averaged over two codons, pathway averages divide by 1, 2 or 6),
//! so counts are accumulated exactly as integer sixths.
//!
//! Conventions:
//! - A change is synonymous only if both codons encode the same amino acid
//!   and that amino acid is not a stop; mutations into or between stop
//!   codons count as nonsynonymous.
//! - Pathways through intermediate stop codons are kept, each step classified
//!   like any other.

use log::debug;
use thiserror::Error;

use crate::codon::{extract_orf_codons, Codon};
use crate::genetic_code::{codon_index, GeneticCode, STOP};
use crate::model::Alignment;

/// Step orders for pathways between codons differing at 0, 1, 2 or 3 positions.
const PATHWAYS: [&[&[usize]]; 4] = [
    &[],
    &[&[0]],
    &[&[0, 1], &[1, 0]],
    &[
        &[0, 1, 2],
        &[0, 2, 1],
        &[1, 0, 2],
        &[1, 2, 0],
        &[2, 0, 1],
        &[2, 1, 0],
    ],
];

/// Sites per codon, in thirds.
const CODON_THIRDS: u64 = 9;

/// Errors raised when comparing two codon sequences.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DndsError {
    #[error("codon sequences differ in length ({left} vs {right} codons)")]
    LengthMismatch { left: usize, right: usize },

    #[error("invalid codon at position {0}")]
    InvalidCodon(usize),
}

/// Site and difference totals for one pair of codon sequences, in sixths.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Ng86Counts {
    syn_sites: u64,
    nonsyn_sites: u64,
    syn_diffs: u64,
    nonsyn_diffs: u64,
}

impl Ng86Counts {
    /// Synonymous sites (S).
    pub fn synonymous_sites(&self) -> f64 {
        self.syn_sites as f64 / 6.0
    }

    /// Nonsynonymous sites (N).
    pub fn nonsynonymous_sites(&self) -> f64 {
        self.nonsyn_sites as f64 / 6.0
    }

    /// Synonymous differences (Sd).
    pub fn synonymous_differences(&self) -> f64 {
        self.syn_diffs as f64 / 6.0
    }

    /// Nonsynonymous differences (Nd).
    pub fn nonsynonymous_differences(&self) -> f64 {
        self.nonsyn_diffs as f64 / 6.0
    }

    /// `Sd / S`; undefined when there are no synonymous sites.
    pub fn ds(&self) -> Option<f64> {
        (self.syn_sites > 0).then(|| self.syn_diffs as f64 / self.syn_sites as f64)
    }

    /// `Nd / N`; undefined when there are no nonsynonymous sites.
    pub fn dn(&self) -> Option<f64> {
        (self.nonsyn_sites > 0).then(|| self.nonsyn_diffs as f64 / self.nonsyn_sites as f64)
    }

    /// The pair's dN/dS ratio.
    ///
    /// - `ds > 0`: `dn / ds`
    /// - no synonymous change and no nonsynonymous change: `0.0`
    /// - no synonymous change but some nonsynonymous change: `None`
    pub fn ratio(&self) -> Option<f64> {
        match self.ds() {
            Some(ds) if ds > 0.0 => Some(self.dn().unwrap_or(0.0) / ds),
            _ if self.nonsyn_diffs == 0 => Some(0.0),
            _ => None,
        }
    }
}

/// Base (0..4, NCBI order) at `position` of a codon index.
fn base_at(index: usize, position: usize) -> usize {
    (index >> (2 * (2 - position))) & 3
}

/// Codon index with the base at `position` replaced.
fn with_base(index: usize, position: usize, base: usize) -> usize {
    let shift = 2 * (2 - position);
    (index & !(3 << shift)) | (base << shift)
}

/// NG86 estimator bound to one genetic code.
#[derive(Debug, Clone)]
pub struct Ng86 {
    code: GeneticCode,
    syn_thirds: [u8; 64],
}

impl Ng86 {
    /// Builds an estimator, tabulating synonymous sites for all 64 codons.
    pub fn new(code: GeneticCode) -> Self {
        let mut syn_thirds = [0u8; 64];
        for (index, slot) in syn_thirds.iter_mut().enumerate() {
            *slot = synonymous_thirds(&code, index);
        }
        Self { code, syn_thirds }
    }

    /// Synonymous sites of a single codon (0, 1/3, ..., 3).
    pub fn synonymous_sites(&self, codon: &Codon) -> Option<f64> {
        codon_index(codon).map(|i| self.syn_thirds[i] as f64 / 3.0)
    }

    fn is_synonymous(&self, from: usize, to: usize) -> bool {
        let aa = self.code.translate_index(from);
        aa != STOP && aa == self.code.translate_index(to)
    }

    /// Synonymous and nonsynonymous differences between two codons, in sixths.
    fn codon_differences(&self, a: usize, b: usize) -> (u64, u64) {
        let mut differing = [0usize; 3];
        let mut count = 0;
        for position in 0..3 {
            if base_at(a, position) != base_at(b, position) {
                differing[count] = position;
                count += 1;
            }
        }

        let orders = PATHWAYS[count];
        if orders.is_empty() {
            return (0, 0);
        }

        let (mut syn, mut nonsyn) = (0u64, 0u64);
        for order in orders {
            let mut current = a;
            for &step in order.iter() {
                let position = differing[step];
                let next = with_base(current, position, base_at(b, position));
                if self.is_synonymous(current, next) {
                    syn += 1;
                } else {
                    nonsyn += 1;
                }
                current = next;
            }
        }

        let scale = 6 / orders.len() as u64;
        (syn * scale, nonsyn * scale)
    }

    /// Counts NG86 sites and differences between two codon sequences.
    pub fn compare(&self, a: &[Codon], b: &[Codon]) -> Result<Ng86Counts, DndsError> {
        if a.len() != b.len() {
            return Err(DndsError::LengthMismatch {
                left: a.len(),
                right: b.len(),
            });
        }

        let mut counts = Ng86Counts::default();
        for (position, (ca, cb)) in a.iter().zip(b).enumerate() {
            let (Some(ia), Some(ib)) = (codon_index(ca), codon_index(cb)) else {
                return Err(DndsError::InvalidCodon(position));
            };

            let ta = self.syn_thirds[ia] as u64;
            let tb = self.syn_thirds[ib] as u64;
            counts.syn_sites += ta + tb;
            counts.nonsyn_sites += 2 * CODON_THIRDS - ta - tb;

            let (sd, nd) = self.codon_differences(ia, ib);
            counts.syn_diffs += sd;
            counts.nonsyn_diffs += nd;
        }
        Ok(counts)
    }

    /// Mean pairwise dN/dS over all sequence pairs of an alignment.
    ///
    /// `None` when there are fewer than two sequences, when any sequence
    /// yields no ORF, or when no pair produces a ratio.
    pub fn average_dnds(&self, alignment: &Alignment, include_gaps: bool) -> Option<f64> {
        let records = alignment.records();
        if records.len() < 2 {
            return None;
        }

        let mut orfs = Vec::with_capacity(records.len());
        for seq in records {
            let codons = extract_orf_codons(seq.as_str(), include_gaps);
            if codons.is_empty() {
                debug!("{}: no usable ORF", seq.id);
                return None;
            }
            orfs.push(codons);
        }

        let mut total = 0.0;
        let mut included = 0usize;
        for (i, a) in orfs.iter().enumerate() {
            for (j, b) in orfs.iter().enumerate().skip(i + 1) {
                match self.compare(a, b).map(|counts| counts.ratio()) {
                    Ok(Some(ratio)) => {
                        total += ratio;
                        included += 1;
                    }
                    Ok(None) => debug!(
                        "{} vs {}: nonsynonymous changes without synonymous ones, pair skipped",
                        records[i].id, records[j].id
                    ),
                    Err(e) => debug!("{} vs {}: {}, pair skipped", records[i].id, records[j].id, e),
                }
            }
        }

        (included > 0).then(|| total / included as f64)
    }
}

impl Default for Ng86 {
    fn default() -> Self {
        Self::new(GeneticCode::standard())
    }
}

/// Synonymous single-nucleotide neighbours of a codon, in thirds of a site.
fn synonymous_thirds(code: &GeneticCode, index: usize) -> u8 {
    let aa = code.translate_index(index);
    if aa == STOP {
        return 0;
    }

    let mut thirds = 0;
    for position in 0..3 {
        let current = base_at(index, position);
        for base in (0..4).filter(|&b| b != current) {
            if code.translate_index(with_base(index, position, base)) == aa {
                thirds += 1;
            }
        }
    }
    thirds
}

/// NG86 counts between two codon sequences under the standard code.
pub fn pairwise_dnds(a: &[Codon], b: &[Codon]) -> Result<Ng86Counts, DndsError> {
    Ng86::default().compare(a, b)
}

/// Mean pairwise dN/dS of an alignment under the standard code.
pub fn average_dnds(alignment: &Alignment, include_gaps: bool) -> Option<f64> {
    Ng86::default().average_dnds(alignment, include_gaps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Sequence;

    const EPS: f64 = 1e-9;

    fn alignment(rows: &[&str]) -> Alignment {
        Alignment::new(
            rows.iter()
                .enumerate()
                .map(|(i, r)| Sequence::new(format!("t{}", i), *r))
                .collect(),
        )
        .unwrap()
    }

    fn diffs(a: &Codon, b: &Codon) -> (u64, u64) {
        let ng = Ng86::default();
        ng.codon_differences(codon_index(a).unwrap(), codon_index(b).unwrap())
    }

    #[test]
    fn test_synonymous_sites_per_codon() {
        let ng = Ng86::default();
        assert_eq!(ng.synonymous_sites(b"ATG"), Some(0.0));
        assert_eq!(ng.synonymous_sites(b"TGG"), Some(0.0));
        assert!((ng.synonymous_sites(b"AAA").unwrap() - 1.0 / 3.0).abs() < EPS);
        assert!((ng.synonymous_sites(b"TTA").unwrap() - 2.0 / 3.0).abs() < EPS);
        assert!((ng.synonymous_sites(b"CTG").unwrap() - 4.0 / 3.0).abs() < EPS);
        assert!((ng.synonymous_sites(b"CCC").unwrap() - 1.0).abs() < EPS);
        assert_eq!(ng.synonymous_sites(b"TAA"), Some(0.0));
        assert_eq!(ng.synonymous_sites(b"ANA"), None);
    }

    #[test]
    fn test_single_synonymous_difference() {
        // ATGAAATAA vs ATGAAGTAA -> [ATG, AAA] vs [ATG, AAG]
        let counts = pairwise_dnds(&[*b"ATG", *b"AAA"], &[*b"ATG", *b"AAG"]).unwrap();

        assert!((counts.synonymous_sites() - 1.0 / 3.0).abs() < EPS);
        assert!((counts.nonsynonymous_sites() - 17.0 / 3.0).abs() < EPS);
        assert!((counts.synonymous_differences() - 1.0).abs() < EPS);
        assert_eq!(counts.nonsynonymous_differences(), 0.0);
        assert!((counts.ds().unwrap() - 3.0).abs() < EPS);
        assert_eq!(counts.dn(), Some(0.0));
        assert_eq!(counts.ratio(), Some(0.0));
    }

    #[test]
    fn test_example_alignment() {
        let aln = alignment(&["ATGAAATAA", "ATGAAGTAA"]);
        let avg = average_dnds(&aln, false).unwrap();
        assert!(avg.abs() < 1e-6);
    }

    #[test]
    fn test_identical_sequences() {
        let aln = alignment(&["ATGCCCAAATAA", "ATGCCCAAATAA", "ATGCCCAAATAA"]);
        assert_eq!(average_dnds(&aln, false), Some(0.0));
    }

    #[test]
    fn test_two_position_pathways() {
        // CCC -> CAC -> CAA: N, N ; CCC -> CCA -> CAA: S, N
        assert_eq!(diffs(b"CCC", b"CAA"), (3, 9));
    }

    #[test]
    fn test_pathway_through_stop_is_counted() {
        // TGG -> CGG -> CAG and TGG -> TAG -> CAG: all nonsynonymous
        assert_eq!(diffs(b"TGG", b"CAG"), (0, 12));
    }

    #[test]
    fn test_three_position_pathways_total() {
        let (syn, nonsyn) = diffs(b"TTT", b"GGG");
        assert_eq!(syn + nonsyn, 18);
        let (syn, nonsyn) = diffs(b"CTA", b"TTG");
        assert_eq!(syn + nonsyn, 12);
        // CTA -> TTA -> TTG and CTA -> CTG -> TTG are both fully synonymous
        assert_eq!(syn, 12);
    }

    #[test]
    fn test_mixed_pair_ratio() {
        // CCC -> CCA synonymous, AAA -> CAA nonsynonymous
        let counts = pairwise_dnds(&[*b"CCC", *b"AAA"], &[*b"CCA", *b"CAA"]).unwrap();
        assert!((counts.synonymous_sites() - 4.0 / 3.0).abs() < EPS);
        assert!((counts.nonsynonymous_sites() - 14.0 / 3.0).abs() < EPS);
        assert!((counts.ds().unwrap() - 0.75).abs() < EPS);
        assert!((counts.dn().unwrap() - 3.0 / 14.0).abs() < EPS);
        assert!((counts.ratio().unwrap() - 2.0 / 7.0).abs() < EPS);
    }

    #[test]
    fn test_only_nonsynonymous_changes_give_no_ratio() {
        let counts = pairwise_dnds(&[*b"ATG", *b"AAA"], &[*b"ATG", *b"CAA"]).unwrap();
        assert_eq!(counts.ratio(), None);

        let aln = alignment(&["ATGAAATAA", "ATGCAATAA"]);
        assert_eq!(average_dnds(&aln, false), None);
    }

    #[test]
    fn test_no_synonymous_sites_and_no_change() {
        let counts = pairwise_dnds(&[*b"ATG"], &[*b"ATG"]).unwrap();
        assert_eq!(counts.ds(), None);
        assert_eq!(counts.ratio(), Some(0.0));
    }

    #[test]
    fn test_length_mismatch() {
        let result = pairwise_dnds(&[*b"ATG", *b"AAA"], &[*b"ATG"]);
        assert_eq!(result, Err(DndsError::LengthMismatch { left: 2, right: 1 }));
    }

    #[test]
    fn test_invalid_codon() {
        let result = pairwise_dnds(&[*b"ATG", *b"ANA"], &[*b"ATG", *b"AAA"]);
        assert_eq!(result, Err(DndsError::InvalidCodon(1)));
    }

    #[test]
    fn test_undefined_alignments() {
        assert_eq!(average_dnds(&alignment(&["ATGAAATAA"]), false), None);
        assert_eq!(average_dnds(&alignment(&["ATGAAATAA", "CCCCCCCCC"]), false), None);
    }

    #[test]
    fn test_unequal_orfs_are_skipped() {
        // t0/t1 share an ORF length; t2 has an ambiguous codon removed
        let aln = alignment(&["ATGCCCAAATAA", "ATGCCAAAATAA", "ATGCCNAAATAA"]);
        let avg = average_dnds(&aln, false).unwrap();
        assert_eq!(avg, 0.0);
    }

    #[test]
    fn test_alternative_code_changes_classification() {
        // AGA -> AGG is Arg -> Arg in the standard code, stop -> stop in table 2
        let standard = Ng86::default();
        let mito = Ng86::new(GeneticCode::by_id(2).unwrap());
        let a = [*b"ATG", *b"AGA"];
        let b = [*b"ATG", *b"AGG"];

        assert_eq!(standard.compare(&a, &b).unwrap().ratio(), Some(0.0));
        assert_eq!(mito.compare(&a, &b).unwrap().ratio(), None);
    }
}

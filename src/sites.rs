//! Per-column polymorphism.
//!
//! A column is polymorphic when, after dropping gaps and `N` and ignoring
//! case, at least two distinct residues remain. Columns made only of gaps
//! or `N` are never polymorphic but still count towards the alignment length.

use crate::model::{Alignment, GAP};

/// Returns true if the residue takes part in polymorphism detection.
fn is_informative(residue: u8) -> bool {
    residue != GAP && !residue.eq_ignore_ascii_case(&b'N')
}

/// Returns true if column `col` holds at least two distinct informative residues.
pub fn is_polymorphic_column(alignment: &Alignment, col: usize) -> bool {
    let mut first: Option<u8> = None;
    for seq in alignment.records() {
        let residue = seq.as_bytes()[col];
        if !is_informative(residue) {
            continue;
        }
        let residue = residue.to_ascii_uppercase();
        match first {
            None => first = Some(residue),
            Some(seen) if seen != residue => return true,
            Some(_) => {}
        }
    }
    false
}

/// Counts polymorphic columns.
pub fn polymorphic_site_count(alignment: &Alignment) -> usize {
    (0..alignment.length())
        .filter(|&col| is_polymorphic_column(alignment, col))
        .count()
}

/// Fraction of polymorphic columns, in `[0, 1]`. Zero for an empty alignment.
pub fn polymorphic_rate(alignment: &Alignment) -> f64 {
    let length = alignment.length();
    if length == 0 {
        return 0.0;
    }
    polymorphic_site_count(alignment) as f64 / length as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Sequence;

    fn alignment(rows: &[&str]) -> Alignment {
        Alignment::new(
            rows.iter()
                .enumerate()
                .map(|(i, r)| Sequence::new(format!("t{}", i), *r))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_monomorphic_alignment() {
        let aln = alignment(&["ACGT", "ACGT", "acgt"]);
        assert_eq!(polymorphic_site_count(&aln), 0);
        assert_eq!(polymorphic_rate(&aln), 0.0);
    }

    #[test]
    fn test_fully_polymorphic_alignment() {
        let aln = alignment(&["ACGT", "CATG"]);
        assert_eq!(polymorphic_rate(&aln), 1.0);
    }

    #[test]
    fn test_gaps_and_n_are_ignored() {
        // col0: A/A/A, col1: A/C/- (polymorphic), col2: all gaps or N
        let aln = alignment(&["AA-", "AC-", "A-N"]);
        assert_eq!(polymorphic_site_count(&aln), 1);
        assert!((polymorphic_rate(&aln) - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_n_against_base_is_not_polymorphic() {
        let aln = alignment(&["AN", "NC", "A-"]);
        assert_eq!(polymorphic_site_count(&aln), 0);
    }

    #[test]
    fn test_ambiguity_codes_count_as_residues() {
        let aln = alignment(&["R", "A"]);
        assert_eq!(polymorphic_site_count(&aln), 1);
    }

    #[test]
    fn test_zero_length_rate() {
        let aln = alignment(&["", ""]);
        assert_eq!(polymorphic_rate(&aln), 0.0);
    }

    #[test]
    fn test_rate_bounds() {
        for rows in [&["A-GT", "ACNT"][..], &["AAAA"][..], &["AC", "AG", "TT"][..]] {
            let rate = polymorphic_rate(&alignment(rows));
            assert!((0.0..=1.0).contains(&rate));
        }
    }
}

//! Genetic code definitions.
//!
//! This module provides:
//! - NCBI genetic code tables (1-33)
//! - Codon to amino acid translation on validated codons
//!
//! Tables are stored as the 64-character NCBI `ncbieaa` strings, in the
//! NCBI codon order (TTT, TTC, TTA, TTG, TCT, ... with bases ordered T, C, A, G).

use crate::codon::Codon;

/// Amino acid symbol used for stop codons.
pub const STOP: u8 = b'*';

/// (NCBI id, name, ncbieaa) for every supported table.
const NCBI_TABLES: &[(u8, &str, &str)] = &[
    (1, "Standard", "FFLLSSSSYY**CC*WLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG"),
    (2, "Vertebrate Mitochondrial", "FFLLSSSSYY**CCWWLLLLPPPPHHQQRRRRIIMMTTTTNNKKSS**VVVVAAAADDEEGGGG"),
    (3, "Yeast Mitochondrial", "FFLLSSSSYY**CCWWTTTTPPPPHHQQRRRRIIMMTTTTNNKKSSRRVVVVAAAADDEEGGGG"),
    (4, "Mold/Protozoan/Coelenterate Mitochondrial", "FFLLSSSSYY**CCWWLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG"),
    (5, "Invertebrate Mitochondrial", "FFLLSSSSYY**CCWWLLLLPPPPHHQQRRRRIIMMTTTTNNKKSSSSVVVVAAAADDEEGGGG"),
    (6, "Ciliate/Dasycladacean/Hexamita Nuclear", "FFLLSSSSYYQQCC*WLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG"),
    (9, "Echinoderm/Flatworm Mitochondrial", "FFLLSSSSYY**CCWWLLLLPPPPHHQQRRRRIIIMTTTTNNNKSSSSVVVVAAAADDEEGGGG"),
    (10, "Euplotid Nuclear", "FFLLSSSSYY**CCCWLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG"),
    (11, "Bacterial/Archaeal/Plant Plastid", "FFLLSSSSYY**CC*WLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG"),
    (12, "Alternative Yeast Nuclear", "FFLLSSSSYY**CC*WLLLSPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG"),
    (13, "Ascidian Mitochondrial", "FFLLSSSSYY**CCWWLLLLPPPPHHQQRRRRIIMMTTTTNNKKSSGGVVVVAAAADDEEGGGG"),
    (14, "Alternative Flatworm Mitochondrial", "FFLLSSSSYYY*CCWWLLLLPPPPHHQQRRRRIIIMTTTTNNNKSSSSVVVVAAAADDEEGGGG"),
    (15, "Blepharisma Macronuclear", "FFLLSSSSYY*QCC*WLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG"),
    (16, "Chlorophycean Mitochondrial", "FFLLSSSSYY*LCC*WLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG"),
    (21, "Trematode Mitochondrial", "FFLLSSSSYY**CCWWLLLLPPPPHHQQRRRRIIMMTTTTNNNKSSSSVVVVAAAADDEEGGGG"),
    (22, "Scenedesmus obliquus Mitochondrial", "FFLLSS*SYY*LCC*WLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG"),
    (23, "Thraustochytrium Mitochondrial", "FF*LSSSSYY**CC*WLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG"),
    (24, "Rhabdopleuridae Mitochondrial", "FFLLSSSSYY**CCWWLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSSKVVVVAAAADDEEGGGG"),
    (25, "Candidate Division SR1/Gracilibacteria", "FFLLSSSSYY**CCGWLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG"),
    (26, "Pachysolen tannophilus Nuclear", "FFLLSSSSYY**CC*WLLLAPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG"),
    (27, "Karyorelict Nuclear", "FFLLSSSSYYQQCCWWLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG"),
    (28, "Condylostoma Nuclear", "FFLLSSSSYYQQCCWWLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG"),
    (29, "Mesodinium Nuclear", "FFLLSSSSYYYYCC*WLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG"),
    (30, "Peritrich Nuclear", "FFLLSSSSYYEECC*WLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG"),
    (31, "Blastocrithidia Nuclear", "FFLLSSSSYYEECCWWLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG"),
    (32, "Balanophoraceae Plastid", "FFLLSSSSYY*WCC*WLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG"),
    (33, "Cephalodiscidae Mitochondrial", "FFLLSSSSYYY*CCWWLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSSKVVVVAAAADDEEGGGG"),
];

/// Position of a base in NCBI table order, or `None` for anything but ACGT.
fn base_rank(base: u8) -> Option<usize> {
    match base {
        b'T' => Some(0),
        b'C' => Some(1),
        b'A' => Some(2),
        b'G' => Some(3),
        _ => None,
    }
}

/// Index of a codon (0..64) in NCBI table order.
pub fn codon_index(codon: &Codon) -> Option<usize> {
    let mut index = 0;
    for &base in codon {
        index = index * 4 + base_rank(base)?;
    }
    Some(index)
}

/// A genetic code table for translating codons to amino acids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneticCode {
    /// NCBI genetic code ID
    pub id: u8,
    /// Name of the genetic code
    pub name: &'static str,
    amino_acids: [u8; 64],
}

impl GeneticCode {
    fn from_ncbieaa(id: u8, name: &'static str, ncbieaa: &str) -> Self {
        let mut amino_acids = [b'X'; 64];
        for (slot, aa) in amino_acids.iter_mut().zip(ncbieaa.bytes()) {
            *slot = aa;
        }
        Self {
            id,
            name,
            amino_acids,
        }
    }

    /// Looks up an NCBI table by id.
    pub fn by_id(id: u8) -> Option<Self> {
        NCBI_TABLES
            .iter()
            .find(|(table_id, _, _)| *table_id == id)
            .map(|&(id, name, ncbieaa)| Self::from_ncbieaa(id, name, ncbieaa))
    }

    /// The standard code (NCBI table 1).
    pub fn standard() -> Self {
        let (id, name, ncbieaa) = NCBI_TABLES[0];
        Self::from_ncbieaa(id, name, ncbieaa)
    }

    /// All supported NCBI ids.
    pub fn available_ids() -> impl Iterator<Item = u8> {
        NCBI_TABLES.iter().map(|(id, _, _)| *id)
    }

    /// Translates a codon; `None` if it contains anything but uppercase ACGT.
    pub fn translate(&self, codon: &Codon) -> Option<u8> {
        codon_index(codon).map(|i| self.amino_acids[i])
    }

    /// Translates a codon known to be valid, by table index.
    pub(crate) fn translate_index(&self, index: usize) -> u8 {
        self.amino_acids[index]
    }

    /// Returns true if the codon is a stop codon in this table.
    pub fn is_stop(&self, codon: &Codon) -> bool {
        self.translate(codon) == Some(STOP)
    }
}

impl Default for GeneticCode {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_code_translation() {
        let standard = GeneticCode::standard();

        assert_eq!(standard.translate(b"ATG"), Some(b'M'));
        assert_eq!(standard.translate(b"TAA"), Some(STOP));
        assert_eq!(standard.translate(b"TAG"), Some(STOP));
        assert_eq!(standard.translate(b"TGA"), Some(STOP));
        assert_eq!(standard.translate(b"TTT"), Some(b'F'));
        assert_eq!(standard.translate(b"GGG"), Some(b'G'));
        assert_eq!(standard.translate(b"AAA"), Some(b'K'));
        assert_eq!(standard.translate(b"AAG"), Some(b'K'));
    }

    #[test]
    fn test_invalid_codons() {
        let standard = GeneticCode::standard();
        assert_eq!(standard.translate(b"ATN"), None);
        assert_eq!(standard.translate(b"A-G"), None);
        assert_eq!(standard.translate(b"atg"), None);
    }

    #[test]
    fn test_codon_index_order() {
        assert_eq!(codon_index(b"TTT"), Some(0));
        assert_eq!(codon_index(b"TTC"), Some(1));
        assert_eq!(codon_index(b"GGG"), Some(63));
    }

    #[test]
    fn test_different_genetic_codes() {
        let standard = GeneticCode::by_id(1).unwrap();
        assert!(standard.is_stop(b"TGA"));

        let vert_mito = GeneticCode::by_id(2).unwrap();
        assert_eq!(vert_mito.translate(b"TGA"), Some(b'W'));
        assert!(vert_mito.is_stop(b"AGA"));

        assert!(GeneticCode::by_id(7).is_none());
        assert_eq!(GeneticCode::available_ids().count(), 27);
    }
}

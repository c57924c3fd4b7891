pub mod fasta;

pub use fasta::ReferenceGenome;

use thiserror::Error;

use crate::region::Strand;

#[derive(Error, Debug)]
pub enum ReferenceError {
    #[error("chromosome '{0}' not found in reference")]
    UnknownChromosome(String),
    #[error("interval {chrom}:{start}-{end} is beyond sequence length {len}")]
    OutOfBounds {
        chrom: String,
        start: u64,
        end: u64,
        len: u64,
    },
}

/// A lookup of reference bases by genomic interval.
///
/// Implementations return uppercase `A/C/G/T/N` for the half-open interval
/// `[start, end)`, reverse-complemented when `strand` is [`Strand::Minus`].
pub trait ReferenceSource {
    fn get_sequence(
        &self,
        chrom: &str,
        start: u64,
        end: u64,
        strand: Strand,
    ) -> Result<Vec<u8>, ReferenceError>;
}

/// Complement of a single base; anything outside `ACGTN` (either case) is returned as-is.
pub fn complement(base: u8) -> u8 {
    match base {
        b'A' => b'T',
        b'T' => b'A',
        b'C' => b'G',
        b'G' => b'C',
        b'a' => b't',
        b't' => b'a',
        b'c' => b'g',
        b'g' => b'c',
        other => other,
    }
}

pub fn reverse_complement(seq: &[u8]) -> Vec<u8> {
    seq.iter().rev().map(|&b| complement(b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reverse_complement() {
        assert_eq!(reverse_complement(b"ACGTN"), b"NACGT");
        assert_eq!(reverse_complement(b"aacg"), b"cgtt");
        assert!(reverse_complement(b"").is_empty());
    }
}

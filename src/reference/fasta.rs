use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use log::info;

use crate::reference::{reverse_complement, ReferenceError, ReferenceSource};
use crate::region::{match_chrom_format, Strand};

/// A FASTA entry whose name encodes a genomic region (e.g. `chr17:100-200`).
#[derive(Debug, Clone)]
struct FragmentInfo {
    /// The base chromosome name (e.g. `chr17`).
    chrom: String,
    /// 0-based start of the fragment on the chromosome.
    start: u64,
    /// 0-based exclusive end of the fragment on the chromosome.
    end: u64,
    /// Key into `sequences` for the actual data.
    seq_key: String,
}

/// An in-memory reference genome, usually loaded from a FASTA file.
///
/// Supports fragment FASTA files where sequence names encode genomic regions
/// (e.g. `>chr17:10953130-11022414`, 0-based half-open). When fetching by
/// chromosome name, a fragment covering the requested interval is used.
pub struct ReferenceGenome {
    /// Contig name -> full sequence.
    sequences: HashMap<String, Vec<u8>>,
    /// Fragment entries parsed from names like `chr:start-end`.
    fragments: Vec<FragmentInfo>,
}

impl ReferenceGenome {
    fn parse_fragment_name(name: &str) -> Option<(String, u64, u64)> {
        let (chrom, rest) = name.rsplit_once(':')?;
        let (start_str, end_str) = rest.split_once('-')?;
        let start: u64 = start_str.parse().ok()?;
        let end: u64 = end_str.parse().ok()?;
        if end > start {
            Some((chrom.to_string(), start, end))
        } else {
            None
        }
    }

    fn build_fragments(sequences: &HashMap<String, Vec<u8>>) -> Vec<FragmentInfo> {
        let mut fragments = Vec::new();
        for key in sequences.keys() {
            if let Some((chrom, start, end)) = Self::parse_fragment_name(key) {
                fragments.push(FragmentInfo {
                    chrom,
                    start,
                    end,
                    seq_key: key.clone(),
                });
            }
        }
        fragments
    }

    /// Load all sequences from a FASTA file into memory.
    pub fn from_file(path: &Path) -> Result<Self> {
        use noodles::fasta;
        use std::io::BufReader;

        let file = std::fs::File::open(path)
            .with_context(|| format!("failed to open FASTA file: {}", path.display()))?;
        let mut reader = fasta::io::Reader::new(BufReader::new(file));
        let mut sequences = HashMap::new();

        for result in reader.records() {
            let record = result.context("failed to read FASTA record")?;
            let name = String::from_utf8_lossy(record.name()).into_owned();
            let seq: Vec<u8> = record.sequence().as_ref().to_vec();
            sequences.insert(name, seq);
        }

        info!("loaded {} reference sequences from {}", sequences.len(), path.display());
        Ok(Self::from_sequences(sequences))
    }

    /// Create a reference genome from in-memory sequences.
    pub fn from_sequences(sequences: HashMap<String, Vec<u8>>) -> Self {
        let fragments = Self::build_fragments(&sequences);
        Self {
            sequences,
            fragments,
        }
    }

    /// Fetch forward-strand bases for `[start, end)` as uppercase ASCII.
    pub fn fetch(&self, chrom: &str, start: u64, end: u64) -> Result<Vec<u8>, ReferenceError> {
        let chrom = match_chrom_format(chrom, self.chromosomes());

        if let Some(seq) = self.sequences.get(&chrom) {
            return Self::slice_upper(&chrom, seq, start, end, 0);
        }

        for frag in &self.fragments {
            if frag.chrom == chrom && start >= frag.start && end <= frag.end {
                let Some(seq) = self.sequences.get(&frag.seq_key) else {
                    continue;
                };
                return Self::slice_upper(&chrom, seq, start, end, frag.start);
            }
        }

        Err(ReferenceError::UnknownChromosome(chrom))
    }

    fn slice_upper(
        chrom: &str,
        seq: &[u8],
        start: u64,
        end: u64,
        offset: u64,
    ) -> Result<Vec<u8>, ReferenceError> {
        let local_start = (start - offset) as usize;
        let local_end = (end - offset) as usize;
        if local_end > seq.len() || local_start > local_end {
            return Err(ReferenceError::OutOfBounds {
                chrom: chrom.to_string(),
                start,
                end,
                len: seq.len() as u64 + offset,
            });
        }
        Ok(seq[local_start..local_end]
            .iter()
            .map(|b| b.to_ascii_uppercase())
            .collect())
    }

    /// Available chromosome names: raw FASTA entry names and base names of fragments.
    pub fn chromosomes(&self) -> Vec<&str> {
        let mut seen = std::collections::HashSet::new();
        let mut chroms: Vec<&str> = Vec::new();
        for key in self.sequences.keys() {
            if seen.insert(key.as_str()) {
                chroms.push(key.as_str());
            }
        }
        for frag in &self.fragments {
            if seen.insert(frag.chrom.as_str()) {
                chroms.push(&frag.chrom);
            }
        }
        chroms
    }
}

impl ReferenceSource for ReferenceGenome {
    fn get_sequence(
        &self,
        chrom: &str,
        start: u64,
        end: u64,
        strand: Strand,
    ) -> Result<Vec<u8>, ReferenceError> {
        let seq = self.fetch(chrom, start, end)?;
        Ok(match strand {
            Strand::Plus => seq,
            Strand::Minus => reverse_complement(&seq),
        })
    }
}

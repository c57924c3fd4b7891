use std::fmt;

use log::debug;

use crate::alignment::{AlignedRead, CigarOp};

/// Minimum fraction of a column's reads needed to support a nucleotide.
pub const NUCLEOTIDE_FRACTION: f64 = 0.2;
/// Minimum fraction of a column's reads needed to support a deletion.
pub const DELETION_FRACTION: f64 = 0.3;
/// Minimum ratio of insertions to column depth needed to support an insertion.
pub const INSERTION_FRACTION: f64 = 0.2;

/// Evidence categories tallied per column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Symbol {
    A,
    C,
    G,
    T,
    Del,
    Ins,
}

impl Symbol {
    /// The nucleotide symbol for a read base; `None` for `N` and anything
    /// outside `ACGT`.
    pub fn from_base(base: u8) -> Option<Self> {
        match base.to_ascii_uppercase() {
            b'A' => Some(Symbol::A),
            b'C' => Some(Symbol::C),
            b'G' => Some(Symbol::G),
            b'T' => Some(Symbol::T),
            _ => None,
        }
    }

    /// Row in the count matrix; insertions are kept in their own array.
    fn row(self) -> Option<usize> {
        match self {
            Symbol::A => Some(0),
            Symbol::C => Some(1),
            Symbol::G => Some(2),
            Symbol::T => Some(3),
            Symbol::Del => Some(4),
            Symbol::Ins => None,
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Symbol::A => "A",
            Symbol::C => "C",
            Symbol::G => "G",
            Symbol::T => "T",
            Symbol::Del => "DEL",
            Symbol::Ins => "INS",
        };
        f.write_str(s)
    }
}

const COUNTED_ROWS: usize = 5;

/// Per-column tallies of nucleotides, deletions and insertions over a
/// half-open window, used to tell recurrent discordances from noise.
#[derive(Debug, Clone)]
pub struct MismatchCounts {
    chrom: String,
    start: u64,
    end: u64,
    counts: [Vec<u32>; COUNTED_ROWS],
    insertions: Vec<u32>,
}

impl MismatchCounts {
    /// An all-zero tally over `[start, end)`. An empty or inverted window
    /// yields zero-length arrays.
    pub fn new(chrom: impl Into<String>, start: u64, end: u64) -> Self {
        let length = end.saturating_sub(start) as usize;
        Self {
            chrom: chrom.into(),
            start,
            end: start + length as u64,
            counts: std::array::from_fn(|_| vec![0; length]),
            insertions: vec![0; length],
        }
    }

    /// Build and tally in one step.
    pub fn from_reads<'a, I>(chrom: impl Into<String>, start: u64, end: u64, reads: I) -> Self
    where
        I: IntoIterator<Item = &'a AlignedRead>,
    {
        let mut counts = Self::new(chrom, start, end);
        counts.tally_reads(reads);
        counts
    }

    pub fn chrom(&self) -> &str {
        &self.chrom
    }

    pub fn start(&self) -> u64 {
        self.start
    }

    pub fn end(&self) -> u64 {
        self.end
    }

    pub fn len(&self) -> usize {
        self.insertions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.insertions.is_empty()
    }

    /// Walk every read's CIGAR and add its pileup evidence to the window.
    ///
    /// Unmapped and secondary alignments, and reads on other chromosomes, are
    /// skipped. A match column counts the read base (ambiguous bases are not
    /// counted), a deletion column counts a deletion, and an insertion is
    /// counted at the last aligned column before it. Reference skips (introns
    /// of spliced reads) are not evidence and leave their columns untouched.
    pub fn tally_reads<'a, I>(&mut self, reads: I)
    where
        I: IntoIterator<Item = &'a AlignedRead>,
    {
        let mut tallied = 0usize;
        for read in reads {
            if read.is_unmapped || read.is_secondary || read.chrom != self.chrom {
                continue;
            }
            if read.end <= self.start || read.start >= self.end {
                continue;
            }
            self.tally_read(read);
            tallied += 1;
        }
        debug!(
            "tallied {} reads over {}:{}-{}",
            tallied, self.chrom, self.start, self.end
        );
    }

    fn tally_read(&mut self, read: &AlignedRead) {
        let mut genome_pos = read.start;
        let mut read_pos = 0usize;
        let mut last_aligned: Option<u64> = None;

        for op in &read.cigar {
            if op.ref_len() == 0 && op.read_len() == 0 {
                continue;
            }
            match *op {
                CigarOp::Match(n) => {
                    for i in 0..n as u64 {
                        let pos = genome_pos + i;
                        if let Some(&base) = read.sequence.get(read_pos + i as usize)
                            && let Some(symbol) = Symbol::from_base(base)
                        {
                            self.add_count(pos, symbol);
                        }
                    }
                    genome_pos += n as u64;
                    read_pos += n as usize;
                    last_aligned = Some(genome_pos - 1);
                }
                CigarOp::Deletion(n) => {
                    for i in 0..n as u64 {
                        self.add_count(genome_pos + i, Symbol::Del);
                    }
                    genome_pos += n as u64;
                    last_aligned = None;
                }
                CigarOp::Skip(n) => {
                    genome_pos += n as u64;
                    last_aligned = None;
                }
                CigarOp::Insertion(n) => {
                    if let Some(anchor) = last_aligned {
                        self.add_count(anchor, Symbol::Ins);
                    }
                    read_pos += n as usize;
                }
                CigarOp::SoftClip(n) => {
                    read_pos += n as usize;
                }
                CigarOp::HardClip(_) => {}
            }
        }
    }

    /// Add one observation of `symbol` at a genomic position. Positions
    /// outside the window are ignored.
    pub fn add_count(&mut self, position: u64, symbol: Symbol) {
        let Some(offset) = self.offset(position) else {
            return;
        };
        match symbol.row() {
            Some(row) => self.counts[row][offset] += 1,
            None => self.insertions[offset] += 1,
        }
    }

    /// Observations of `symbol` at a genomic position, or `None` outside the window.
    pub fn count(&self, symbol: Symbol, position: u64) -> Option<u32> {
        let offset = self.offset(position)?;
        Some(match symbol.row() {
            Some(row) => self.counts[row][offset],
            None => self.insertions[offset],
        })
    }

    /// Column total over A, C, G, T and deletions (insertions excluded).
    pub fn depth(&self, position: u64) -> Option<u32> {
        let offset = self.offset(position)?;
        Some(self.column_total(offset))
    }

    fn column_total(&self, offset: usize) -> u32 {
        self.counts.iter().map(|row| row[offset]).sum()
    }

    fn offset(&self, position: u64) -> Option<usize> {
        if position < self.start || position >= self.end {
            None
        } else {
            Some((position - self.start) as usize)
        }
    }

    /// Whether `symbol` has enough support anywhere in the inclusive range
    /// `[start, end]` (`end` defaults to `start`).
    ///
    /// A `start` outside the window, or a range whose columns carry no reads,
    /// answers `false`. `end` is clipped to the window.
    pub fn query(&self, symbol: Symbol, start: u64, end: Option<u64>) -> bool {
        let Some(first) = self.offset(start) else {
            return false;
        };
        let end = end.unwrap_or(start);
        if end < start {
            return false;
        }
        let last = ((end - self.start) as usize).min(self.len() - 1);

        match symbol.row() {
            None => {
                let inserted: u64 = self.insertions[first..=last].iter().map(|&n| n as u64).sum();
                let total: u64 = (first..=last).map(|o| self.column_total(o) as u64).sum();
                total > 0 && inserted as f64 / total as f64 > INSERTION_FRACTION
            }
            Some(row) => {
                let threshold = if symbol == Symbol::Del {
                    DELETION_FRACTION
                } else {
                    NUCLEOTIDE_FRACTION
                };
                (first..=last).any(|offset| {
                    let total = self.column_total(offset);
                    total > 0 && self.counts[row][offset] as f64 / total as f64 > threshold
                })
            }
        }
    }
}

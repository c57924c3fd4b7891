use std::path::Path;

use anyhow::{Context, Result};
use log::{debug, warn};
use thiserror::Error;

use crate::region::{match_chrom_format, Region, Strand};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CigarParseError {
    #[error("missing length before CIGAR operation '{op}' in '{cigar}'")]
    MissingLength { op: char, cigar: String },
    #[error("unsupported CIGAR operation '{op}' in '{cigar}'")]
    UnsupportedOp { op: char, cigar: String },
    #[error("CIGAR '{0}' ends without an operation")]
    Truncated(String),
}

/// Simplified CIGAR operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CigarOp {
    /// Alignment match (can be sequence match or mismatch).
    Match(u32),
    /// Insertion to the reference.
    Insertion(u32),
    /// Deletion from the reference.
    Deletion(u32),
    /// Skipped reference region, e.g. an intron in a spliced alignment.
    Skip(u32),
    /// Soft clip (bases present in read but not aligned).
    SoftClip(u32),
    /// Hard clip (bases not present in read).
    HardClip(u32),
}

impl CigarOp {
    /// Number of bases this operation consumes on the reference.
    pub fn ref_len(&self) -> u32 {
        match self {
            CigarOp::Match(n) | CigarOp::Deletion(n) | CigarOp::Skip(n) => *n,
            CigarOp::Insertion(_) | CigarOp::SoftClip(_) | CigarOp::HardClip(_) => 0,
        }
    }

    /// Number of bases this operation consumes on the read.
    pub fn read_len(&self) -> u32 {
        match self {
            CigarOp::Match(n) | CigarOp::Insertion(n) | CigarOp::SoftClip(n) => *n,
            CigarOp::Deletion(_) | CigarOp::Skip(_) | CigarOp::HardClip(_) => 0,
        }
    }
}

/// Parse a SAM-style CIGAR string such as `5S10M2I3M1D4M`.
///
/// `=` and `X` are folded into [`CigarOp::Match`]; `*` yields an empty list.
pub fn parse_cigar(cigar: &str) -> Result<Vec<CigarOp>, CigarParseError> {
    if cigar == "*" {
        return Ok(Vec::new());
    }

    let mut ops = Vec::new();
    let mut len: Option<u32> = None;

    for c in cigar.chars() {
        if let Some(digit) = c.to_digit(10) {
            len = Some(len.unwrap_or(0).saturating_mul(10).saturating_add(digit));
            continue;
        }
        let n = len.take().ok_or_else(|| CigarParseError::MissingLength {
            op: c,
            cigar: cigar.to_string(),
        })?;
        let op = match c {
            'M' | '=' | 'X' => CigarOp::Match(n),
            'I' => CigarOp::Insertion(n),
            'D' => CigarOp::Deletion(n),
            'N' => CigarOp::Skip(n),
            'S' => CigarOp::SoftClip(n),
            'H' => CigarOp::HardClip(n),
            _ => {
                return Err(CigarParseError::UnsupportedOp {
                    op: c,
                    cigar: cigar.to_string(),
                });
            }
        };
        ops.push(op);
    }

    if len.is_some() {
        return Err(CigarParseError::Truncated(cigar.to_string()));
    }
    Ok(ops)
}

/// A single alignment record, 0-based half-open on the reference.
#[derive(Debug, Clone)]
pub struct AlignedRead {
    /// Read name / query name.
    pub name: String,
    /// Chromosome / reference name the read is aligned to.
    pub chrom: String,
    /// 0-based start position on the reference.
    pub start: u64,
    /// 0-based exclusive end on the reference, derived from the CIGAR.
    pub end: u64,
    /// CIGAR operations describing the alignment.
    pub cigar: Vec<CigarOp>,
    /// Read sequence (ASCII bases), empty when the record carries none.
    pub sequence: Vec<u8>,
    pub is_reverse: bool,
    pub is_unmapped: bool,
    pub is_secondary: bool,
    pub is_proper_pair: bool,
    /// 0-based start of the mate alignment, if the record is paired.
    pub mate_start: Option<u64>,
}

impl AlignedRead {
    /// A mapped, primary, unpaired forward-strand read.
    pub fn new(
        name: impl Into<String>,
        chrom: impl Into<String>,
        start: u64,
        cigar: Vec<CigarOp>,
        sequence: impl Into<Vec<u8>>,
    ) -> Self {
        let ref_consumed: u64 = cigar.iter().map(|op| op.ref_len() as u64).sum();
        Self {
            name: name.into(),
            chrom: chrom.into(),
            start,
            end: start + ref_consumed,
            cigar,
            sequence: sequence.into(),
            is_reverse: false,
            is_unmapped: false,
            is_secondary: false,
            is_proper_pair: false,
            mate_start: None,
        }
    }

    pub fn reversed(mut self) -> Self {
        self.is_reverse = true;
        self
    }

    pub fn secondary(mut self) -> Self {
        self.is_secondary = true;
        self
    }

    pub fn with_mate(mut self, mate_start: u64, is_proper_pair: bool) -> Self {
        self.mate_start = Some(mate_start);
        self.is_proper_pair = is_proper_pair;
        self
    }

    pub fn strand(&self) -> Strand {
        Strand::from_reverse_flag(self.is_reverse)
    }
}

/// Reader for indexed BAM files.
pub struct AlignmentReader;

impl AlignmentReader {
    /// Read every alignment overlapping `region` from a sorted, indexed (.bai) BAM file.
    ///
    /// Unmapped records that still carry a position are kept with `is_unmapped` set;
    /// filtering is left to the tracks.
    pub fn read_bam(path: &Path, region: &Region) -> Result<Vec<AlignedRead>> {
        let mut reader = noodles::bam::io::indexed_reader::Builder::default()
            .build_from_path(path)
            .with_context(|| format!("failed to open BAM file: {}", path.display()))?;

        let header = reader.read_header().context("failed to read BAM header")?;

        let chrom = match_chrom_format(
            &region.chrom,
            header
                .reference_sequences()
                .keys()
                .map(|name| std::str::from_utf8(name.as_ref()).unwrap_or_default()),
        );
        // noodles regions are 1-based and inclusive.
        let region_str = format!("{}:{}-{}", chrom, region.start + 1, region.end);
        let query_region: noodles::core::Region = region_str
            .parse()
            .with_context(|| format!("failed to parse region: {region_str}"))?;

        let mut reads = Vec::new();
        let query = reader
            .query(&header, &query_region)
            .context("failed to query BAM region")?;

        for result in query {
            let record = result.context("failed to read BAM record")?;
            if let Some(mut read) = Self::convert_bam_record(&record, &header)? {
                // report under the caller's naming (`chr1` vs `1`)
                read.chrom.clone_from(&region.chrom);
                reads.push(read);
            }
        }

        debug!("read {} alignments from {} over {}", reads.len(), path.display(), region);
        Ok(reads)
    }

    fn convert_bam_record(
        record: &noodles::bam::Record,
        header: &noodles::sam::Header,
    ) -> Result<Option<AlignedRead>> {
        let name = record
            .name()
            .map(|n| String::from_utf8_lossy(n).into_owned())
            .unwrap_or_else(|| "unknown".to_string());

        let flags = record.flags();

        let ref_seq_id = match record.reference_sequence_id() {
            Some(Ok(id)) => id,
            Some(Err(e)) => return Err(e).context("failed to read reference sequence ID"),
            None => return Ok(None),
        };

        let chrom = header
            .reference_sequences()
            .get_index(ref_seq_id)
            .map(|(name, _)| name.to_string())
            .unwrap_or_else(|| "unknown".to_string());

        let start = match record.alignment_start() {
            Some(Ok(p)) => p.get() as u64 - 1,
            Some(Err(e)) => return Err(e).context("failed to read alignment start"),
            None => return Ok(None),
        };

        let mate_start = match record.mate_alignment_start() {
            Some(Ok(p)) => Some(p.get() as u64 - 1),
            Some(Err(e)) => return Err(e).context("failed to read mate alignment start"),
            None => None,
        };

        let cigar = Self::convert_cigar(record.cigar().iter())
            .with_context(|| format!("invalid CIGAR in record {name}"))?;

        let sequence: Vec<u8> = (0..record.sequence().len())
            .filter_map(|i| record.sequence().get(i))
            .collect();

        let mut read = AlignedRead::new(name, chrom, start, cigar, sequence);
        read.is_reverse = flags.is_reverse_complemented();
        read.is_unmapped = flags.is_unmapped();
        read.is_secondary = flags.is_secondary();
        read.is_proper_pair = flags.is_properly_segmented();
        read.mate_start = mate_start;
        Ok(Some(read))
    }

    fn convert_cigar<I>(ops: I) -> Result<Vec<CigarOp>>
    where
        I: IntoIterator<Item = std::io::Result<noodles::sam::alignment::record::cigar::Op>>,
    {
        use noodles::sam::alignment::record::cigar::op::Kind;

        let mut converted = Vec::new();
        for result in ops {
            let op = result.context("failed to read CIGAR operation")?;
            let len = op.len() as u32;
            converted.push(match op.kind() {
                Kind::Match | Kind::SequenceMatch | Kind::SequenceMismatch => CigarOp::Match(len),
                Kind::Insertion => CigarOp::Insertion(len),
                Kind::Deletion => CigarOp::Deletion(len),
                Kind::Skip => CigarOp::Skip(len),
                Kind::SoftClip => CigarOp::SoftClip(len),
                Kind::HardClip => CigarOp::HardClip(len),
                Kind::Pad => {
                    warn!("ignoring padding CIGAR operation");
                    continue;
                }
            });
        }
        Ok(converted)
    }
}

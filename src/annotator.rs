//! Per-base decorations of an aligned read, projected into pixel space.

use crate::alignment::{AlignedRead, CigarOp};
use crate::consensus::{MismatchCounts, Symbol};
use crate::reference::reverse_complement;
use crate::region::Strand;
use crate::scale::{Scale, ScaleError};

/// Tunables of the CIGAR walk.
#[derive(Debug, Clone)]
pub struct AnnotatorConfig {
    /// Indels must be strictly longer than this to be drawn.
    pub min_indel_size: u32,
    /// Clips at least this long are always drawn.
    pub min_clip_size: u32,
    /// Minimum pixel width of mismatch and insertion ticks; clips get twice this.
    pub min_width: f64,
    /// Insertions at least this long get a length label when zoomed to base level.
    pub insertion_label_min_length: u32,
}

impl Default for AnnotatorConfig {
    fn default() -> Self {
        Self {
            min_indel_size: 0,
            min_clip_size: 5,
            min_width: 2.0,
            insertion_label_min_length: 10,
        }
    }
}

/// A decoration to draw on top of a read, in track-local pixels.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoration {
    Mismatch { base: u8, x: f64, width: f64 },
    Deletion { x: f64, width: f64 },
    Insertion { x: f64, width: f64, length: u32, labelled: bool },
    Clip { x: f64, width: f64, length: u32 },
}

impl Decoration {
    pub fn x(&self) -> f64 {
        match self {
            Decoration::Mismatch { x, .. }
            | Decoration::Deletion { x, .. }
            | Decoration::Insertion { x, .. }
            | Decoration::Clip { x, .. } => *x,
        }
    }

    pub fn width(&self) -> f64 {
        match self {
            Decoration::Mismatch { width, .. }
            | Decoration::Deletion { width, .. }
            | Decoration::Insertion { width, .. }
            | Decoration::Clip { width, .. } => *width,
        }
    }
}

/// Walks a read's CIGAR against the reference visible through a [`Scale`].
///
/// When `consensus` is set, mismatches, deletions and insertions are only
/// emitted if the tallied evidence supports them. Clips are never filtered.
pub struct CigarAnnotator<'a> {
    scale: &'a Scale,
    consensus: Option<&'a MismatchCounts>,
    config: &'a AnnotatorConfig,
}

impl<'a> CigarAnnotator<'a> {
    pub fn new(scale: &'a Scale, consensus: Option<&'a MismatchCounts>, config: &'a AnnotatorConfig) -> Self {
        Self {
            scale,
            consensus,
            config,
        }
    }

    fn supported(&self, symbol: Symbol, start: u64, end: u64) -> bool {
        match self.consensus {
            Some(counts) => counts.query(symbol, start, Some(end)),
            None => true,
        }
    }

    /// Tick of at least `min_width` pixels centred on the genomic span `[start, end)`.
    fn centred(&self, start: f64, end: f64, min_width: f64) -> (f64, f64) {
        let left = self.scale.to_pixels(start);
        let right = self.scale.to_pixels(end);
        let width = (right - left).max(min_width);
        ((left + right) / 2.0 - width / 2.0, width)
    }

    /// Forward-strand reference bases of `[start, end)`, which must lie in the window.
    fn forward_reference(&self, start: u64, end: u64) -> Result<Vec<u8>, ScaleError> {
        let bases = self.scale.get_seq(Some(start), Some(end), None)?;
        Ok(match self.scale.strand() {
            Strand::Plus => bases,
            Strand::Minus => reverse_complement(&bases),
        })
    }

    /// Decorations for one read. Mismatches need a reference on the scale;
    /// without one only indels and clips are reported.
    pub fn annotate(&self, read: &AlignedRead) -> Result<Vec<Decoration>, ScaleError> {
        let mut decorations = Vec::new();
        if read.is_secondary || read.is_unmapped {
            return Ok(decorations);
        }

        let window_start = self.scale.start();
        let window_end = self.scale.end();
        let mut genome_pos = read.start;
        let mut query_pos = 0usize;

        for op in &read.cigar {
            match *op {
                CigarOp::Match(n) => {
                    let run_end = genome_pos + n as u64;
                    let lo = genome_pos.max(window_start);
                    let hi = run_end.min(window_end);
                    if lo < hi && self.scale.has_source() {
                        let reference = self.forward_reference(lo, hi)?;
                        for pos in lo..hi {
                            let Some(&alt) = read.sequence.get(query_pos + (pos - genome_pos) as usize) else {
                                break;
                            };
                            let alt = alt.to_ascii_uppercase();
                            let ref_base = reference[(pos - lo) as usize];
                            if alt == ref_base || alt == b'N' {
                                continue;
                            }
                            let keep = match (self.consensus, Symbol::from_base(alt)) {
                                (None, _) => true,
                                (Some(counts), Some(symbol)) => counts.query(symbol, pos, None),
                                (Some(_), None) => false,
                            };
                            if keep {
                                let (x, width) = self.centred(pos as f64, pos as f64 + 1.0, self.config.min_width);
                                decorations.push(Decoration::Mismatch { base: alt, x, width });
                            }
                        }
                    }
                    genome_pos = run_end;
                    query_pos += n as usize;
                }
                CigarOp::Deletion(n) => {
                    let run_end = genome_pos + n as u64;
                    if n > self.config.min_indel_size && self.supported(Symbol::Del, genome_pos, run_end - 1) {
                        let x = self.scale.to_pixels(genome_pos as f64);
                        let width = self.scale.to_pixels(run_end as f64) - x;
                        decorations.push(Decoration::Deletion { x, width });
                    }
                    genome_pos = run_end;
                }
                CigarOp::Skip(n) => {
                    genome_pos += n as u64;
                }
                CigarOp::Insertion(n) => {
                    if n > self.config.min_indel_size
                        && self.supported(Symbol::Ins, genome_pos.saturating_sub(2), genome_pos + 2)
                    {
                        let anchor = genome_pos as f64;
                        let (x, width) = self.centred(anchor - 0.5, anchor + 0.5, self.config.min_width);
                        let labelled = n >= self.config.insertion_label_min_length
                            && self.scale.rel_pixels(1.0) >= 1.0;
                        decorations.push(Decoration::Insertion {
                            x,
                            width,
                            length: n,
                            labelled,
                        });
                    }
                    query_pos += n as usize;
                }
                CigarOp::SoftClip(n) | CigarOp::HardClip(n) => {
                    if n >= self.config.min_clip_size {
                        let anchor = genome_pos as f64;
                        let (x, width) = self.centred(anchor - 0.5, anchor + 0.5, self.config.min_width * 2.0);
                        decorations.push(Decoration::Clip { x, width, length: n });
                    }
                    if matches!(op, CigarOp::SoftClip(_)) {
                        query_pos += n as usize;
                    }
                }
            }
        }

        Ok(decorations)
    }
}

use std::cell::RefCell;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::reference::{ReferenceError, ReferenceSource};
use crate::region::{Region, Strand};

#[derive(Error, Debug)]
pub enum ScaleError {
    #[error("end coordinate must be greater than start coordinate; got {chrom}:{start}-{end}")]
    InvalidRegion { chrom: String, start: u64, end: u64 },
    #[error("pixel width must be positive and finite, got {0}")]
    InvalidPixelWidth(f64),
    #[error("sequence {start}-{end} lies outside the visible window {window_start}-{window_end}")]
    OutOfRange {
        start: u64,
        end: u64,
        window_start: u64,
        window_end: u64,
    },
    #[error("requested strand {requested} does not match the view strand {view}")]
    StrandMismatch { requested: Strand, view: Strand },
    #[error("no reference sequence source is attached to this view")]
    NoReference,
    #[error(transparent)]
    Reference(#[from] ReferenceError),
}

/// Fetched reference bases plus the pixel width they were fetched under.
#[derive(Debug, Clone, Default)]
struct SequenceCache {
    token: Option<f64>,
    bases: Option<Vec<u8>>,
}

/// Projection of one genomic interval onto a horizontal pixel extent.
///
/// The pixel width starts at one pixel per base and is set by the owning view
/// at layout time. The visible window's reference bases are fetched lazily on
/// the first sequence query and kept until the pixel width changes.
#[derive(Clone)]
pub struct Scale {
    chrom: String,
    start: u64,
    end: u64,
    strand: Strand,
    source: Option<Arc<dyn ReferenceSource>>,
    pixel_width: f64,
    bases_per_pixel: f64,
    cache: RefCell<SequenceCache>,
}

impl Scale {
    pub fn new(chrom: impl Into<String>, start: u64, end: u64, strand: Strand) -> Result<Self, ScaleError> {
        let chrom = chrom.into();
        if end <= start {
            return Err(ScaleError::InvalidRegion { chrom, start, end });
        }
        let length = (end - start) as f64;
        Ok(Self {
            chrom,
            start,
            end,
            strand,
            source: None,
            pixel_width: length,
            bases_per_pixel: 1.0,
            cache: RefCell::new(SequenceCache::default()),
        })
    }

    pub fn from_region(region: &Region, strand: Strand) -> Result<Self, ScaleError> {
        Self::new(region.chrom.clone(), region.start, region.end, strand)
    }

    pub fn with_source(mut self, source: Arc<dyn ReferenceSource>) -> Self {
        self.source = Some(source);
        self
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

    pub fn strand(&self) -> Strand {
        self.strand
    }

    pub fn has_source(&self) -> bool {
        self.source.is_some()
    }

    pub fn pixel_width(&self) -> f64 {
        self.pixel_width
    }

    pub fn bases_per_pixel(&self) -> f64 {
        self.bases_per_pixel
    }

    /// Set the pixel extent of the window. Recomputes `bases_per_pixel` only
    /// when the width actually changes.
    pub fn set_pixel_width(&mut self, pixel_width: f64) -> Result<(), ScaleError> {
        if !(pixel_width.is_finite() && pixel_width > 0.0) {
            return Err(ScaleError::InvalidPixelWidth(pixel_width));
        }
        if pixel_width != self.pixel_width {
            self.pixel_width = pixel_width;
            self.bases_per_pixel = (self.end - self.start) as f64 / pixel_width;
        }
        Ok(())
    }

    /// Pixel offset of a genomic position from the left edge. Not clamped:
    /// off-screen positions map to negative or beyond-width values.
    pub fn to_pixels(&self, position: f64) -> f64 {
        (position - self.start as f64) / self.bases_per_pixel
    }

    /// Pixel length of a genomic length.
    pub fn rel_pixels(&self, length: f64) -> f64 {
        length / self.bases_per_pixel
    }

    /// Whether a genomic position falls inside the visible window.
    pub fn contains(&self, position: u64) -> bool {
        position >= self.start && position < self.end
    }

    /// Reference bases of `[start, end)` (default: the whole window) on the
    /// view's strand. Requests must lie inside the window; a requested strand
    /// other than the view's own is rejected.
    pub fn get_seq(
        &self,
        start: Option<u64>,
        end: Option<u64>,
        strand: Option<Strand>,
    ) -> Result<Vec<u8>, ScaleError> {
        let start = start.unwrap_or(self.start);
        let end = end.unwrap_or(self.end);
        if start < self.start || end > self.end || start > end {
            return Err(ScaleError::OutOfRange {
                start,
                end,
                window_start: self.start,
                window_end: self.end,
            });
        }
        let requested = strand.unwrap_or(self.strand);
        if requested != self.strand {
            return Err(ScaleError::StrandMismatch {
                requested,
                view: self.strand,
            });
        }
        let source = self.source.as_ref().ok_or(ScaleError::NoReference)?;

        let mut cache = self.cache.borrow_mut();
        if cache.token != Some(self.pixel_width) {
            cache.token = Some(self.pixel_width);
            cache.bases = None;
        }
        if cache.bases.is_none() {
            let mut bases = source.get_sequence(&self.chrom, self.start, self.end, self.strand)?;
            bases.make_ascii_uppercase();
            cache.bases = Some(bases);
        }
        let Some(bases) = cache.bases.as_ref() else {
            return Err(ScaleError::NoReference);
        };

        // A minus-strand window is stored reverse-complemented, so genomic
        // offsets count from the right-hand end.
        let (lo, hi) = match self.strand {
            Strand::Plus => (start - self.start, end - self.start),
            Strand::Minus => (self.end - end, self.end - start),
        };
        let (lo, hi) = (lo as usize, hi as usize);
        if hi > bases.len() {
            return Err(ScaleError::Reference(ReferenceError::OutOfBounds {
                chrom: self.chrom.clone(),
                start,
                end,
                len: self.start + bases.len() as u64,
            }));
        }
        Ok(bases[lo..hi].to_vec())
    }
}

impl fmt::Debug for Scale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scale")
            .field("chrom", &self.chrom)
            .field("start", &self.start)
            .field("end", &self.end)
            .field("strand", &self.strand)
            .field("pixel_width", &self.pixel_width)
            .field("bases_per_pixel", &self.bases_per_pixel)
            .finish_non_exhaustive()
    }
}

use std::fmt;

use crate::region::Strand;

/// An identified genomic span to be placed in a row.
#[derive(Debug, Clone, PartialEq)]
pub struct Interval {
    /// Unique within one track layout pass.
    pub id: String,
    pub chrom: String,
    pub start: u64,
    pub end: u64,
    pub strand: Strand,
    pub label: Option<String>,
    /// Index of the originating record in the owning track's record list.
    pub source: Option<usize>,
}

impl Interval {
    pub fn new(id: impl Into<String>, chrom: impl Into<String>, start: u64, end: u64, strand: Strand) -> Self {
        Self {
            id: id.into(),
            chrom: chrom.into(),
            start,
            end,
            strand,
            label: None,
            source: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_source(mut self, index: usize) -> Self {
        self.source = Some(index);
        self
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}-{}{}", self.chrom, self.start, self.end, self.strand)
    }
}

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RegionError {
    #[error("invalid region format: expected 'chr:start-end', got '{0}'")]
    InvalidFormat(String),
    #[error("invalid coordinate: {0}")]
    InvalidCoordinate(#[from] std::num::ParseIntError),
    #[error("end ({end}) must be greater than start ({start})")]
    InvalidRange { start: u64, end: u64 },
    #[error("invalid strand '{0}': expected '+' or '-'")]
    InvalidStrand(String),
}

/// Orientation of a feature or of a view relative to the reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Strand {
    #[default]
    Plus,
    Minus,
}

impl Strand {
    pub fn from_reverse_flag(is_reverse: bool) -> Self {
        if is_reverse { Strand::Minus } else { Strand::Plus }
    }
}

impl fmt::Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strand::Plus => write!(f, "+"),
            Strand::Minus => write!(f, "-"),
        }
    }
}

impl FromStr for Strand {
    type Err = RegionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "+" => Ok(Strand::Plus),
            "-" => Ok(Strand::Minus),
            other => Err(RegionError::InvalidStrand(other.to_string())),
        }
    }
}

/// A genomic region `chrom:start-end` using 0-based, half-open coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Region {
    pub chrom: String,
    pub start: u64,
    pub end: u64,
}

impl Region {
    pub fn new(chrom: impl Into<String>, start: u64, end: u64) -> Result<Self, RegionError> {
        if end <= start {
            return Err(RegionError::InvalidRange { start, end });
        }
        Ok(Self {
            chrom: chrom.into(),
            start,
            end,
        })
    }

    /// Length of the region in bases.
    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}-{}", self.chrom, self.start, self.end)
    }
}

impl FromStr for Region {
    type Err = RegionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (chrom, rest) = s
            .rsplit_once(':')
            .ok_or_else(|| RegionError::InvalidFormat(s.to_string()))?;
        let (start_str, end_str) = rest
            .split_once('-')
            .ok_or_else(|| RegionError::InvalidFormat(s.to_string()))?;
        if chrom.is_empty() {
            return Err(RegionError::InvalidFormat(s.to_string()));
        }
        let start: u64 = start_str.replace(',', "").parse()?;
        let end: u64 = end_str.replace(',', "").parse()?;
        Region::new(chrom, start, end)
    }
}

/// Resolve `chrom` against the names a data source actually uses, tolerating
/// `chr1` vs `1` naming differences. Returns `chrom` unchanged when nothing matches.
pub fn match_chrom_format<'a, I>(chrom: &str, names: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let alternative = match chrom.strip_prefix("chr") {
        Some(stripped) => stripped.to_string(),
        None => format!("chr{chrom}"),
    };

    let mut found_alternative = false;
    for name in names {
        if name == chrom {
            return chrom.to_string();
        }
        if name == alternative {
            found_alternative = true;
        }
    }

    if found_alternative {
        alternative
    } else {
        chrom.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_region() {
        let r: Region = "chr1:1000-2000".parse().unwrap();
        assert_eq!(r.chrom, "chr1");
        assert_eq!(r.start, 1000);
        assert_eq!(r.end, 2000);
        assert_eq!(r.len(), 1000);
    }

    #[test]
    fn test_parse_with_commas() {
        let r: Region = "chr3:178,780,124-179,038,684".parse().unwrap();
        assert_eq!(r.start, 178_780_124);
        assert_eq!(r.end, 179_038_684);
    }

    #[test]
    fn test_parse_invalid_format() {
        assert!("chr1".parse::<Region>().is_err());
        assert!("chr1:1000".parse::<Region>().is_err());
        assert!("chr1:abc-def".parse::<Region>().is_err());
        assert!(":1-2".parse::<Region>().is_err());
        assert!("".parse::<Region>().is_err());
    }

    #[test]
    fn test_empty_and_inverted_ranges_rejected() {
        assert!(Region::new("chr1", 2000, 1000).is_err());
        assert!(Region::new("chr1", 100, 100).is_err());
        assert!(Region::new("chr1", 100, 101).is_ok());
    }

    #[test]
    fn test_invalid_range_error_message() {
        let err = Region::new("chr1", 200, 100).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("200"));
        assert!(msg.contains("100"));
    }

    #[test]
    fn test_parse_roundtrip() {
        let original = Region::new("chrX", 12345, 67890).unwrap();
        let parsed: Region = original.to_string().parse().unwrap();
        assert_eq!(original, parsed);
    }

    #[test]
    fn test_strand_parse_and_display() {
        assert_eq!("+".parse::<Strand>().unwrap(), Strand::Plus);
        assert_eq!("-".parse::<Strand>().unwrap(), Strand::Minus);
        assert!(".".parse::<Strand>().is_err());
        assert_eq!(Strand::Minus.to_string(), "-");
        assert_eq!(Strand::from_reverse_flag(true), Strand::Minus);
    }

    #[test]
    fn test_match_chrom_format() {
        let names = ["chr1", "chr2"];
        assert_eq!(match_chrom_format("chr1", names), "chr1");
        assert_eq!(match_chrom_format("1", names), "chr1");
        assert_eq!(match_chrom_format("chrX", names), "chrX");

        let bare = ["4", "5"];
        assert_eq!(match_chrom_format("chr4", bare), "4");
        assert_eq!(match_chrom_format("4", bare), "4");
    }
}

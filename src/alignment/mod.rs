pub mod reader;

pub use reader::{parse_cigar, AlignedRead, AlignmentReader, CigarOp, CigarParseError};

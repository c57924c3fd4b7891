//! Quick-consensus evidence: per-column tallies across all reads in a window.

pub mod counts;

pub use counts::{MismatchCounts, Symbol};

pub mod bed;

pub use bed::{read_bed, Transcript};

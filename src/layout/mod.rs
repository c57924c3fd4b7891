//! Row packing of overlapping intervals.

pub mod interval;
pub mod packer;

pub use interval::Interval;
pub use packer::{LayoutError, RowPacker, LABEL_WIDTH_FACTOR};

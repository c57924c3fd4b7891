//! Drawing commands, the offset/clip renderer and the sinks that consume it.

pub mod command;
pub mod renderer;
pub mod sink;
pub mod svg;

use thiserror::Error;

use crate::layout::LayoutError;
use crate::scale::ScaleError;

pub use command::{Anchor, Commands, Direction, DrawCommand, Style};
pub use renderer::{Element, Frame, RenderStats, Renderer};
pub use sink::DrawingSink;
pub use svg::{escape_xml, SvgWriter};

#[derive(Error, Debug)]
pub enum RenderError {
    #[error(
        "sub-frame {width}x{height} at ({x}, {y}) does not fit inside its {parent_width}x{parent_height} parent"
    )]
    OversizedFrame {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        parent_width: f64,
        parent_height: f64,
    },
    #[error(transparent)]
    Layout(#[from] LayoutError),
    #[error(transparent)]
    Scale(#[from] ScaleError),
    #[error("failed to write drawing output: {0}")]
    Io(#[from] std::io::Error),
}

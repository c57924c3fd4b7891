use std::fmt;

use crate::render::RenderError;

/// Horizontal text alignment relative to the anchor point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Anchor {
    Start,
    #[default]
    Middle,
    End,
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Anchor::Start => "start",
            Anchor::Middle => "middle",
            Anchor::End => "end",
        };
        f.write_str(s)
    }
}

/// Direction an arrow points in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
}

/// Presentation attributes. Unset attributes are left to the sink's defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Style {
    pub fill: Option<String>,
    pub stroke: Option<String>,
    pub stroke_width: Option<f64>,
    pub opacity: Option<f64>,
    /// Element identifier, e.g. the read name of a drawn block.
    pub id: Option<String>,
}

impl Style {
    pub fn filled(color: impl Into<String>) -> Self {
        Self {
            fill: Some(color.into()),
            stroke: Some("none".to_string()),
            ..Self::default()
        }
    }

    pub fn stroked(color: impl Into<String>, width: f64) -> Self {
        Self {
            stroke: Some(color.into()),
            stroke_width: Some(width),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.opacity = Some(opacity);
        self
    }
}

/// A renderer-agnostic drawing instruction in pixel coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Line {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        style: Style,
    },
    Rect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        style: Style,
    },
    Text {
        x: f64,
        y: f64,
        text: String,
        size: f64,
        anchor: Anchor,
        style: Style,
    },
    /// A rectangle whose leading edge is drawn as an arrowhead.
    BlockArrow {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        arrow_width: f64,
        direction: Direction,
        style: Style,
    },
    /// A line with arrowheads at the given fractions of its length.
    ArrowLine {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        direction: Direction,
        arrows: Vec<f64>,
        arrow_scale: f64,
        filled: bool,
        style: Style,
    },
    BeginClip {
        id: usize,
        name: String,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
    EndClip,
}

impl DrawCommand {
    pub fn line(x1: f64, y1: f64, x2: f64, y2: f64, style: Style) -> Self {
        DrawCommand::Line { x1, y1, x2, y2, style }
    }

    pub fn rect(x: f64, y: f64, width: f64, height: f64, style: Style) -> Self {
        DrawCommand::Rect {
            x,
            y,
            width,
            height,
            style,
        }
    }

    pub fn text(x: f64, y: f64, text: impl Into<String>, size: f64, anchor: Anchor) -> Self {
        DrawCommand::Text {
            x,
            y,
            text: text.into(),
            size,
            anchor,
            style: Style::default(),
        }
    }

    /// Shift every coordinate by `(dx, dy)`.
    pub fn translate(mut self, dx: f64, dy: f64) -> Self {
        match &mut self {
            DrawCommand::Line { x1, y1, x2, y2, .. } | DrawCommand::ArrowLine { x1, y1, x2, y2, .. } => {
                *x1 += dx;
                *x2 += dx;
                *y1 += dy;
                *y2 += dy;
            }
            DrawCommand::Rect { x, y, .. }
            | DrawCommand::Text { x, y, .. }
            | DrawCommand::BlockArrow { x, y, .. }
            | DrawCommand::BeginClip { x, y, .. } => {
                *x += dx;
                *y += dy;
            }
            DrawCommand::EndClip => {}
        }
        self
    }
}

/// A single-pass stream of drawing commands.
///
/// Deliberately not `Clone`: a track's commands are produced once and
/// consumed once by the renderer.
pub struct Commands<'a> {
    inner: Box<dyn Iterator<Item = Result<DrawCommand, RenderError>> + 'a>,
}

impl<'a> Commands<'a> {
    pub fn new<I>(iter: I) -> Self
    where
        I: Iterator<Item = Result<DrawCommand, RenderError>> + 'a,
    {
        Self { inner: Box::new(iter) }
    }

    pub fn empty() -> Self {
        Self::new(std::iter::empty())
    }

    pub fn from_vec(commands: Vec<DrawCommand>) -> Self {
        Self::new(commands.into_iter().map(Ok))
    }

    /// Append another stream after this one.
    pub fn chain(self, other: Commands<'a>) -> Self {
        Self::new(self.inner.chain(other.inner))
    }
}

impl Iterator for Commands<'_> {
    type Item = Result<DrawCommand, RenderError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }
}

impl fmt::Debug for Commands<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Commands").finish_non_exhaustive()
    }
}

use log::debug;

use crate::render::{Commands, DrawCommand, DrawingSink, RenderError};

/// Tolerance for floating-point drift when checking sub-frame bounds.
const FRAME_EPSILON: f64 = 1e-6;

/// An absolute pixel rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Frame {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }
}

/// Counters returned from a render pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Elements rendered, each inside its own clip group.
    pub elements: usize,
    /// Commands handed to the sink, clip markers included.
    pub commands: usize,
}

/// Something that renders itself inside a clipped frame.
pub trait Element {
    fn name(&self) -> &str;

    fn pre_render(&self, _renderer: &mut Renderer<'_>) -> Result<(), RenderError> {
        Ok(())
    }

    fn render_contents(&self, renderer: &mut Renderer<'_>) -> Result<(), RenderError>;

    fn post_render(&self, _renderer: &mut Renderer<'_>) -> Result<(), RenderError> {
        Ok(())
    }
}

/// Draws into a sink relative to an absolute frame.
///
/// Coordinates handed to [`Renderer::draw`] are local to the frame and get
/// translated by its origin. Nested elements draw through a
/// [`Renderer::subrenderer`], which must fit inside the parent frame.
pub struct Renderer<'a> {
    sink: &'a mut dyn DrawingSink,
    stats: &'a mut RenderStats,
    frame: Frame,
}

impl<'a> Renderer<'a> {
    pub fn new(sink: &'a mut dyn DrawingSink, stats: &'a mut RenderStats, frame: Frame) -> Self {
        Self { sink, stats, frame }
    }

    pub fn frame(&self) -> Frame {
        self.frame
    }

    pub fn width(&self) -> f64 {
        self.frame.width
    }

    pub fn height(&self) -> f64 {
        self.frame.height
    }

    /// A renderer for a child rectangle at local offset `(x, y)`. Width and
    /// height default to the parent's. The child must not extend past the
    /// parent's right or bottom edge.
    pub fn subrenderer(
        &mut self,
        x: f64,
        y: f64,
        width: Option<f64>,
        height: Option<f64>,
    ) -> Result<Renderer<'_>, RenderError> {
        let width = width.unwrap_or(self.frame.width);
        let height = height.unwrap_or(self.frame.height);
        let fits = x >= -FRAME_EPSILON
            && y >= -FRAME_EPSILON
            && x + width <= self.frame.width + FRAME_EPSILON
            && y + height <= self.frame.height + FRAME_EPSILON;
        if !fits {
            return Err(RenderError::OversizedFrame {
                x,
                y,
                width,
                height,
                parent_width: self.frame.width,
                parent_height: self.frame.height,
            });
        }
        let frame = Frame::new(self.frame.x + x, self.frame.y + y, width, height);
        Ok(Renderer::new(&mut *self.sink, &mut *self.stats, frame))
    }

    /// Draw one command given in frame-local coordinates.
    pub fn draw(&mut self, command: DrawCommand) -> Result<(), RenderError> {
        self.sink.draw(command.translate(self.frame.x, self.frame.y))?;
        self.stats.commands += 1;
        Ok(())
    }

    /// Drain a command stream into the sink, stopping at the first error.
    pub fn draw_all(&mut self, commands: Commands<'_>) -> Result<(), RenderError> {
        for command in commands {
            self.draw(command?)?;
        }
        Ok(())
    }

    /// Render an element inside a clip group spanning this frame.
    pub fn render(&mut self, element: &dyn Element) -> Result<(), RenderError> {
        let id = self.stats.elements;
        self.stats.elements += 1;
        debug!("rendering '{}' into {:?}", element.name(), self.frame);

        self.sink.draw(DrawCommand::BeginClip {
            id,
            name: element.name().to_string(),
            x: self.frame.x,
            y: self.frame.y,
            width: self.frame.width,
            height: self.frame.height,
        })?;
        self.stats.commands += 1;

        element.pre_render(self)?;
        element.render_contents(self)?;
        element.post_render(self)?;

        self.sink.draw(DrawCommand::EndClip)?;
        self.stats.commands += 1;
        Ok(())
    }
}

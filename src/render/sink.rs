use crate::render::{DrawCommand, RenderError};

/// Receives the ordered command stream of a whole document.
pub trait DrawingSink {
    fn begin_document(&mut self, _width: f64, _height: f64) -> Result<(), RenderError> {
        Ok(())
    }

    fn draw(&mut self, command: DrawCommand) -> Result<(), RenderError>;

    fn end_document(&mut self) -> Result<(), RenderError> {
        Ok(())
    }
}

/// Records commands in order.
impl DrawingSink for Vec<DrawCommand> {
    fn draw(&mut self, command: DrawCommand) -> Result<(), RenderError> {
        self.push(command);
        Ok(())
    }
}

//! Render-target abstraction
//!
//! Highlights paint onto two stacked surfaces: a background surface for
//! under-text fills and a foreground surface for outlines on top of the
//! text. The trait keeps the paint path independent of any real display,
//! so it can run headless under test against a recording implementation.

use crate::geometry::Rect;

/// One raster paint target
pub trait RenderSurface {
    /// Wipe the whole surface
    fn clear(&mut self);

    /// Fill a rectangle with a CSS color at the given opacity
    fn fill_rect(&mut self, rect: Rect, color: &str, opacity: f32);

    /// Stroke a rectangle outline
    fn stroke_rect(&mut self, rect: Rect, color: &str, line_width: f32);

    /// Resize the backing raster, wiping its contents
    fn resize(&mut self, width: f32, height: f32);
}

// Lets a host keep an inspectable handle to a surface it hands the layer
impl<S: RenderSurface> RenderSurface for std::rc::Rc<std::cell::RefCell<S>> {
    fn clear(&mut self) {
        self.borrow_mut().clear();
    }

    fn fill_rect(&mut self, rect: Rect, color: &str, opacity: f32) {
        self.borrow_mut().fill_rect(rect, color, opacity);
    }

    fn stroke_rect(&mut self, rect: Rect, color: &str, line_width: f32) {
        self.borrow_mut().stroke_rect(rect, color, line_width);
    }

    fn resize(&mut self, width: f32, height: f32) {
        self.borrow_mut().resize(width, height);
    }
}

/// One recorded drawing call
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Clear,
    FillRect {
        rect: Rect,
        color: String,
        opacity: f32,
    },
    StrokeRect {
        rect: Rect,
        color: String,
        line_width: f32,
    },
    Resize {
        width: f32,
        height: f32,
    },
}

/// Surface that records every call instead of rasterizing
#[derive(Debug, Default)]
pub struct RecordingSurface {
    commands: Vec<DrawCommand>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Fill commands recorded since the most recent clear
    pub fn fills_since_clear(&self) -> Vec<&DrawCommand> {
        let start = self
            .commands
            .iter()
            .rposition(|c| matches!(c, DrawCommand::Clear))
            .map(|i| i + 1)
            .unwrap_or(0);
        self.commands[start..]
            .iter()
            .filter(|c| matches!(c, DrawCommand::FillRect { .. }))
            .collect()
    }
}

impl RenderSurface for RecordingSurface {
    fn clear(&mut self) {
        self.commands.push(DrawCommand::Clear);
    }

    fn fill_rect(&mut self, rect: Rect, color: &str, opacity: f32) {
        self.commands.push(DrawCommand::FillRect {
            rect,
            color: color.to_string(),
            opacity,
        });
    }

    fn stroke_rect(&mut self, rect: Rect, color: &str, line_width: f32) {
        self.commands.push(DrawCommand::StrokeRect {
            rect,
            color: color.to_string(),
            line_width,
        });
    }

    fn resize(&mut self, width: f32, height: f32) {
        self.commands.push(DrawCommand::Resize { width, height });
        self.commands.push(DrawCommand::Clear);
    }
}

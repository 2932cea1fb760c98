//! Highlight rendering engine
//!
//! Two stacked surfaces render every on-screen annotation: background
//! fills sit under the text, foreground outlines sit on top. The layer
//! listens to store mutations, selection changes, scroll, and resize,
//! coalesces them into at most one paint per frame, and delegates the
//! actual drawing to a pluggable painter. Viewport math stays in pure
//! functions so culling and offsetting are testable without a display.

mod layer;
mod painter;
mod surface;
mod viewport;

pub use layer::HighlightLayer;
pub use painter::{DefaultPainter, Formatter, HighlightPainter};
pub use surface::{DrawCommand, RecordingSurface, RenderSurface};
pub use viewport::{to_screen, Viewport, ViewportTracker, VisibilityChange};

//! Pluggable highlight painting
//!
//! Visual style is fully decoupled from layout and hit-testing: the layer
//! hands each on-screen annotation to the active painter together with both
//! surfaces. Painters must be pure with respect to annotation state so a
//! coalesced repaint with identical inputs draws identical output.

use crate::annotation::{AnnotationStyle, TextAnnotation};
use crate::geometry::Rect;

use super::surface::RenderSurface;

/// Per-annotation style override supplied by the host
pub type Formatter = Box<dyn Fn(&TextAnnotation, bool) -> Option<AnnotationStyle>>;

/// Strategy painting one annotation's rectangles
pub trait HighlightPainter {
    fn paint(
        &self,
        annotation: &TextAnnotation,
        rects: &[Rect],
        background: &mut dyn RenderSurface,
        foreground: &mut dyn RenderSurface,
        is_selected: bool,
        formatter: Option<&Formatter>,
    );
}

/// Stock painter: translucent fill behind the text, outline when selected
#[derive(Debug, Clone)]
pub struct DefaultPainter {
    pub selected_line_width: f32,
}

impl Default for DefaultPainter {
    fn default() -> Self {
        Self {
            selected_line_width: 1.5,
        }
    }
}

impl DefaultPainter {
    fn style_for(
        annotation: &TextAnnotation,
        is_selected: bool,
        formatter: Option<&Formatter>,
    ) -> AnnotationStyle {
        formatter
            .and_then(|f| f(annotation, is_selected))
            .or_else(|| annotation.style.clone())
            .unwrap_or_default()
    }
}

impl HighlightPainter for DefaultPainter {
    fn paint(
        &self,
        annotation: &TextAnnotation,
        rects: &[Rect],
        background: &mut dyn RenderSurface,
        foreground: &mut dyn RenderSurface,
        is_selected: bool,
        formatter: Option<&Formatter>,
    ) {
        let style = Self::style_for(annotation, is_selected, formatter);
        let opacity = style.opacity.unwrap_or(1.0);
        for rect in rects {
            background.fill_rect(*rect, &style.color, opacity);
            if is_selected {
                foreground.stroke_rect(*rect, &style.color, self.selected_line_width);
            }
        }
    }
}

//! Layout measurement
//!
//! The store needs client rectangles for live ranges but must not depend on
//! a real display, so measurement sits behind a trait the host implements
//! against its renderer. [`MonospaceLayout`] is a deterministic grid
//! implementation for tests and headless use.

use crate::dom::{utf16_len, DocumentTree, TextRange};
use crate::geometry::Rect;

/// Maps live ranges to container-relative client rectangles
///
/// A range that spans multiple visual lines decomposes into one rectangle
/// per line fragment, in reading order.
pub trait Layout {
    fn range_rects(&self, doc: &DocumentTree, range: &TextRange) -> Vec<Rect>;
}

/// Fixed-grid layout: the container's text flows left to right, wrapping
/// every `cols` characters, each character `char_width` x `line_height`.
#[derive(Debug, Clone)]
pub struct MonospaceLayout {
    pub cols: u32,
    pub char_width: f32,
    pub line_height: f32,
}

impl Default for MonospaceLayout {
    fn default() -> Self {
        Self {
            cols: 80,
            char_width: 8.0,
            line_height: 16.0,
        }
    }
}

impl MonospaceLayout {
    /// Document-order UTF-16 offset of a boundary point, from the start of
    /// the container's text content.
    fn global_offset(&self, doc: &DocumentTree, node: crate::dom::NodeId, offset: u32) -> Option<u32> {
        let mut total: u32 = 0;
        for text_node in doc.text_nodes_under(doc.root()) {
            if text_node == node {
                return Some(total + offset);
            }
            total += utf16_len(doc.text(text_node).unwrap_or(""));
        }
        None
    }
}

impl Layout for MonospaceLayout {
    fn range_rects(&self, doc: &DocumentTree, range: &TextRange) -> Vec<Rect> {
        let start = self.global_offset(doc, range.start.node, range.start.offset);
        let end = self.global_offset(doc, range.end.node, range.end.offset);
        let (start, end) = match (start, end) {
            (Some(s), Some(e)) if s < e => (s, e),
            _ => return Vec::new(),
        };

        let mut rects = Vec::new();
        let mut pos = start;
        while pos < end {
            let line = pos / self.cols;
            let col = pos % self.cols;
            let line_end = (line + 1) * self.cols;
            let fragment_end = end.min(line_end);
            rects.push(Rect::new(
                col as f32 * self.char_width,
                line as f32 * self.line_height,
                (fragment_end - pos) as f32 * self.char_width,
                self.line_height,
            ));
            pos = fragment_end;
        }
        rects
    }
}

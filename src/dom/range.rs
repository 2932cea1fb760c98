//! Live text ranges
//!
//! A [`TextRange`] is a pair of boundary points into the document tree.
//! Offsets are counted in UTF-16 code units to match native text-range
//! semantics; no Unicode normalization is applied anywhere.

use super::tree::{DocumentTree, NodeId};

/// Number of UTF-16 code units in a string
pub fn utf16_len(s: &str) -> u32 {
    s.encode_utf16().count() as u32
}

/// Substring by UTF-16 code-unit offsets
///
/// Boundaries falling inside a surrogate pair snap to the start of the
/// enclosing character.
pub fn slice_utf16(s: &str, start: u32, end: u32) -> String {
    let mut out = String::new();
    let mut units: u32 = 0;
    for ch in s.chars() {
        let width = ch.len_utf16() as u32;
        if units >= end {
            break;
        }
        if units >= start {
            out.push(ch);
        }
        units += width;
    }
    out
}

/// One boundary point: a text node plus a UTF-16 code-unit offset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextPosition {
    pub node: NodeId,
    pub offset: u32,
}

/// A contiguous span between two boundary points
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextRange {
    pub start: TextPosition,
    pub end: TextPosition,
}

impl TextRange {
    pub fn new(start: TextPosition, end: TextPosition) -> Self {
        Self { start, end }
    }

    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }

    /// The text spanned by this range, in document order
    ///
    /// Returns an empty string when the boundary nodes are not text nodes
    /// under the tree, or when the range is inverted.
    pub fn text(&self, doc: &DocumentTree) -> String {
        if self.start.node == self.end.node {
            return match doc.text(self.start.node) {
                Some(content) => slice_utf16(content, self.start.offset, self.end.offset),
                None => String::new(),
            };
        }

        let text_nodes = doc.text_nodes_under(doc.root());
        let start_idx = text_nodes.iter().position(|&n| n == self.start.node);
        let end_idx = text_nodes.iter().position(|&n| n == self.end.node);
        let (start_idx, end_idx) = match (start_idx, end_idx) {
            (Some(s), Some(e)) if s <= e => (s, e),
            _ => return String::new(),
        };

        let mut out = String::new();
        for (i, &node) in text_nodes[start_idx..=end_idx].iter().enumerate() {
            let content = match doc.text(node) {
                Some(c) => c,
                None => continue,
            };
            let from = if i == 0 { self.start.offset } else { 0 };
            let to = if node == self.end.node {
                self.end.offset
            } else {
                utf16_len(content)
            };
            out.push_str(&slice_utf16(content, from, to));
        }
        out
    }

    /// Whether the spanned text is empty or whitespace-only
    pub fn is_whitespace_or_empty(&self, doc: &DocumentTree) -> bool {
        self.text(doc).trim().is_empty()
    }
}

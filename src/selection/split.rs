//! Annotatable range splitting
//!
//! A single visual selection may cross regions explicitly excluded from
//! annotation (embedded widgets, popups). Such a selection is split into
//! the maximal sub-ranges that are individually annotatable; each becomes
//! one selector, bound together by a shared target.

use crate::annotation::RangeSelector;
use crate::codec::encode_position;
use crate::dom::{utf16_len, DocumentTree, NodeId, TextPosition, TextRange};

/// Split a live range into maximal annotatable sub-ranges
///
/// Text nodes inside subtrees marked with `excluded_class` break the run;
/// whitespace-only fragments are discarded.
pub fn split_annotatable_ranges(
    doc: &DocumentTree,
    range: &TextRange,
    excluded_class: &str,
) -> Vec<TextRange> {
    let text_nodes = doc.text_nodes_under(doc.root());
    let start_idx = text_nodes.iter().position(|&n| n == range.start.node);
    let end_idx = text_nodes.iter().position(|&n| n == range.end.node);
    let (start_idx, end_idx) = match (start_idx, end_idx) {
        (Some(s), Some(e)) if s <= e => (s, e),
        _ => return Vec::new(),
    };

    let mut out = Vec::new();
    let mut run: Option<(TextPosition, TextPosition)> = None;

    for &node in &text_nodes[start_idx..=end_idx] {
        let length = utf16_len(doc.text(node).unwrap_or(""));
        let from = if node == range.start.node {
            range.start.offset
        } else {
            0
        };
        let to = if node == range.end.node {
            range.end.offset
        } else {
            length
        };

        if doc.has_ancestor_class(node, excluded_class) {
            flush(doc, &mut run, &mut out);
            continue;
        }
        if from >= to {
            continue;
        }

        let fragment_start = TextPosition { node, offset: from };
        let fragment_end = TextPosition { node, offset: to };
        match &mut run {
            Some((_, end)) => *end = fragment_end,
            None => run = Some((fragment_start, fragment_end)),
        }
    }
    flush(doc, &mut run, &mut out);
    out
}

fn flush(doc: &DocumentTree, run: &mut Option<(TextPosition, TextPosition)>, out: &mut Vec<TextRange>) {
    if let Some((start, end)) = run.take() {
        let range = TextRange::new(start, end);
        if !range.is_whitespace_or_empty(doc) {
            out.push(range);
        }
    }
}

/// Encode one annotatable sub-range into a persisted selector
pub fn range_to_selector(
    doc: &DocumentTree,
    container: NodeId,
    range: &TextRange,
    tag_prefix: Option<&str>,
) -> Option<RangeSelector> {
    let start = encode_position(doc, container, range.start, tag_prefix)?;
    let end = encode_position(doc, container, range.end, tag_prefix)?;
    let selector = RangeSelector::new(start, end, range.text(doc));
    selector.set_cached_range(Some(*range));
    Some(selector)
}

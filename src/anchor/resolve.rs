//! Selector resolution
//!
//! The single entry point external renderers use to get a paintable range
//! from a persisted selector is [`selector_to_range`].

use thiserror::Error;
use tracing::{debug, warn};

use crate::annotation::RangeSelector;
use crate::codec::{decode_position, encode_position, resolve_element};
use crate::codec::PositionDescriptor;
use crate::dom::{utf16_len, DocumentTree, NodeId, TextPosition, TextRange};

/// Reanchoring failure
///
/// The affected selector is retained unchanged; callers exclude it from
/// rendering and hit-testing until a later document state re-resolves it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnchorError {
    #[error("No literal match for quote {quote:?} within the search bound")]
    Unanchored { quote: String },
}

/// Resolution parameters
#[derive(Debug, Clone)]
pub struct AnchorOptions {
    /// Synthetic per-step tag prefix applied by the rendering layer
    pub tag_prefix: Option<String>,
    /// Maximum number of elements visited by the local quote search
    pub scan_limit: usize,
}

impl Default for AnchorOptions {
    fn default() -> Self {
        Self {
            tag_prefix: None,
            scan_limit: 64,
        }
    }
}

/// Produce a live range whose boundaries are the decoded or reanchored
/// start and end positions of `selector`.
///
/// Decode failures and quote drift fall through to the bounded search;
/// only an exhausted search surfaces as [`AnchorError::Unanchored`]. The
/// selector's range cache is updated either way.
pub fn selector_to_range(
    doc: &DocumentTree,
    container: NodeId,
    selector: &RangeSelector,
    opts: &AnchorOptions,
) -> Result<TextRange, AnchorError> {
    let prefix = opts.tag_prefix.as_deref();

    let decoded = decode_position(doc, container, &selector.start, prefix).and_then(|start| {
        decode_position(doc, container, &selector.end, prefix).map(|end| TextRange::new(start, end))
    });

    match decoded {
        Ok(range) if range.text(doc) == selector.quote => {
            selector.set_cached_range(Some(range));
            return Ok(range);
        }
        Ok(_) => {
            debug!(quote = %selector.quote, "quote drifted from decoded position, reanchoring");
        }
        Err(failure) => {
            debug!(%failure, quote = %selector.quote, "exact path failed to resolve, reanchoring");
        }
    }

    match reanchor(doc, container, selector, opts) {
        Some(range) => {
            selector.set_cached_range(Some(range));
            Ok(range)
        }
        None => {
            selector.set_cached_range(None);
            warn!(
                quote = %selector.quote,
                path = %selector.start,
                "selector could not be reanchored, marking unanchored"
            );
            Err(AnchorError::Unanchored {
                quote: selector.quote.clone(),
            })
        }
    }
}

/// Bounded local search for an exact literal match of the quote
///
/// Scans elements in document order outward from the deepest resolvable
/// position of the original path, visiting at most `scan_limit` elements,
/// and prefers the match whose re-encoded path needs the fewest step edits
/// relative to the original descriptor.
fn reanchor(
    doc: &DocumentTree,
    container: NodeId,
    selector: &RangeSelector,
    opts: &AnchorOptions,
) -> Option<TextRange> {
    if selector.quote.is_empty() {
        return None;
    }
    let prefix = opts.tag_prefix.as_deref();

    let anchor = nearest_resolvable(doc, container, &selector.start, prefix);

    // The container and the anchor's ancestors contain the whole region's
    // text; admitting them would turn the bounded scan into a global
    // search through their concatenated content.
    let elements: Vec<NodeId> = doc
        .elements_under(container)
        .into_iter()
        .filter(|&e| e != container && !(e != anchor && doc.contains(e, anchor)))
        .collect();
    let anchor_idx = elements.iter().position(|&e| e == anchor).unwrap_or(0);

    let mut best: Option<(u32, TextRange)> = None;

    for element in outward(&elements, anchor_idx).take(opts.scan_limit) {
        let range = match find_quote_in_element(doc, element, &selector.quote) {
            Some(range) => range,
            None => continue,
        };

        // Rank by structural closeness of the re-encoded start path
        let distance = encode_position(doc, container, range.start, prefix)
            .map(|d| d.step_distance(&selector.start))
            .unwrap_or(u32::MAX);

        if best.as_ref().map_or(true, |(d, _)| distance < *d) {
            best = Some((distance, range));
        }
    }

    best.map(|(_, range)| range)
}

/// Deepest element reachable along a prefix of the descriptor's path
fn nearest_resolvable(
    doc: &DocumentTree,
    container: NodeId,
    descriptor: &PositionDescriptor,
    tag_prefix: Option<&str>,
) -> NodeId {
    let mut len = descriptor.steps.len();
    loop {
        if let Ok(element) = resolve_element(doc, container, &descriptor.steps[..len], tag_prefix) {
            return element;
        }
        if len == 0 {
            return container;
        }
        len -= 1;
    }
}

/// Visit indices i, i+1, i-1, i+2, i-2, ... clamped to the slice
fn outward<'a>(elements: &'a [NodeId], center: usize) -> impl Iterator<Item = NodeId> + 'a {
    let len = elements.len();
    (0..2 * len.max(1)).filter_map(move |step| {
        let idx = if step % 2 == 0 {
            center.checked_add(step / 2)
        } else {
            center.checked_sub(step / 2 + 1)
        }?;
        if idx < len {
            Some(elements[idx])
        } else {
            None
        }
    })
}

/// First exact occurrence of `quote` within the element's concatenated
/// text content, mapped back to text-node boundaries.
fn find_quote_in_element(doc: &DocumentTree, element: NodeId, quote: &str) -> Option<TextRange> {
    let content = doc.text_content(element);
    let byte_idx = content.find(quote)?;

    let start_units = utf16_len(&content[..byte_idx]);
    let end_units = start_units + utf16_len(quote);

    let start = position_at(doc, element, start_units, false)?;
    let end = position_at(doc, element, end_units, true)?;
    Some(TextRange::new(start, end))
}

/// Map a UTF-16 offset into the element's concatenated text back to a
/// (text-node, offset) boundary. End boundaries bind to the node they
/// close in rather than the start of the next one.
fn position_at(
    doc: &DocumentTree,
    element: NodeId,
    units: u32,
    is_end: bool,
) -> Option<TextPosition> {
    let mut consumed: u32 = 0;
    for node in doc.text_nodes_under(element) {
        let length = utf16_len(doc.text(node)?);
        let fits = if is_end {
            units > consumed && units <= consumed + length
        } else {
            units >= consumed && units < consumed + length
        };
        if fits {
            return Some(TextPosition {
                node,
                offset: units - consumed,
            });
        }
        consumed += length;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::encode_position;

    fn selector_for(
        doc: &DocumentTree,
        container: NodeId,
        range: TextRange,
    ) -> RangeSelector {
        let start = encode_position(doc, container, range.start, None).unwrap();
        let end = encode_position(doc, container, range.end, None).unwrap();
        RangeSelector::new(start, end, range.text(doc))
    }

    #[test]
    fn test_exact_decode_when_document_unchanged() {
        let mut doc = DocumentTree::new("div");
        let p = doc.append_element(doc.root(), "p");
        let t = doc.append_text(p, "hello world");
        let range = TextRange::new(
            TextPosition { node: t, offset: 6 },
            TextPosition { node: t, offset: 11 },
        );
        let selector = selector_for(&doc, doc.root(), range);

        let resolved =
            selector_to_range(&doc, doc.root(), &selector, &AnchorOptions::default()).unwrap();
        assert_eq!(resolved, range);
        assert_eq!(selector.cached_range(), Some(range));
    }

    #[test]
    fn test_reanchor_after_neutral_rewrap() {
        // Encode against the original structure...
        let mut original = DocumentTree::new("div");
        let p = original.append_element(original.root(), "p");
        let t = original.append_text(p, "say hello world now");
        let range = TextRange::new(
            TextPosition { node: t, offset: 4 },
            TextPosition { node: t, offset: 15 },
        );
        let selector = selector_for(&original, original.root(), range);
        assert_eq!(selector.quote, "hello world");

        // ...then re-render with the text wrapped in an extra span
        let mut rerendered = DocumentTree::new("div");
        let p2 = rerendered.append_element(rerendered.root(), "p");
        let span = rerendered.append_element(p2, "span");
        rerendered.append_text(span, "say hello world now");

        let resolved = selector_to_range(
            &rerendered,
            rerendered.root(),
            &selector,
            &AnchorOptions::default(),
        )
        .unwrap();
        assert_eq!(resolved.text(&rerendered), "hello world");
    }

    #[test]
    fn test_reanchor_after_offset_drift() {
        let mut original = DocumentTree::new("div");
        let p = original.append_element(original.root(), "p");
        let t = original.append_text(p, "  hello world");
        let range = TextRange::new(
            TextPosition { node: t, offset: 2 },
            TextPosition { node: t, offset: 13 },
        );
        let selector = selector_for(&original, original.root(), range);

        // Whitespace normalization shifted the content left
        let mut rerendered = DocumentTree::new("div");
        let p2 = rerendered.append_element(rerendered.root(), "p");
        rerendered.append_text(p2, "hello world");

        let resolved = selector_to_range(
            &rerendered,
            rerendered.root(),
            &selector,
            &AnchorOptions::default(),
        )
        .unwrap();
        assert_eq!(resolved.text(&rerendered), "hello world");
    }

    #[test]
    fn test_prefers_structurally_closest_match() {
        // Quote occurs in two paragraphs; the selector originally pointed
        // at the second one.
        let mut doc = DocumentTree::new("div");
        let p1 = doc.append_element(doc.root(), "p");
        doc.append_text(p1, "duplicate quote");
        let p2 = doc.append_element(doc.root(), "p");
        let t2 = doc.append_text(p2, "duplicate quote");
        let range = TextRange::new(
            TextPosition { node: t2, offset: 0 },
            TextPosition { node: t2, offset: 15 },
        );
        let mut selector = selector_for(&doc, doc.root(), range);
        // Corrupt the offset so exact decoding fails the quote check
        selector.start = PositionDescriptor::new(selector.start.steps.clone(), 1);

        let resolved =
            selector_to_range(&doc, doc.root(), &selector, &AnchorOptions::default()).unwrap();
        assert_eq!(resolved.start.node, t2);
    }

    #[test]
    fn test_unanchored_when_quote_gone() {
        let mut original = DocumentTree::new("div");
        let p = original.append_element(original.root(), "p");
        let t = original.append_text(p, "hello world");
        let range = TextRange::new(
            TextPosition { node: t, offset: 0 },
            TextPosition { node: t, offset: 11 },
        );
        let selector = selector_for(&original, original.root(), range);

        let mut rerendered = DocumentTree::new("div");
        let p2 = rerendered.append_element(rerendered.root(), "p");
        rerendered.append_text(p2, "entirely different content");

        let result = selector_to_range(
            &rerendered,
            rerendered.root(),
            &selector,
            &AnchorOptions::default(),
        );
        assert!(matches!(result, Err(AnchorError::Unanchored { .. })));
        assert!(selector.cached_range().is_none());
    }

    #[test]
    fn test_scan_limit_bounds_the_search() {
        let mut doc = DocumentTree::new("div");
        // Selector path points at the first paragraph; the quote only
        // exists far beyond a tiny scan limit.
        let p1 = doc.append_element(doc.root(), "p");
        let t1 = doc.append_text(p1, "placeholder text");
        for _ in 0..20 {
            let p = doc.append_element(doc.root(), "p");
            doc.append_text(p, "filler");
        }
        let far = doc.append_element(doc.root(), "p");
        doc.append_text(far, "needle in a haystack");

        let range = TextRange::new(
            TextPosition { node: t1, offset: 0 },
            TextPosition { node: t1, offset: 6 },
        );
        let mut selector = selector_for(&doc, doc.root(), range);
        selector.quote = "needle in a haystack".to_string();

        let bounded = AnchorOptions {
            scan_limit: 3,
            ..Default::default()
        };
        assert!(selector_to_range(&doc, doc.root(), &selector, &bounded).is_err());

        let generous = AnchorOptions {
            scan_limit: 64,
            ..Default::default()
        };
        assert!(selector_to_range(&doc, doc.root(), &selector, &generous).is_ok());
    }
}

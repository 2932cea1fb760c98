//! Boundary point encoding and decoding
//!
//! Converts between live tree positions and structure-independent
//! descriptors. Decoding never recovers on its own: a structural mismatch
//! surfaces as a [`DecodeFailure`] and the caller falls through to the
//! reanchor search instead of guessing.

use thiserror::Error;

use crate::dom::{utf16_len, DocumentTree, NodeId, TextPosition};

use super::types::{normalize_tag, PathStep, PositionDescriptor};

/// Structural decode failures
///
/// All of these commonly indicate the surrounding content shifted slightly
/// between encode and decode rather than a hard error; they are recovered
/// locally by the reanchor procedure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeFailure {
    #[error("No element matching step {step}/{total} of the path")]
    StepNotFound { step: usize, total: usize },

    #[error("Resolved element does not start with a text node")]
    NotTextNode,

    #[error("Offset {offset} exceeds text node length {length}")]
    OffsetOutOfRange { offset: u32, length: u32 },
}

/// Encode a live boundary point into a container-relative descriptor
///
/// Walks ancestor elements from the text node's parent up to `container`,
/// recording tag plus same-tag sibling ordinal per step. Returns `None`
/// when `position` is not a text node inside `container`.
pub fn encode_position(
    doc: &DocumentTree,
    container: NodeId,
    position: TextPosition,
    tag_prefix: Option<&str>,
) -> Option<PositionDescriptor> {
    if !doc.is_text(position.node) || !doc.contains(container, position.node) {
        return None;
    }

    let mut steps = Vec::new();
    let mut current = doc.parent(position.node)?;
    while current != container {
        let raw_tag = doc.tag(current)?;
        let tag = normalize_tag(raw_tag, tag_prefix);
        let index = sibling_index_normalized(doc, current, &tag, tag_prefix)?;
        steps.push(PathStep { tag, index });
        current = doc.parent(current)?;
    }
    steps.reverse();

    Some(PositionDescriptor {
        steps,
        offset: position.offset,
    })
}

/// 1-based ordinal among siblings sharing the same normalized tag
fn sibling_index_normalized(
    doc: &DocumentTree,
    node: NodeId,
    tag: &str,
    tag_prefix: Option<&str>,
) -> Option<u32> {
    let parent = doc.parent(node)?;
    let mut ordinal = 0;
    for &sibling in doc.children(parent) {
        if let Some(raw) = doc.tag(sibling) {
            if normalize_tag(raw, tag_prefix) == tag {
                ordinal += 1;
                if sibling == node {
                    return Some(ordinal);
                }
            }
        }
    }
    None
}

/// Resolve a descriptor against the container
///
/// Asserts the resolved element's content begins with a text node and that
/// the stored offset fits inside it.
pub fn decode_position(
    doc: &DocumentTree,
    container: NodeId,
    descriptor: &PositionDescriptor,
    tag_prefix: Option<&str>,
) -> Result<TextPosition, DecodeFailure> {
    let element = resolve_element(doc, container, &descriptor.steps, tag_prefix)?;

    let first = doc
        .first_child(element)
        .ok_or(DecodeFailure::NotTextNode)?;
    let content = doc.text(first).ok_or(DecodeFailure::NotTextNode)?;

    let length = utf16_len(content);
    if descriptor.offset > length {
        return Err(DecodeFailure::OffsetOutOfRange {
            offset: descriptor.offset,
            length,
        });
    }

    Ok(TextPosition {
        node: first,
        offset: descriptor.offset,
    })
}

/// Resolve just the structural path, returning the terminal element
pub(crate) fn resolve_element(
    doc: &DocumentTree,
    container: NodeId,
    steps: &[PathStep],
    tag_prefix: Option<&str>,
) -> Result<NodeId, DecodeFailure> {
    let mut current = container;
    for (depth, step) in steps.iter().enumerate() {
        current = find_nth_child(doc, current, step, tag_prefix).ok_or(
            DecodeFailure::StepNotFound {
                step: depth + 1,
                total: steps.len(),
            },
        )?;
    }
    Ok(current)
}

fn find_nth_child(
    doc: &DocumentTree,
    parent: NodeId,
    step: &PathStep,
    tag_prefix: Option<&str>,
) -> Option<NodeId> {
    let mut ordinal = 0;
    for &child in doc.children(parent) {
        if let Some(raw) = doc.tag(child) {
            if normalize_tag(raw, tag_prefix) == step.tag {
                ordinal += 1;
                if ordinal == step.index {
                    return Some(child);
                }
            }
        }
    }
    None
}

//! Document substrate
//!
//! A light arena tree the host mirrors its rendered view into. The codec,
//! anchoring, and selection subsystems all operate on this tree; layout
//! measurement stays behind the [`crate::layout::Layout`] trait so nothing
//! here depends on a real display.

mod range;
mod tree;

pub use range::{slice_utf16, utf16_len, TextPosition, TextRange};
pub use tree::{DocumentTree, NodeId, NodeKind};

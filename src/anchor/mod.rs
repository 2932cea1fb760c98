//! Range reconstruction and reanchoring
//!
//! Rebuilds a live [`TextRange`] from a persisted selector. Exact-path
//! decoding is tried first; when the document has been re-rendered with
//! minor structural differences (added wrapper elements, reflowed
//! whitespace) the bounded local search relocates the selector by its
//! literal quote instead of silently misplacing the highlight.

mod resolve;

pub use resolve::{selector_to_range, AnchorError, AnchorOptions};

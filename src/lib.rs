//! Durable text-span annotation for document views
//!
//! Lets a user select arbitrary spans of rendered text, anchors each span
//! against the document structure so it survives re-renders and minor
//! edits, and paints highlights for every anchored span with hit-testing
//! and viewport culling.
//!
//! # Modules
//!
//! - `dom`: arena document tree and live text positions
//! - `codec`: structural position descriptors, their textual form, and
//!   encode/decode against a live tree
//! - `anchor`: selector-to-range reconstruction with fuzzy reanchoring
//! - `annotation`: the annotation data model (targets, selectors, bodies)
//! - `store`: the annotation store, shared selection and hover state
//! - `selection`: the pointer/keyboard selection state machine
//! - `highlight`: dual-surface highlight rendering
//! - `annotator`: the per-container facade tying it all together

pub mod anchor;
pub mod annotation;
pub mod annotator;
pub mod codec;
pub mod config;
pub mod dom;
pub mod geometry;
pub mod highlight;
pub mod input;
pub mod layout;
pub mod schedule;
pub mod selection;
pub mod store;

pub use annotator::TextAnnotator;
pub use config::AnnotatorOptions;

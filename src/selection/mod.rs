//! Selection handling
//!
//! Turns raw pointer/keyboard/native-selection signals into annotation
//! create/update/commit transitions against the store. The interplay is
//! modeled as an explicit four-phase machine instead of ad hoc flags.

mod handler;
mod split;

pub use handler::{SelectionHandler, SelectionPhase};
pub use split::{range_to_selector, split_annotatable_ranges};

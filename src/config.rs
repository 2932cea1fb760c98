//! Annotator configuration
//!
//! The click/drag threshold and the reanchor search bound are observed
//! heuristics with no derivation; they are carried as parameters rather
//! than constants.

use crate::anchor::AnchorOptions;

/// Per-instance configuration
#[derive(Debug, Clone)]
pub struct AnnotatorOptions {
    /// A pointer-up with a collapsed selection within this window after
    /// pointer-down counts as a click, not a drag
    pub click_threshold_ms: f64,
    /// Selection-change coalescing delay
    pub selection_debounce_ms: f64,
    /// Resize coalescing delay
    pub resize_debounce_ms: f64,
    /// How long after a pointer/key down a selection change may still
    /// synthesize the missed select-start (some platforms skip it)
    pub selectstart_grace_ms: f64,
    /// Class marking a subtree as not annotatable
    pub excluded_class: String,
    /// Synthetic per-step tag prefix applied by the rendering layer
    pub tag_prefix: Option<String>,
    /// Maximum elements visited by the reanchor search
    pub reanchor_scan_limit: usize,
}

impl Default for AnnotatorOptions {
    fn default() -> Self {
        Self {
            click_threshold_ms: 300.0,
            selection_debounce_ms: 10.0,
            resize_debounce_ms: 10.0,
            selectstart_grace_ms: 1000.0,
            excluded_class: "not-annotatable".to_string(),
            tag_prefix: None,
            reanchor_scan_limit: 64,
        }
    }
}

impl AnnotatorOptions {
    pub fn anchor_options(&self) -> AnchorOptions {
        AnchorOptions {
            tag_prefix: self.tag_prefix.clone(),
            scan_limit: self.reanchor_scan_limit,
        }
    }
}

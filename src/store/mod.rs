//! Annotation store and shared state
//!
//! The store is the single source of truth shared by the selection state
//! machine (writer) and the highlight layer (reader). All cross-component
//! communication goes through its observer/query contract; components never
//! reach into each other's fields.

mod memory;
mod state;

pub use memory::MemoryStore;
pub use state::{AnnotatorState, HoverState, SelectedAnnotation, SelectionState};

use crate::annotation::{AnnotationId, AnnotationTarget, TextAnnotation};
use crate::geometry::Rect;

/// Where a mutation originated
///
/// Local mutations come from this instance's own selection machinery;
/// remote ones were synced in from outside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Local,
    Remote,
}

/// Store mutation notification
///
/// Observers fire strictly after the mutation is fully applied, so a
/// repaint triggered by an event always sees post-mutation state.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    Created { id: AnnotationId, origin: Origin },
    TargetUpdated { id: AnnotationId, origin: Origin },
    Deleted { id: AnnotationId, origin: Origin },
    /// All cached rectangles were recomputed from current layout
    Recalculated,
}

/// Store mutation observer
pub type StoreObserver = Box<dyn FnMut(&StoreEvent)>;

/// Hit-test predicate
pub type AnnotationFilter<'a> = &'a dyn Fn(&TextAnnotation) -> bool;

/// One annotation with its decomposed screen rectangles
///
/// An annotation renders as multiple rectangles when its span crosses line
/// breaks or consists of several selectors.
#[derive(Debug, Clone)]
pub struct AnnotatedRects {
    pub annotation: TextAnnotation,
    pub rects: Vec<Rect>,
}

/// Query/mutation contract of the annotation store
pub trait AnnotationStore {
    /// Insert a new annotation and resolve its rectangles
    fn add_annotation(&mut self, annotation: TextAnnotation, origin: Origin);

    /// Replace the target of an existing annotation
    fn update_target(&mut self, target: AnnotationTarget, origin: Origin);

    fn get_annotation(&self, id: AnnotationId) -> Option<&TextAnnotation>;

    /// Remove an annotation; returns whether it existed
    fn delete_annotation(&mut self, id: AnnotationId, origin: Origin) -> bool;

    /// Topmost annotation whose rendered rectangle contains the point
    fn get_at(&self, x: f32, y: f32, filter: Option<AnnotationFilter>) -> Option<&TextAnnotation>;

    /// All annotations whose rectangles intersect the given box, each with
    /// its full rectangle list. Result order is not guaranteed stable
    /// across calls.
    fn get_intersecting_rects(
        &self,
        min_x: f32,
        min_y: f32,
        max_x: f32,
        max_y: f32,
    ) -> Vec<AnnotatedRects>;

    /// Recompute every cached rectangle from current document layout
    /// (invoked after a resize, since layout may have changed)
    fn recalculate_positions(&mut self);

    /// Register a mutation observer
    fn observe(&mut self, observer: StoreObserver);

    /// Drop every observer; pending notifications are abandoned
    fn clear_observers(&mut self);
}

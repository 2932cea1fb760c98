//! Shared selection and hover state

use tracing::debug;

use crate::annotation::AnnotationId;
use crate::input::InputTrigger;

use super::AnnotationStore;

/// One entry of the active user selection
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedAnnotation {
    pub id: AnnotationId,
    /// Whether the surrounding application considers this entry editable
    pub editable: Option<bool>,
}

/// The active user selection
///
/// Written by the selection state machine, observed by the highlight layer
/// and the surrounding application.
#[derive(Default)]
pub struct SelectionState {
    selected: Vec<SelectedAnnotation>,
    /// Cloned signal that produced the current selection
    last_trigger: Option<InputTrigger>,
    observers: Vec<Box<dyn FnMut(&[SelectedAnnotation])>>,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self) -> &[SelectedAnnotation] {
        &self.selected
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn last_trigger(&self) -> Option<&InputTrigger> {
        self.last_trigger.as_ref()
    }

    /// Clear the selection; no-op (and no notification) when already empty
    pub fn clear(&mut self) {
        if self.selected.is_empty() {
            return;
        }
        self.selected.clear();
        self.last_trigger = None;
        self.notify();
    }

    /// Make `id` the active selection
    pub fn user_select(&mut self, id: AnnotationId, trigger: Option<InputTrigger>) {
        debug!(%id, "user selected annotation");
        self.selected = vec![SelectedAnnotation { id, editable: None }];
        self.last_trigger = trigger;
        self.notify();
    }

    pub fn is_selected(&self, id: AnnotationId) -> bool {
        self.selected.iter().any(|s| s.id == id)
    }

    pub fn subscribe(&mut self, observer: Box<dyn FnMut(&[SelectedAnnotation])>) {
        self.observers.push(observer);
    }

    /// Drop every observer
    pub fn clear_observers(&mut self) {
        self.observers.clear();
    }

    fn notify(&mut self) {
        for observer in &mut self.observers {
            observer(&self.selected);
        }
    }
}

/// Hovered annotation, transitioning only on enter/leave
#[derive(Debug, Default)]
pub struct HoverState {
    current: Option<AnnotationId>,
}

impl HoverState {
    pub fn current(&self) -> Option<AnnotationId> {
        self.current
    }

    /// Returns true when the hover actually changed
    pub fn set(&mut self, id: Option<AnnotationId>) -> bool {
        if self.current == id {
            return false;
        }
        self.current = id;
        true
    }
}

/// The shared state one annotator instance operates on
pub struct AnnotatorState {
    pub store: Box<dyn AnnotationStore>,
    pub selection: SelectionState,
    pub hover: HoverState,
}

impl AnnotatorState {
    pub fn new(store: Box<dyn AnnotationStore>) -> Self {
        Self {
            store,
            selection: SelectionState::new(),
            hover: HoverState::default(),
        }
    }
}

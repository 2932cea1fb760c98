//! Selection state machine
//!
//! Owns pointer/keyboard/native-selection listening for one container and
//! drives the store through create/update/select transitions. Because
//! native selection-change signals fire at high frequency during a drag,
//! processing is debounced: only the latest snapshot after coalescing is
//! split, encoded, and written.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::debug;

use crate::annotation::{AnnotationTarget, TextAnnotation, User};
use crate::config::AnnotatorOptions;
use crate::dom::{DocumentTree, NodeId};
use crate::input::{
    InputEvent, InputTrigger, Key, KeyInput, NativeSelection, PointerButton, PointerInput,
};
use crate::schedule::Debouncer;
use crate::store::{AnnotatorState, Origin};

use super::split::{range_to_selector, split_annotatable_ranges};

/// Phases of the selection machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionPhase {
    /// No active selection
    Idle,
    /// A selection gesture began in an annotatable region; no selector yet
    Pending,
    /// The native selection is non-collapsed and has produced selectors
    Growing,
    /// The target has been finalized as the active selection
    Committed,
}

/// Per-container selection handler
pub struct SelectionHandler {
    doc: Rc<RefCell<DocumentTree>>,
    container: NodeId,
    opts: AnnotatorOptions,

    phase: SelectionPhase,
    current_target: Option<AnnotationTarget>,

    /// Cloned record of the most recent pointer/key down
    last_down: Option<InputTrigger>,
    /// Whether the most recent pointer-down used the primary button
    primary_button: Option<bool>,
    /// Latest native-selection snapshot, pre-coalescing
    last_selection: Option<NativeSelection>,

    /// Latest coalesced selection-change awaiting processing
    pending_change: Option<NativeSelection>,
    debounce: Debouncer,

    select_all_armed: bool,
    annotating_enabled: bool,
    user: Option<User>,
    filter: Option<Box<dyn Fn(&TextAnnotation) -> bool>>,
    /// Host hook that clears the platform's native selection highlight
    clear_native: Option<Box<dyn FnMut()>>,
}

impl SelectionHandler {
    pub fn new(
        doc: Rc<RefCell<DocumentTree>>,
        container: NodeId,
        opts: AnnotatorOptions,
    ) -> Self {
        let debounce = Debouncer::new(opts.selection_debounce_ms);
        Self {
            doc,
            container,
            opts,
            phase: SelectionPhase::Idle,
            current_target: None,
            last_down: None,
            primary_button: None,
            last_selection: None,
            pending_change: None,
            debounce,
            select_all_armed: false,
            annotating_enabled: true,
            user: None,
            filter: None,
            clear_native: None,
        }
    }

    pub fn phase(&self) -> SelectionPhase {
        self.phase
    }

    pub fn set_user(&mut self, user: Option<User>) {
        self.user = user;
    }

    pub fn set_filter(&mut self, filter: Option<Box<dyn Fn(&TextAnnotation) -> bool>>) {
        self.filter = filter;
    }

    pub fn set_annotating_enabled(&mut self, enabled: bool) {
        self.annotating_enabled = enabled;
    }

    /// Install the host hook invoked when the machine takes over a native
    /// selection (so the platform highlight does not fight the layer's)
    pub fn set_native_selection_clearer(&mut self, clearer: Box<dyn FnMut()>) {
        self.clear_native = Some(clearer);
    }

    /// Route one input signal
    pub fn handle(&mut self, event: &InputEvent, state: &mut AnnotatorState) {
        match event {
            InputEvent::PointerDown(pointer) => self.on_pointer_down(pointer),
            InputEvent::PointerUp(pointer) => self.on_pointer_up(pointer, state),
            InputEvent::SelectStart { target, time_stamp } => {
                self.on_select_start(*target, *time_stamp)
            }
            InputEvent::SelectionChange {
                selection,
                time_stamp,
            } => self.on_selection_change(selection.clone(), *time_stamp),
            InputEvent::KeyDown(key) => self.on_key_down(key),
            InputEvent::KeyUp(key) => self.on_key_up(key, state),
            // Pointer moves, scroll, and resize belong to the layer
            _ => {}
        }
    }

    /// Frame pump: process the latest coalesced selection change
    pub fn frame(&mut self, now_ms: f64, state: &mut AnnotatorState) {
        if self.debounce.fire_if_due(now_ms) {
            if let Some(selection) = self.pending_change.take() {
                self.process_selection_change(selection, now_ms, state);
            }
        }
    }

    /// Release host hooks and cancel pending coalesced work
    pub fn destroy(&mut self) {
        self.debounce.cancel();
        self.pending_change = None;
        self.current_target = None;
        self.clear_native = None;
        self.filter = None;
        self.phase = SelectionPhase::Idle;
    }

    fn is_annotatable(&self, node: Option<NodeId>) -> bool {
        // Some platforms report the document root as target; treat an
        // unresolvable node as not annotatable.
        match node {
            Some(node) => !self
                .doc
                .borrow()
                .has_ancestor_class(node, &self.opts.excluded_class),
            None => false,
        }
    }

    fn on_pointer_down(&mut self, pointer: &PointerInput) {
        self.primary_button = Some(pointer.button == PointerButton::Primary);
        self.last_down = Some(InputTrigger::Pointer(pointer.clone()));
    }

    fn on_select_start(&mut self, target: Option<NodeId>, _time_stamp: f64) {
        if !self.annotating_enabled {
            return;
        }
        if self.primary_button == Some(false) {
            return;
        }

        // A new gesture silently replaces any not-yet-persisted target
        if self.is_annotatable(target) {
            let target = AnnotationTarget::new(self.user.clone());
            debug!(id = %target.id, "selection gesture started");
            self.current_target = Some(target);
            self.phase = SelectionPhase::Pending;
        } else {
            self.current_target = None;
            self.phase = SelectionPhase::Idle;
        }
    }

    fn on_selection_change(&mut self, selection: NativeSelection, time_stamp: f64) {
        if !self.annotating_enabled {
            return;
        }
        self.last_selection = Some(selection.clone());
        self.pending_change = Some(selection);
        self.debounce.trigger(time_stamp);
    }

    fn process_selection_change(
        &mut self,
        selection: NativeSelection,
        time_stamp: f64,
        state: &mut AnnotatorState,
    ) {
        // A selection "hijacked" into a not-annotatable area (rich text
        // editors will do this) cancels the gesture.
        if let Some(anchor) = selection.anchor {
            if !self.is_annotatable(Some(anchor)) {
                self.current_target = None;
                self.phase = SelectionPhase::Idle;
                return;
            }
        }

        // Some platforms do not reliably deliver the select-start signal;
        // synthesize it from the recent down event.
        if self.current_target.is_none() {
            let down_ts = self.last_down.as_ref().map(InputTrigger::time_stamp);
            let within_grace = down_ts
                .map(|ts| time_stamp - ts < self.opts.selectstart_grace_ms)
                .unwrap_or(false);
            if within_grace {
                let target = match &self.last_down {
                    Some(InputTrigger::Pointer(p)) => p.target,
                    _ => selection.anchor,
                };
                self.on_select_start(target, time_stamp);
            }
        }

        if selection.is_collapsed()
            || self.current_target.is_none()
            || self.primary_button == Some(false)
        {
            return;
        }
        let range = match selection.range {
            Some(range) => range,
            None => return,
        };

        // Scope the document borrow: the store re-borrows on write
        let selectors: Vec<_> = {
            let doc = self.doc.borrow();
            if range.is_whitespace_or_empty(&doc) {
                return;
            }
            let prefix = self.opts.tag_prefix.as_deref();
            split_annotatable_ranges(&doc, &range, &self.opts.excluded_class)
                .iter()
                .filter_map(|sub| range_to_selector(&doc, self.container, sub, prefix))
                .collect()
        };
        if selectors.is_empty() {
            return;
        }

        let target = match self.current_target.as_mut() {
            Some(target) => target,
            None => return,
        };
        let changed = selectors.len() != target.selectors.len()
            || selectors
                .iter()
                .zip(target.selectors.iter())
                .any(|(new, old)| new.quote != old.quote);
        if !changed {
            return;
        }

        let first_content = !target.has_content();
        target.set_selectors(selectors);
        let target = target.clone();
        self.phase = SelectionPhase::Growing;

        if state.store.get_annotation(target.id).is_some() {
            state.store.update_target(target, Origin::Local);
        } else if first_content {
            // Proper lifecycle order: clear the previous selection, add
            // the annotation, then make it the active selection.
            state.selection.clear();
            state
                .store
                .add_annotation(TextAnnotation::from_target(target.clone()), Origin::Local);
            if let Some(clear_native) = &mut self.clear_native {
                clear_native();
            }
            state
                .selection
                .user_select(target.id, self.last_down.clone());
        }
    }

    fn on_pointer_up(&mut self, pointer: &PointerInput, state: &mut AnnotatorState) {
        if !self.is_annotatable(pointer.target) {
            return;
        }
        if self.primary_button != Some(true) {
            return;
        }

        let elapsed = self
            .last_down
            .as_ref()
            .map(|down| pointer.time_stamp - down.time_stamp())
            .unwrap_or(f64::MAX);
        let collapsed = self
            .last_selection
            .as_ref()
            .map(NativeSelection::is_collapsed)
            .unwrap_or(true);

        if collapsed && elapsed < self.opts.click_threshold_ms {
            // Just a click, not a selection
            self.current_target = None;
            self.phase = SelectionPhase::Idle;
            self.click_select(pointer, state);
        } else if let Some(target) = &self.current_target {
            if target.has_content() {
                state
                    .selection
                    .user_select(target.id, Some(InputTrigger::Pointer(pointer.clone())));
                self.phase = SelectionPhase::Committed;
            }
        }
    }

    /// Point hit-test an existing annotation under the pointer
    fn click_select(&mut self, pointer: &PointerInput, state: &mut AnnotatorState) {
        let filter = self.filter.as_deref();
        let hovered = state.store.get_at(pointer.x, pointer.y, filter).map(|a| a.id);
        match hovered {
            Some(id) => {
                let already = state.selection.selected().len() == 1
                    && state.selection.is_selected(id);
                if !already {
                    state
                        .selection
                        .user_select(id, Some(InputTrigger::Pointer(pointer.clone())));
                }
            }
            None => state.selection.clear(),
        }
    }

    fn on_key_down(&mut self, key: &KeyInput) {
        if !key.repeat {
            self.last_down = Some(InputTrigger::Key(key.clone()));
        }
        if key.is_select_all() {
            self.select_all_armed = true;
        }
    }

    fn on_key_up(&mut self, key: &KeyInput, state: &mut AnnotatorState) {
        // Lifting Shift ends a keyboard-extended selection; a completed
        // select-all commits on the following key release.
        let terminates = (key.key == Key::Shift && !key.repeat)
            || (self.select_all_armed && !key.repeat);
        if terminates {
            if let Some(target) = &self.current_target {
                if target.has_content() {
                    state
                        .selection
                        .user_select(target.id, Some(InputTrigger::Key(key.clone())));
                    self.phase = SelectionPhase::Committed;
                }
            }
        }
        self.select_all_armed = false;
    }
}

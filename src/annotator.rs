//! Annotator facade
//!
//! One instance per annotated container. Owns the store, the selection
//! state machine, and the highlight layer, and routes host signals to
//! whichever component cares. The host drives it with `handle_event` for
//! raw input and `frame` once per animation tick.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::debug;

use crate::annotation::{AnnotationId, TextAnnotation, User};
use crate::config::AnnotatorOptions;
use crate::dom::{DocumentTree, NodeId};
use crate::highlight::{Formatter, HighlightLayer, HighlightPainter, RenderSurface, VisibilityChange};
use crate::input::InputEvent;
use crate::layout::Layout;
use crate::selection::{SelectionHandler, SelectionPhase};
use crate::store::{AnnotatorState, MemoryStore, Origin, StoreObserver};

pub struct TextAnnotator {
    state: AnnotatorState,
    selection: SelectionHandler,
    layer: HighlightLayer,
    destroyed: bool,
}

impl TextAnnotator {
    /// Mount an annotator on `container` within `doc`
    pub fn new(
        doc: Rc<RefCell<DocumentTree>>,
        layout: Rc<dyn Layout>,
        container: NodeId,
        background: Box<dyn RenderSurface>,
        foreground: Box<dyn RenderSurface>,
        window_width: f32,
        window_height: f32,
        opts: AnnotatorOptions,
    ) -> Self {
        let store = MemoryStore::new(
            Rc::clone(&doc),
            layout,
            container,
            opts.anchor_options(),
        );
        let mut state = AnnotatorState::new(Box::new(store));
        let selection = SelectionHandler::new(Rc::clone(&doc), container, opts.clone());
        let mut layer = HighlightLayer::new(
            background,
            foreground,
            &opts,
            window_width,
            window_height,
        );
        layer.attach(&mut state);
        debug!(?container, "annotator mounted");
        Self {
            state,
            selection,
            layer,
            destroyed: false,
        }
    }

    /// Route one host signal
    pub fn handle_event(&mut self, event: &InputEvent) {
        if self.destroyed {
            return;
        }
        self.selection.handle(event, &mut self.state);
        self.layer.handle(event, &mut self.state);
    }

    /// Frame pump; the host calls this once per animation tick
    pub fn frame(&mut self, now_ms: f64) {
        if self.destroyed {
            return;
        }
        self.selection.frame(now_ms, &mut self.state);
        self.layer.frame(now_ms, &mut self.state);
    }

    pub fn state(&self) -> &AnnotatorState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut AnnotatorState {
        &mut self.state
    }

    pub fn selection_phase(&self) -> SelectionPhase {
        self.selection.phase()
    }

    /// Insert an externally synced annotation
    pub fn add_annotation(&mut self, annotation: TextAnnotation) {
        self.state.store.add_annotation(annotation, Origin::Remote);
    }

    pub fn get_annotation(&self, id: AnnotationId) -> Option<&TextAnnotation> {
        self.state.store.get_annotation(id)
    }

    pub fn delete_annotation(&mut self, id: AnnotationId) -> bool {
        if self.state.selection.is_selected(id) {
            self.state.selection.clear();
        }
        self.state.store.delete_annotation(id, Origin::Local)
    }

    pub fn observe_store(&mut self, observer: StoreObserver) {
        self.state.store.observe(observer);
    }

    pub fn on_visibility_change(&mut self, observer: Box<dyn FnMut(&VisibilityChange)>) {
        self.layer.on_visibility_change(observer);
    }

    /// Attribute newly created annotations to this user
    pub fn set_user(&mut self, user: Option<User>) {
        self.selection.set_user(user);
    }

    /// Suspend or resume creation of new annotations; existing highlights
    /// keep rendering and hit-testing
    pub fn set_annotating_enabled(&mut self, enabled: bool) {
        self.selection.set_annotating_enabled(enabled);
    }

    /// Constrain hit-testing (hover and click-select) to matching
    /// annotations
    pub fn set_filter(&mut self, filter: Option<Rc<dyn Fn(&TextAnnotation) -> bool>>) {
        match filter {
            Some(filter) => {
                let for_selection = Rc::clone(&filter);
                self.selection
                    .set_filter(Some(Box::new(move |a| for_selection(a))));
                self.layer.set_filter(Some(Box::new(move |a| filter(a))));
            }
            None => {
                self.selection.set_filter(None);
                self.layer.set_filter(None);
            }
        }
    }

    pub fn set_painter(&mut self, painter: Box<dyn HighlightPainter>) {
        self.layer.set_painter(painter);
    }

    pub fn set_formatter(&mut self, formatter: Option<Formatter>) {
        self.layer.set_formatter(formatter);
    }

    /// Host hook invoked when the machine takes over a native selection
    pub fn set_native_selection_clearer(&mut self, clearer: Box<dyn FnMut()>) {
        self.selection.set_native_selection_clearer(clearer);
    }

    /// The host reports where the container sits in the window
    pub fn set_container_origin(&mut self, x: f32, y: f32) {
        self.layer.set_container_origin(x, y);
    }

    /// Force a repaint on the next frame
    pub fn redraw(&mut self) {
        self.layer.redraw();
    }

    /// Unmount: cancel pending deferred work and drop every host hook.
    /// Further events and frames are ignored.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;
        self.selection.destroy();
        self.layer.destroy();
        self.state.selection.clear_observers();
        self.state.store.clear_observers();
        debug!("annotator destroyed");
    }
}

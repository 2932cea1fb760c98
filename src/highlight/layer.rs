//! Highlight layer
//!
//! Subscribes to store mutations and selection changes, tracks the
//! container's position in the window, and repaints every on-screen
//! annotation through the active painter. Any number of repaint triggers
//! within one frame collapse into a single paint on the next pump.

use tracing::trace;

use crate::annotation::{AnnotationId, TextAnnotation};
use crate::config::AnnotatorOptions;
use crate::input::InputEvent;
use crate::schedule::{Debouncer, SharedFlag};
use crate::store::AnnotatorState;

use super::painter::{DefaultPainter, Formatter, HighlightPainter};
use super::surface::RenderSurface;
use super::viewport::{to_screen, Viewport, ViewportTracker, VisibilityChange};

pub struct HighlightLayer {
    background: Box<dyn RenderSurface>,
    foreground: Box<dyn RenderSurface>,
    painter: Box<dyn HighlightPainter>,
    formatter: Option<Formatter>,
    filter: Option<Box<dyn Fn(&TextAnnotation) -> bool>>,

    repaint: SharedFlag,
    resize_debounce: Debouncer,
    pending_resize: Option<(f32, f32)>,
    tracker: ViewportTracker,

    /// Container origin in window coordinates; goes negative as the user
    /// scrolls past the container
    origin: (f32, f32),
    window: (f32, f32),
}

impl HighlightLayer {
    pub fn new(
        background: Box<dyn RenderSurface>,
        foreground: Box<dyn RenderSurface>,
        opts: &AnnotatorOptions,
        window_width: f32,
        window_height: f32,
    ) -> Self {
        Self {
            background,
            foreground,
            painter: Box::new(DefaultPainter::default()),
            formatter: None,
            filter: None,
            repaint: SharedFlag::new(),
            resize_debounce: Debouncer::new(opts.resize_debounce_ms),
            pending_resize: None,
            tracker: ViewportTracker::new(),
            origin: (0.0, 0.0),
            window: (window_width, window_height),
        }
    }

    /// Hook store and selection observers so every mutation schedules a
    /// repaint on the next frame
    pub fn attach(&mut self, state: &mut AnnotatorState) {
        let flag = self.repaint.clone();
        state.store.observe(Box::new(move |_| flag.set()));
        let flag = self.repaint.clone();
        state.selection.subscribe(Box::new(move |_| flag.set()));
        self.repaint.set();
    }

    pub fn set_painter(&mut self, painter: Box<dyn HighlightPainter>) {
        self.painter = painter;
        self.repaint.set();
    }

    pub fn set_formatter(&mut self, formatter: Option<Formatter>) {
        self.formatter = formatter;
        self.repaint.set();
    }

    pub fn set_filter(&mut self, filter: Option<Box<dyn Fn(&TextAnnotation) -> bool>>) {
        self.filter = filter;
        self.repaint.set();
    }

    /// Consumers receive enter/leave transitions after each paint
    pub fn on_visibility_change(&mut self, observer: Box<dyn FnMut(&VisibilityChange)>) {
        self.tracker.set_observer(observer);
    }

    /// The host reports where the container sits in the window
    pub fn set_container_origin(&mut self, x: f32, y: f32) {
        self.origin = (x, y);
    }

    /// Schedule a repaint on the next frame
    pub fn redraw(&mut self) {
        self.repaint.set();
    }

    pub fn handle(&mut self, event: &InputEvent, state: &mut AnnotatorState) {
        match event {
            InputEvent::PointerMove(pointer) => {
                let hovered = state
                    .store
                    .get_at(pointer.x, pointer.y, self.filter.as_deref())
                    .map(|a| a.id);
                // Repaint on enter/leave only, not per move event
                if state.hover.set(hovered) {
                    self.repaint.set();
                }
            }
            InputEvent::Scroll => self.repaint.set(),
            InputEvent::Resize {
                width,
                height,
                time_stamp,
            } => {
                self.pending_resize = Some((*width, *height));
                self.resize_debounce.trigger(*time_stamp);
            }
            _ => {}
        }
    }

    /// Frame pump: apply a settled resize, then paint at most once
    pub fn frame(&mut self, now_ms: f64, state: &mut AnnotatorState) {
        if self.resize_debounce.fire_if_due(now_ms) {
            if let Some((width, height)) = self.pending_resize.take() {
                self.window = (width, height);
                self.background.resize(width, height);
                self.foreground.resize(width, height);
                // Layout may have reflowed; rebuild every cached rectangle
                state.store.recalculate_positions();
                self.repaint.set();
            }
        }
        if self.repaint.take() {
            self.paint(state);
        }
    }

    /// Release pending work and host hooks
    pub fn destroy(&mut self) {
        self.resize_debounce.cancel();
        self.pending_resize = None;
        self.repaint.take();
        self.formatter = None;
        self.filter = None;
    }

    fn paint(&mut self, state: &mut AnnotatorState) {
        self.background.clear();
        self.foreground.clear();

        let (ox, oy) = self.origin;
        let viewport = Viewport::compute(ox, oy, self.window.0, self.window.1);
        let entries = state.store.get_intersecting_rects(
            viewport.min_x,
            viewport.min_y,
            viewport.max_x,
            viewport.max_y,
        );
        trace!(count = entries.len(), "painting visible annotations");

        let mut painted: Vec<AnnotationId> = Vec::with_capacity(entries.len());
        for entry in &entries {
            let screen_rects: Vec<_> = entry
                .rects
                .iter()
                .map(|r| to_screen(*r, ox, oy))
                .collect();
            let is_selected = state.selection.is_selected(entry.annotation.id);
            self.painter.paint(
                &entry.annotation,
                &screen_rects,
                self.background.as_mut(),
                self.foreground.as_mut(),
                is_selected,
                self.formatter.as_ref(),
            );
            painted.push(entry.annotation.id);
        }
        self.tracker.update(&painted);
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::anchor::AnchorOptions;
    use crate::annotation::{AnnotationTarget, RangeSelector, TextAnnotation};
    use crate::codec::encode_position;
    use crate::dom::{DocumentTree, TextPosition, TextRange};
    use crate::highlight::surface::RecordingSurface;
    use crate::input::{PointerButton, PointerInput};
    use crate::layout::MonospaceLayout;
    use crate::store::{AnnotationStore, MemoryStore, Origin};

    struct Fixture {
        layer: HighlightLayer,
        state: AnnotatorState,
        background: Rc<RefCell<RecordingSurface>>,
        doc: Rc<RefCell<DocumentTree>>,
    }

    fn fixture(text: &str) -> Fixture {
        let mut doc = DocumentTree::new("div");
        let p = doc.append_element(doc.root(), "p");
        doc.append_text(p, text);
        let container = doc.root();
        let doc = Rc::new(RefCell::new(doc));
        let store = MemoryStore::new(
            Rc::clone(&doc),
            Rc::new(MonospaceLayout::default()),
            container,
            AnchorOptions::default(),
        );
        let mut state = AnnotatorState::new(Box::new(store));

        let background = Rc::new(RefCell::new(RecordingSurface::new()));
        let foreground = Rc::new(RefCell::new(RecordingSurface::new()));
        let mut layer = HighlightLayer::new(
            Box::new(Rc::clone(&background)),
            Box::new(foreground),
            &AnnotatorOptions::default(),
            800.0,
            600.0,
        );
        layer.attach(&mut state);

        Fixture {
            layer,
            state,
            background,
            doc,
        }
    }

    fn annotate(fx: &mut Fixture, from: u32, to: u32) -> AnnotationId {
        let (start, end, quote) = {
            let doc = fx.doc.borrow();
            let t = doc.text_nodes_under(doc.root())[0];
            let container = doc.root();
            let range = TextRange::new(
                TextPosition { node: t, offset: from },
                TextPosition { node: t, offset: to },
            );
            let start = encode_position(&doc, container, range.start, None).unwrap();
            let end = encode_position(&doc, container, range.end, None).unwrap();
            (start, end, range.text(&doc))
        };
        let mut target = AnnotationTarget::new(None);
        target.set_selectors(vec![RangeSelector::new(start, end, quote)]);
        let annotation = TextAnnotation::from_target(target);
        let id = annotation.id;
        fx.state.store.add_annotation(annotation, Origin::Local);
        id
    }

    #[test]
    fn test_store_mutation_triggers_single_batched_paint() {
        let mut fx = fixture("hello world");
        fx.layer.frame(0.0, &mut fx.state);
        let baseline = fx.background.borrow().commands().len();

        // Two mutations within one frame
        annotate(&mut fx, 0, 5);
        annotate(&mut fx, 6, 11);
        fx.layer.frame(16.0, &mut fx.state);

        let commands = fx.background.borrow().commands().len();
        // One clear plus two fills, not two whole paint passes
        assert_eq!(commands - baseline, 3);

        // No further trigger, no further paint
        fx.layer.frame(32.0, &mut fx.state);
        assert_eq!(fx.background.borrow().commands().len(), commands);
    }

    #[test]
    fn test_repaint_is_idempotent() {
        let mut fx = fixture("hello world");
        annotate(&mut fx, 0, 5);
        fx.layer.frame(0.0, &mut fx.state);
        let first: Vec<_> = fx
            .background
            .borrow()
            .fills_since_clear()
            .into_iter()
            .cloned()
            .collect();

        fx.layer.redraw();
        fx.layer.frame(16.0, &mut fx.state);
        let second: Vec<_> = fx
            .background
            .borrow()
            .fills_since_clear()
            .into_iter()
            .cloned()
            .collect();

        assert_eq!(first, second);
        assert!(fx.state.hover.current().is_none());
    }

    #[test]
    fn test_offscreen_annotation_not_painted() {
        let mut fx = fixture(&"x".repeat(4000));
        // 4000 chars at 80 cols is 50 lines of 16px; select the last line,
        // far below a 600px window scrolled to the top
        annotate(&mut fx, 3920, 3925);
        fx.layer.frame(0.0, &mut fx.state);
        assert!(fx.background.borrow().fills_since_clear().is_empty());

        // Scroll the container up so the tail line enters the window
        fx.layer.set_container_origin(0.0, -400.0);
        fx.layer.handle(&InputEvent::Scroll, &mut fx.state);
        fx.layer.frame(16.0, &mut fx.state);
        assert_eq!(fx.background.borrow().fills_since_clear().len(), 1);
    }

    #[test]
    fn test_painted_rects_are_offset_to_screen() {
        let mut fx = fixture("hello world");
        annotate(&mut fx, 0, 5);
        fx.layer.set_container_origin(0.0, -10.0);
        fx.layer.frame(0.0, &mut fx.state);

        let background = fx.background.borrow();
        let fills = background.fills_since_clear();
        assert_eq!(fills.len(), 1);
        match fills[0] {
            crate::highlight::surface::DrawCommand::FillRect { rect, .. } => {
                assert_eq!(rect.y, -10.0);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_hover_transition_repaints_once() {
        let mut fx = fixture("hello world");
        let id = annotate(&mut fx, 0, 5);
        fx.layer.frame(0.0, &mut fx.state);
        let baseline = fx.background.borrow().commands().len();

        let mover = |x: f32, y: f32, ts: f64| {
            InputEvent::PointerMove(PointerInput {
                x,
                y,
                button: PointerButton::Primary,
                time_stamp: ts,
                target: None,
            })
        };

        // Several moves inside the same highlight: one enter transition
        fx.layer.handle(&mover(4.0, 4.0, 1.0), &mut fx.state);
        fx.layer.handle(&mover(8.0, 4.0, 2.0), &mut fx.state);
        fx.layer.handle(&mover(12.0, 4.0, 3.0), &mut fx.state);
        assert_eq!(fx.state.hover.current(), Some(id));
        fx.layer.frame(16.0, &mut fx.state);
        let after_enter = fx.background.borrow().commands().len();
        assert!(after_enter > baseline);

        // Moving off is the leave transition
        fx.layer.handle(&mover(500.0, 500.0, 4.0), &mut fx.state);
        assert_eq!(fx.state.hover.current(), None);
        fx.layer.frame(32.0, &mut fx.state);
        assert!(fx.background.borrow().commands().len() > after_enter);
    }

    #[test]
    fn test_resize_debounces_then_recalculates() {
        let mut fx = fixture("hello world");
        annotate(&mut fx, 0, 5);
        fx.layer.frame(0.0, &mut fx.state);

        let recalculated = Rc::new(std::cell::Cell::new(0));
        let recalculated_inner = Rc::clone(&recalculated);
        fx.state.store.observe(Box::new(move |event| {
            if matches!(event, crate::store::StoreEvent::Recalculated) {
                recalculated_inner.set(recalculated_inner.get() + 1);
            }
        }));

        // A burst of resizes settles into one recalculation
        for i in 0..4 {
            fx.layer.handle(
                &InputEvent::Resize {
                    width: 800.0 + i as f32,
                    height: 600.0,
                    time_stamp: i as f64,
                },
                &mut fx.state,
            );
            fx.layer.frame(i as f64 + 1.0, &mut fx.state);
        }
        assert_eq!(recalculated.get(), 0);

        fx.layer.frame(50.0, &mut fx.state);
        assert_eq!(recalculated.get(), 1);
    }

    #[test]
    fn test_visibility_transitions_reported_after_paint() {
        let mut fx = fixture("hello world");
        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen_inner = Rc::clone(&seen);
        fx.layer.on_visibility_change(Box::new(move |change| {
            seen_inner.borrow_mut().push(change.clone());
        }));

        let id = annotate(&mut fx, 0, 5);
        fx.layer.frame(0.0, &mut fx.state);
        assert_eq!(seen.borrow().len(), 1);
        assert_eq!(seen.borrow()[0].entered, vec![id]);

        fx.state.store.delete_annotation(id, Origin::Local);
        fx.layer.frame(16.0, &mut fx.state);
        assert_eq!(seen.borrow().len(), 2);
        assert_eq!(seen.borrow()[1].left, vec![id]);
    }
}

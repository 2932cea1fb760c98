//! In-memory reference store
//!
//! Resolves selectors through the anchoring machinery and keeps a cached
//! rectangle list per annotation. Unanchored selectors contribute no
//! rectangles, which excludes them from painting and hit-testing while the
//! persisted selector itself stays untouched.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::debug;

use crate::anchor::{selector_to_range, AnchorOptions};
use crate::annotation::{AnnotationId, AnnotationTarget, TextAnnotation};
use crate::dom::{DocumentTree, NodeId};
use crate::geometry::Rect;
use crate::layout::Layout;

use super::{AnnotatedRects, AnnotationFilter, AnnotationStore, Origin, StoreEvent, StoreObserver};

struct StoredAnnotation {
    annotation: TextAnnotation,
    rects: Vec<Rect>,
    unanchored_selectors: usize,
}

/// Reference [`AnnotationStore`] backed by the document tree and layout
pub struct MemoryStore {
    doc: Rc<RefCell<DocumentTree>>,
    layout: Rc<dyn Layout>,
    container: NodeId,
    anchor_opts: AnchorOptions,
    records: Vec<StoredAnnotation>,
    observers: Vec<StoreObserver>,
}

impl MemoryStore {
    pub fn new(
        doc: Rc<RefCell<DocumentTree>>,
        layout: Rc<dyn Layout>,
        container: NodeId,
        anchor_opts: AnchorOptions,
    ) -> Self {
        Self {
            doc,
            layout,
            container,
            anchor_opts,
            records: Vec::new(),
            observers: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of selectors of this annotation currently unanchored
    pub fn unanchored_selectors(&self, id: AnnotationId) -> Option<usize> {
        self.records
            .iter()
            .find(|r| r.annotation.id == id)
            .map(|r| r.unanchored_selectors)
    }

    fn resolve_rects(&self, annotation: &TextAnnotation) -> (Vec<Rect>, usize) {
        let doc = self.doc.borrow();
        let mut rects = Vec::new();
        let mut unanchored = 0;
        for selector in &annotation.target.selectors {
            match selector_to_range(&doc, self.container, selector, &self.anchor_opts) {
                Ok(range) => rects.extend(self.layout.range_rects(&doc, &range)),
                Err(_) => unanchored += 1,
            }
        }
        (rects, unanchored)
    }

    fn emit(&mut self, event: StoreEvent) {
        for observer in &mut self.observers {
            observer(&event);
        }
    }

    fn find_mut(&mut self, id: AnnotationId) -> Option<&mut StoredAnnotation> {
        self.records.iter_mut().find(|r| r.annotation.id == id)
    }
}

impl AnnotationStore for MemoryStore {
    fn add_annotation(&mut self, annotation: TextAnnotation, origin: Origin) {
        let (rects, unanchored_selectors) = self.resolve_rects(&annotation);
        let id = annotation.id;
        debug!(%id, rects = rects.len(), "annotation added");
        self.records.push(StoredAnnotation {
            annotation,
            rects,
            unanchored_selectors,
        });
        self.emit(StoreEvent::Created { id, origin });
    }

    fn update_target(&mut self, target: AnnotationTarget, origin: Origin) {
        let id = target.id;
        let annotation = match self.find_mut(id) {
            Some(record) => {
                record.annotation.target = target;
                record.annotation.clone()
            }
            None => {
                debug!(%id, "update for unknown annotation ignored");
                return;
            }
        };
        let (rects, unanchored) = self.resolve_rects(&annotation);
        if let Some(record) = self.find_mut(id) {
            record.rects = rects;
            record.unanchored_selectors = unanchored;
        }
        self.emit(StoreEvent::TargetUpdated { id, origin });
    }

    fn get_annotation(&self, id: AnnotationId) -> Option<&TextAnnotation> {
        self.records
            .iter()
            .find(|r| r.annotation.id == id)
            .map(|r| &r.annotation)
    }

    fn delete_annotation(&mut self, id: AnnotationId, origin: Origin) -> bool {
        let before = self.records.len();
        self.records.retain(|r| r.annotation.id != id);
        let deleted = self.records.len() < before;
        if deleted {
            self.emit(StoreEvent::Deleted { id, origin });
        }
        deleted
    }

    fn get_at(&self, x: f32, y: f32, filter: Option<AnnotationFilter>) -> Option<&TextAnnotation> {
        // Later insertions render on top
        self.records
            .iter()
            .rev()
            .find(|record| {
                record.rects.iter().any(|rect| rect.contains(x, y))
                    && filter.map_or(true, |f| f(&record.annotation))
            })
            .map(|record| &record.annotation)
    }

    fn get_intersecting_rects(
        &self,
        min_x: f32,
        min_y: f32,
        max_x: f32,
        max_y: f32,
    ) -> Vec<AnnotatedRects> {
        let viewport = Rect::from_ltrb(min_x, min_y, max_x, max_y);
        self.records
            .iter()
            .filter(|record| record.rects.iter().any(|rect| rect.intersects(&viewport)))
            .map(|record| AnnotatedRects {
                annotation: record.annotation.clone(),
                rects: record.rects.clone(),
            })
            .collect()
    }

    fn recalculate_positions(&mut self) {
        for i in 0..self.records.len() {
            let annotation = self.records[i].annotation.clone();
            let (rects, unanchored) = self.resolve_rects(&annotation);
            self.records[i].rects = rects;
            self.records[i].unanchored_selectors = unanchored;
        }
        self.emit(StoreEvent::Recalculated);
    }

    fn observe(&mut self, observer: StoreObserver) {
        self.observers.push(observer);
    }

    fn clear_observers(&mut self) {
        self.observers.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::RangeSelector;
    use crate::codec::encode_position;
    use crate::dom::{TextPosition, TextRange};
    use crate::layout::MonospaceLayout;
    use std::cell::Cell;

    fn store_with(text: &str) -> (MemoryStore, Rc<RefCell<DocumentTree>>) {
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
        (store, doc)
    }

    fn annotation_for(
        doc: &DocumentTree,
        from: u32,
        to: u32,
    ) -> TextAnnotation {
        let t = doc.text_nodes_under(doc.root())[0];
        let range = TextRange::new(
            TextPosition { node: t, offset: from },
            TextPosition { node: t, offset: to },
        );
        let start = encode_position(doc, doc.root(), range.start, None).unwrap();
        let end = encode_position(doc, doc.root(), range.end, None).unwrap();
        let mut target = crate::annotation::AnnotationTarget::new(None);
        target.set_selectors(vec![RangeSelector::new(start, end, range.text(doc))]);
        TextAnnotation::from_target(target)
    }

    #[test]
    fn test_add_resolves_rects() {
        let (mut store, doc) = store_with("hello world");
        let annotation = annotation_for(&doc.borrow(), 0, 5);
        let id = annotation.id;
        store.add_annotation(annotation, Origin::Local);

        assert_eq!(store.len(), 1);
        assert_eq!(store.unanchored_selectors(id), Some(0));
        let hits = store.get_intersecting_rects(0.0, 0.0, 1000.0, 1000.0);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].rects.len(), 1);
    }

    #[test]
    fn test_observer_fires_after_mutation() {
        let (mut store, doc) = store_with("hello world");
        let seen = Rc::new(Cell::new(0));
        let seen_in_observer = Rc::clone(&seen);
        store.observe(Box::new(move |event| {
            if matches!(event, StoreEvent::Created { .. }) {
                seen_in_observer.set(seen_in_observer.get() + 1);
            }
        }));
        store.add_annotation(annotation_for(&doc.borrow(), 0, 5), Origin::Local);
        assert_eq!(seen.get(), 1);
    }

    #[test]
    fn test_get_at_topmost_and_filter() {
        let (mut store, doc) = store_with("hello world");
        let bottom = annotation_for(&doc.borrow(), 0, 11);
        let top = annotation_for(&doc.borrow(), 0, 5);
        let bottom_id = bottom.id;
        let top_id = top.id;
        store.add_annotation(bottom, Origin::Local);
        store.add_annotation(top, Origin::Local);

        // Both cover x=10, latest insertion wins
        assert_eq!(store.get_at(10.0, 5.0, None).unwrap().id, top_id);

        let only_bottom = |a: &TextAnnotation| a.id == bottom_id;
        assert_eq!(
            store.get_at(10.0, 5.0, Some(&only_bottom)).unwrap().id,
            bottom_id
        );

        // Far outside everything
        assert!(store.get_at(999.0, 999.0, None).is_none());
    }

    #[test]
    fn test_viewport_culling() {
        let (mut store, doc) = store_with(&"x".repeat(200));
        // Line 0 (y 0..16) and line 2 (y 32..48) under the default layout
        let first_line = annotation_for(&doc.borrow(), 0, 10);
        let third_line = annotation_for(&doc.borrow(), 165, 175);
        let first_id = first_line.id;
        store.add_annotation(first_line, Origin::Local);
        store.add_annotation(third_line, Origin::Local);

        let hits = store.get_intersecting_rects(0.0, 0.0, 640.0, 16.0);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].annotation.id, first_id);
    }

    #[test]
    fn test_unanchored_excluded_from_paint_and_hit_test() {
        let (mut store, doc) = store_with("hello world");
        let mut annotation = annotation_for(&doc.borrow(), 0, 5);
        annotation.target.selectors[0].quote = "no longer present".to_string();
        let id = annotation.id;
        store.add_annotation(annotation, Origin::Local);

        assert_eq!(store.unanchored_selectors(id), Some(1));
        assert!(store.get_intersecting_rects(0.0, 0.0, 1000.0, 1000.0).is_empty());
        assert!(store.get_at(10.0, 5.0, None).is_none());
        // The selector itself is retained unchanged in the store
        assert_eq!(
            store.get_annotation(id).unwrap().target.selectors[0].quote,
            "no longer present"
        );
    }

    #[test]
    fn test_recalculate_after_document_edit() {
        let (mut store, doc) = store_with("hello world");
        let annotation = annotation_for(&doc.borrow(), 6, 11);
        let id = annotation.id;
        store.add_annotation(annotation, Origin::Local);

        // Re-render shifts the quote; reanchoring finds it again
        {
            let mut doc = doc.borrow_mut();
            let t = doc.text_nodes_under(doc.root())[0];
            doc.set_text(t, "hi world");
        }
        store.recalculate_positions();

        assert_eq!(store.unanchored_selectors(id), Some(0));
        let hits = store.get_intersecting_rects(0.0, 0.0, 1000.0, 1000.0);
        assert_eq!(hits.len(), 1);
        // "world" now starts at column 3
        assert_eq!(hits[0].rects[0].x, 24.0);
    }
}

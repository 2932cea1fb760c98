//! Viewport math and visibility tracking
//!
//! The store keeps rectangles in container coordinates. The visible box is
//! derived from where the container currently sits relative to the window
//! (its origin goes negative as the user scrolls past it), and painted
//! rectangles are offset back to screen coordinates. Both conversions are
//! pure functions, testable without a display.

use std::collections::HashSet;

use crate::annotation::AnnotationId;
use crate::geometry::Rect;

/// Visible box in container coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl Viewport {
    /// Derive the visible box from the container's window-relative origin
    /// and the window dimensions
    pub fn compute(origin_x: f32, origin_y: f32, window_width: f32, window_height: f32) -> Self {
        Self {
            min_x: -origin_x,
            min_y: -origin_y,
            max_x: window_width - origin_x,
            max_y: window_height - origin_y,
        }
    }
}

/// Translate a container-relative rectangle into screen coordinates
pub fn to_screen(rect: Rect, origin_x: f32, origin_y: f32) -> Rect {
    rect.translated(origin_x, origin_y)
}

/// Visibility transitions since the previous paint
#[derive(Debug, Default, Clone, PartialEq)]
pub struct VisibilityChange {
    pub entered: Vec<AnnotationId>,
    pub left: Vec<AnnotationId>,
}

impl VisibilityChange {
    pub fn is_empty(&self) -> bool {
        self.entered.is_empty() && self.left.is_empty()
    }
}

/// Tracks which annotations are in view across paints
///
/// Fed the painted set after every paint; consumers react to enter/leave
/// transitions without re-deriving intersection themselves.
#[derive(Default)]
pub struct ViewportTracker {
    in_view: HashSet<AnnotationId>,
    observer: Option<Box<dyn FnMut(&VisibilityChange)>>,
}

impl ViewportTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_observer(&mut self, observer: Box<dyn FnMut(&VisibilityChange)>) {
        self.observer = Some(observer);
    }

    pub fn in_view(&self) -> &HashSet<AnnotationId> {
        &self.in_view
    }

    /// Record one paint's annotation set; returns the transitions and
    /// notifies the observer only when something actually changed
    pub fn update(&mut self, painted: &[AnnotationId]) -> VisibilityChange {
        let current: HashSet<AnnotationId> = painted.iter().copied().collect();
        let change = VisibilityChange {
            entered: current.difference(&self.in_view).copied().collect(),
            left: self.in_view.difference(&current).copied().collect(),
        };
        self.in_view = current;
        if !change.is_empty() {
            if let Some(observer) = &mut self.observer {
                observer(&change);
            }
        }
        change
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_viewport_from_scrolled_container() {
        // Container scrolled 100px past the top of an 800x600 window
        let viewport = Viewport::compute(0.0, -100.0, 800.0, 600.0);
        assert_eq!(viewport.min_y, 100.0);
        assert_eq!(viewport.max_y, 700.0);
        assert_eq!(viewport.min_x, 0.0);
        assert_eq!(viewport.max_x, 800.0);
    }

    #[test]
    fn test_to_screen_round_trips_viewport_offset() {
        let rect = Rect::new(10.0, 150.0, 40.0, 16.0);
        let screen = to_screen(rect, 0.0, -100.0);
        assert_eq!(screen.y, 50.0);
        assert_eq!(screen.x, 10.0);
    }

    #[test]
    fn test_tracker_reports_enter_and_leave_once() {
        let mut tracker = ViewportTracker::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        let change = tracker.update(&[a]);
        assert_eq!(change.entered, vec![a]);
        assert!(change.left.is_empty());

        // Same set again: no transitions
        assert!(tracker.update(&[a]).is_empty());

        let change = tracker.update(&[b]);
        assert_eq!(change.entered, vec![b]);
        assert_eq!(change.left, vec![a]);
        assert!(tracker.in_view().contains(&b));
    }

    #[test]
    fn test_tracker_observer_fires_on_transitions_only() {
        use std::cell::Cell;
        use std::rc::Rc;

        let mut tracker = ViewportTracker::new();
        let fired = Rc::new(Cell::new(0));
        let fired_inner = Rc::clone(&fired);
        tracker.set_observer(Box::new(move |_| {
            fired_inner.set(fired_inner.get() + 1);
        }));

        let a = Uuid::new_v4();
        tracker.update(&[a]);
        tracker.update(&[a]);
        tracker.update(&[]);
        assert_eq!(fired.get(), 2);
    }
}

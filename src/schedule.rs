//! Cooperative scheduling primitives
//!
//! Everything runs on one UI event loop; deferral means "on a later frame
//! pump", never a thread or a timer. Hosts call the annotator's `frame`
//! once per animation tick with the current clock, and these primitives
//! decide what is due.

use std::cell::Cell;
use std::rc::Rc;

/// Trailing-edge debounce over an external millisecond clock
///
/// Repeated triggers push the deadline out; `fire_if_due` consumes the
/// pending state at most once per quiet period.
#[derive(Debug, Clone)]
pub struct Debouncer {
    delay_ms: f64,
    deadline: Option<f64>,
}

impl Debouncer {
    pub fn new(delay_ms: f64) -> Self {
        Self {
            delay_ms,
            deadline: None,
        }
    }

    pub fn trigger(&mut self, now_ms: f64) {
        self.deadline = Some(now_ms + self.delay_ms);
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Consume the pending state if the quiet period has elapsed
    pub fn fire_if_due(&mut self, now_ms: f64) -> bool {
        match self.deadline {
            Some(deadline) if now_ms >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }
}

/// Shared one-shot flag for frame-coalesced work
///
/// Observers set it from inside callbacks; the owner takes it once per
/// frame, so any number of triggers inside one frame collapse into a
/// single unit of work.
#[derive(Debug, Clone, Default)]
pub struct SharedFlag(Rc<Cell<bool>>);

impl SharedFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self) {
        self.0.set(true);
    }

    pub fn get(&self) -> bool {
        self.0.get()
    }

    /// Read and clear
    pub fn take(&self) -> bool {
        self.0.replace(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debounce_coalesces_bursts() {
        let mut debouncer = Debouncer::new(10.0);
        debouncer.trigger(0.0);
        debouncer.trigger(3.0);
        debouncer.trigger(6.0);

        assert!(!debouncer.fire_if_due(8.0));
        assert!(debouncer.fire_if_due(16.0));
        // Consumed; does not fire again
        assert!(!debouncer.fire_if_due(30.0));
    }

    #[test]
    fn test_cancel_discards_pending_work() {
        let mut debouncer = Debouncer::new(10.0);
        debouncer.trigger(0.0);
        debouncer.cancel();
        assert!(!debouncer.fire_if_due(100.0));
    }

    #[test]
    fn test_shared_flag_take() {
        let flag = SharedFlag::new();
        let alias = flag.clone();
        alias.set();
        alias.set();
        assert!(flag.take());
        assert!(!flag.take());
    }
}

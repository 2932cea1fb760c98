//! Input signals
//!
//! The host forwards raw pointer, keyboard, and native-selection signals as
//! [`InputEvent`]s. Pointer coordinates are container-relative. Events are
//! plain owned values, so a cloned record stays valid across ticks (native
//! platform events are not safe to retain).

use crate::dom::{NodeId, TextRange};

/// Pointer button
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
    Other,
}

/// One pointer signal
#[derive(Debug, Clone, PartialEq)]
pub struct PointerInput {
    /// Container-relative coordinates
    pub x: f32,
    pub y: f32,
    pub button: PointerButton,
    /// Milliseconds, same clock as every other signal
    pub time_stamp: f64,
    /// Node the event originated on, when the platform resolves one
    pub target: Option<NodeId>,
}

/// Modifier key state at the time of a key signal
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

/// Key identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    Shift,
    Character(char),
    Named(String),
}

/// One keyboard signal
#[derive(Debug, Clone, PartialEq)]
pub struct KeyInput {
    pub key: Key,
    pub modifiers: Modifiers,
    pub repeat: bool,
    pub time_stamp: f64,
}

impl KeyInput {
    /// Whether this is the platform "select all" chord
    pub fn is_select_all(&self) -> bool {
        matches!(self.key, Key::Character('a')) && (self.modifiers.ctrl || self.modifiers.meta)
    }
}

/// Snapshot of the native selection at a selection-change signal
#[derive(Debug, Clone, PartialEq)]
pub struct NativeSelection {
    /// Current live range, `None` when there is no selection
    pub range: Option<TextRange>,
    /// Node the selection's anchor sits in
    pub anchor: Option<NodeId>,
}

impl NativeSelection {
    pub fn is_collapsed(&self) -> bool {
        match &self.range {
            Some(range) => range.is_collapsed(),
            None => true,
        }
    }
}

/// The input alphabet of the annotator
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    PointerDown(PointerInput),
    PointerUp(PointerInput),
    PointerMove(PointerInput),
    /// A selection gesture began on `target`
    SelectStart {
        target: Option<NodeId>,
        time_stamp: f64,
    },
    /// The native selection changed
    SelectionChange {
        selection: NativeSelection,
        time_stamp: f64,
    },
    KeyDown(KeyInput),
    KeyUp(KeyInput),
    Scroll,
    Resize {
        width: f32,
        height: f32,
        time_stamp: f64,
    },
}

/// Cloned record of the signal that initiated or finished a gesture
#[derive(Debug, Clone, PartialEq)]
pub enum InputTrigger {
    Pointer(PointerInput),
    Key(KeyInput),
}

impl InputTrigger {
    pub fn time_stamp(&self) -> f64 {
        match self {
            InputTrigger::Pointer(p) => p.time_stamp,
            InputTrigger::Key(k) => k.time_stamp,
        }
    }
}

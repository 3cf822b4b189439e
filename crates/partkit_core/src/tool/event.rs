//! Input events routed from the rendering toolkit to tools.

use crate::geometry::Point;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    pub shift: bool,
    pub alt: bool,
    pub ctrl: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        alt: false,
        ctrl: false,
    };
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointerButton {
    #[default]
    Primary,
    Secondary,
    Middle,
}

/// Pointer state in scene coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerEvent {
    pub position: Point,
    pub button: PointerButton,
    pub modifiers: Modifiers,
}

impl PointerEvent {
    /// Primary-button event at `(x, y)` without modifiers.
    pub fn at(x: f64, y: f64) -> Self {
        Self {
            position: Point::new(x, y),
            button: PointerButton::Primary,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }
}

/// Event kinds tools subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EventKind {
    Press,
    Drag,
    Release,
    Move,
    Cancel,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Press => "press",
            Self::Drag => "drag",
            Self::Release => "release",
            Self::Move => "move",
            Self::Cancel => "cancel",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum InputEvent {
    Press(PointerEvent),
    Drag(PointerEvent),
    Release(PointerEvent),
    Move(PointerEvent),
    /// Abort the gesture in progress (e.g. escape key, focus loss).
    Cancel,
}

impl InputEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Press(_) => EventKind::Press,
            Self::Drag(_) => EventKind::Drag,
            Self::Release(_) => EventKind::Release,
            Self::Move(_) => EventKind::Move,
            Self::Cancel => EventKind::Cancel,
        }
    }

    pub fn pointer(&self) -> Option<&PointerEvent> {
        match self {
            Self::Press(pointer)
            | Self::Drag(pointer)
            | Self::Release(pointer)
            | Self::Move(pointer) => Some(pointer),
            Self::Cancel => None,
        }
    }
}

//! Pointer gestures and drawing actions fed into the session.

use crate::document::BackgroundRef;
use crate::geometry::{Color, Point};

/// Pointer-drag events, delivered in strict order per gesture:
/// one `DragStart`, any number of `Drag`, then exactly one `DragEnd` or `DragCancel`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    DragStart(Point),
    Drag(Point),
    DragEnd,
    DragCancel,
}

impl PointerEvent {
    /// Position carried by the event, if any.
    pub fn position(&self) -> Option<Point> {
        match self {
            PointerEvent::DragStart(p) | PointerEvent::Drag(p) => Some(*p),
            PointerEvent::DragEnd | PointerEvent::DragCancel => None,
        }
    }

    /// Whether this event finishes the gesture.
    pub fn ends_gesture(&self) -> bool {
        matches!(self, PointerEvent::DragEnd | PointerEvent::DragCancel)
    }
}

/// Everything a UI can ask the session to do.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawingAction {
    /// Begin a stroke with the current brush.
    StartStroke(Point),
    AddPoint(Point),
    EndStroke,
    ClearCanvas,
    Undo,
    Redo,
    SetBackgroundImage(Option<BackgroundRef>),
    UpdateBrushColor(Color),
    UpdateBrushWidth(f64),
}

impl From<PointerEvent> for DrawingAction {
    fn from(event: PointerEvent) -> Self {
        match event {
            PointerEvent::DragStart(p) => DrawingAction::StartStroke(p),
            PointerEvent::Drag(p) => DrawingAction::AddPoint(p),
            PointerEvent::DragEnd | PointerEvent::DragCancel => DrawingAction::EndStroke,
        }
    }
}

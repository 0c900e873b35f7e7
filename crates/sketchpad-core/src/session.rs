//! Drawing session: the sole mutator of the document and its history.
//!
//! The session is driven from a single event-sequencing context (the UI
//! thread). Every call is synchronous and non-blocking. Renderers and
//! exporters work from [`DrawingSession::snapshot`], which is cheap to take
//! and unaffected by later mutations.
//!
//! Undo granularity is one entry per stroke and one per clear:
//! - `begin_stroke` records the committed strokes before the stroke starts;
//! - `end_stroke` and `clear` invalidate redo;
//! - `undo`/`redo` always drop the active stroke.

use crate::config::{BrushConfig, SketchConfig};
use crate::document::{BackgroundRef, DrawingDocument};
use crate::error::{SessionError, SessionResult};
use crate::geometry::{Color, Point};
use crate::history::History;
use crate::input::{DrawingAction, PointerEvent};
use crate::stroke::Stroke;
use kurbo::Size;

/// Current brush settings applied to new strokes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Brush {
    pub color: Color,
    pub width: f64,
}

impl Default for Brush {
    fn default() -> Self {
        let config = BrushConfig::default();
        Self {
            color: config.color,
            width: config.width,
        }
    }
}

/// Handle returned by [`DrawingSession::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&DrawingDocument)>;

/// Owns the document, the history and the brush.
pub struct DrawingSession {
    document: DrawingDocument,
    history: History,
    brush: Brush,
    brush_limits: BrushConfig,
    revision: u64,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
}

impl std::fmt::Debug for DrawingSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DrawingSession")
            .field("document", &self.document)
            .field("history", &self.history)
            .field("brush", &self.brush)
            .field("revision", &self.revision)
            .field("listeners", &format!("<{} listeners>", self.listeners.len()))
            .finish()
    }
}

impl Default for DrawingSession {
    fn default() -> Self {
        Self::new()
    }
}

impl DrawingSession {
    /// Create a session with default settings and an empty document.
    pub fn new() -> Self {
        Self::with_config(&SketchConfig::default())
    }

    /// Create a session from configuration.
    ///
    /// An invalid configuration is logged and used as far as it goes: the
    /// brush width is clamped, and a zero history depth keeps one entry.
    pub fn with_config(config: &SketchConfig) -> Self {
        if let Err(e) = config.validate() {
            log::warn!("Using invalid session configuration: {}", e);
        }
        let limits = config.brush.clone();
        Self {
            document: DrawingDocument::new(),
            history: History::with_max_depth(config.history.max_depth),
            brush: Brush {
                color: limits.color,
                width: limits.clamp_width(limits.width),
            },
            brush_limits: limits,
            revision: 0,
            listeners: Vec::new(),
            next_subscription: 0,
        }
    }

    // --- Queries ---

    /// Current document state.
    pub fn document(&self) -> &DrawingDocument {
        &self.document
    }

    /// Immutable copy of the document for rendering off the event thread.
    ///
    /// Strokes are shared, so this costs one reference-count bump per
    /// stroke list rather than a deep copy.
    pub fn snapshot(&self) -> DrawingDocument {
        self.document.clone()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn brush(&self) -> Brush {
        self.brush
    }

    /// Incremented on every observable change.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    // --- Stroke capture ---

    /// Start a stroke. No-op if a stroke is already active or the width is invalid.
    pub fn begin_stroke(&mut self, point: Point, color: Color, width: f64) {
        if let Err(e) = self.try_begin_stroke(point, color, width) {
            log::debug!("begin_stroke ignored: {}", e);
        }
    }

    /// Start a stroke with the current brush.
    pub fn begin_stroke_with_brush(&mut self, point: Point) {
        let Brush { color, width } = self.brush;
        self.begin_stroke(point, color, width);
    }

    /// Strict variant of [`begin_stroke`](Self::begin_stroke).
    pub fn try_begin_stroke(&mut self, point: Point, color: Color, width: f64) -> SessionResult<()> {
        if self.document.has_active_stroke() {
            return Err(SessionError::InvalidState);
        }
        let stroke = Stroke::new(point, color, width).ok_or(SessionError::InvalidWidth(width))?;

        self.history.push_undo(self.document.snapshot());
        self.document.set_active(stroke);
        self.changed();
        Ok(())
    }

    /// Append a point to the active stroke. No-op if none is active.
    pub fn add_point(&mut self, point: Point) {
        if let Err(e) = self.try_add_point(point) {
            log::trace!("add_point ignored: {}", e);
        }
    }

    /// Strict variant of [`add_point`](Self::add_point).
    pub fn try_add_point(&mut self, point: Point) -> SessionResult<()> {
        let stroke = self.document.active_mut().ok_or(SessionError::NoActiveStroke)?;
        stroke.add_point(point);
        self.changed();
        Ok(())
    }

    /// Commit the active stroke. No-op if none is active.
    pub fn end_stroke(&mut self) {
        if let Err(e) = self.try_end_stroke() {
            log::debug!("end_stroke ignored: {}", e);
        }
    }

    /// Strict variant of [`end_stroke`](Self::end_stroke).
    pub fn try_end_stroke(&mut self) -> SessionResult<()> {
        let stroke = self.document.take_active().ok_or(SessionError::NoActiveStroke)?;
        log::debug!(
            "Committed stroke #{} with {} points",
            self.document.len() + 1,
            stroke.len()
        );

        self.document.push_committed(stroke.freeze());
        self.history.clear_redo();
        self.changed();
        Ok(())
    }

    // --- History ---

    /// Undo the last change.
    /// Returns true if undo was performed, false if nothing to undo.
    pub fn undo(&mut self) -> bool {
        let Some(snapshot) = self.history.pop_undo() else {
            return false;
        };

        self.history.push_redo(self.document.snapshot());
        self.document.restore(snapshot);
        log::debug!("Undo: {} strokes", self.document.len());
        self.changed();
        true
    }

    /// Redo the last undone change.
    /// Returns true if redo was performed, false if nothing to redo.
    pub fn redo(&mut self) -> bool {
        let Some(snapshot) = self.history.pop_redo() else {
            return false;
        };

        self.history.push_undo(self.document.snapshot());
        self.document.restore(snapshot);
        log::debug!("Redo: {} strokes", self.document.len());
        self.changed();
        true
    }

    /// Remove all strokes and the background image. Undoable.
    pub fn clear(&mut self) {
        self.history.push_undo(self.document.snapshot());
        self.document.clear_committed();
        self.document.clear_active();
        self.document.set_background(None);
        self.history.clear_redo();
        log::debug!("Canvas cleared");
        self.changed();
    }

    // --- Canvas and brush (not part of history) ---

    pub fn set_background_image(&mut self, background: Option<BackgroundRef>) {
        if self.document.background() == background.as_ref() {
            return;
        }
        self.document.set_background(background);
        self.changed();
    }

    pub fn set_canvas_size(&mut self, width: f64, height: f64) {
        let size = Size::new(width, height);
        if self.document.canvas_size() == size {
            return;
        }
        self.document.set_canvas_size(size);
        self.changed();
    }

    pub fn set_brush_color(&mut self, color: Color) {
        self.brush.color = color;
    }

    /// Set the brush width, clamped to the configured range.
    pub fn set_brush_width(&mut self, width: f64) {
        if width.is_nan() {
            return;
        }
        self.brush.width = self.brush_limits.clamp_width(width);
    }

    // --- Dispatch ---

    /// Route a pointer event to the matching stroke-capture call.
    pub fn handle_pointer(&mut self, event: PointerEvent) {
        self.apply(event.into());
    }

    /// Perform a drawing action.
    pub fn apply(&mut self, action: DrawingAction) {
        match action {
            DrawingAction::StartStroke(point) => self.begin_stroke_with_brush(point),
            DrawingAction::AddPoint(point) => self.add_point(point),
            DrawingAction::EndStroke => self.end_stroke(),
            DrawingAction::ClearCanvas => self.clear(),
            DrawingAction::Undo => {
                self.undo();
            }
            DrawingAction::Redo => {
                self.redo();
            }
            DrawingAction::SetBackgroundImage(background) => self.set_background_image(background),
            DrawingAction::UpdateBrushColor(color) => self.set_brush_color(color),
            DrawingAction::UpdateBrushWidth(width) => self.set_brush_width(width),
        }
    }

    // --- Change notification ---

    /// Register a listener called with the document after every change.
    pub fn subscribe(&mut self, listener: impl FnMut(&DrawingDocument) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Remove a listener. Returns false if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        self.listeners.len() != before
    }

    fn changed(&mut self) {
        self.revision = self.revision.wrapping_add(1);
        for (_, listener) in &mut self.listeners {
            listener(&self.document);
        }
    }
}

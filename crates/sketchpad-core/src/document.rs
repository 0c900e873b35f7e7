//! Drawing document: committed strokes, the in-progress stroke and canvas state.

use crate::stroke::{Stroke, StrokeRef};
use kurbo::Size;
use std::path::PathBuf;
use std::sync::Arc;

/// Opaque reference to a background image, as handed over by the import collaborator.
///
/// The core never decodes it; it is only passed on to the decoder and rasterizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackgroundRef {
    /// Image file on disk.
    Path(PathBuf),
    /// Encoded image bytes (PNG, JPEG or WebP).
    Bytes(Arc<[u8]>),
}

impl BackgroundRef {
    /// Wrap encoded image bytes.
    pub fn from_bytes(bytes: impl Into<Arc<[u8]>>) -> Self {
        Self::Bytes(bytes.into())
    }
}

impl From<PathBuf> for BackgroundRef {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

/// An immutable copy of the committed strokes at one point in time.
///
/// Cloning is O(1): the stroke list is shared and copied only when a
/// document that still shares it appends a stroke.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistorySnapshot {
    strokes: Arc<Vec<StrokeRef>>,
}

impl HistorySnapshot {
    /// Strokes in z-order.
    pub fn strokes(&self) -> &[StrokeRef] {
        &self.strokes
    }

    /// Number of strokes in the snapshot.
    pub fn len(&self) -> usize {
        self.strokes.len()
    }

    /// True if the snapshot holds no strokes.
    pub fn is_empty(&self) -> bool {
        self.strokes.is_empty()
    }

    /// Whether two snapshots share the same underlying list.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.strokes, &other.strokes)
    }
}

/// The drawing being edited.
///
/// Committed strokes are kept in z-order (back to front). At most one
/// stroke is active at a time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DrawingDocument {
    committed: HistorySnapshot,
    active: Option<Stroke>,
    canvas_size: Size,
    background: Option<BackgroundRef>,
}

impl DrawingDocument {
    /// Create an empty document with a zero-sized canvas.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty document with the given canvas size.
    pub fn with_canvas_size(width: f64, height: f64) -> Self {
        Self {
            canvas_size: Size::new(width, height),
            ..Self::default()
        }
    }

    /// Committed strokes in z-order (back to front).
    pub fn committed_strokes(&self) -> &[StrokeRef] {
        self.committed.strokes()
    }

    /// The stroke being drawn, if any.
    pub fn active_stroke(&self) -> Option<&Stroke> {
        self.active.as_ref()
    }

    /// Check if a stroke is in progress.
    pub fn has_active_stroke(&self) -> bool {
        self.active.is_some()
    }

    /// Get the live canvas size.
    pub fn canvas_size(&self) -> Size {
        self.canvas_size
    }

    /// Get the canvas width.
    pub fn canvas_width(&self) -> f64 {
        self.canvas_size.width
    }

    /// Get the canvas height.
    pub fn canvas_height(&self) -> f64 {
        self.canvas_size.height
    }

    /// Get the background image reference.
    pub fn background(&self) -> Option<&BackgroundRef> {
        self.background.as_ref()
    }

    /// Number of committed strokes.
    pub fn len(&self) -> usize {
        self.committed.len()
    }

    /// True when there are no committed strokes and nothing in progress.
    pub fn is_empty(&self) -> bool {
        self.committed.is_empty() && self.active.is_none()
    }

    /// Snapshot of the committed strokes for the history.
    pub(crate) fn snapshot(&self) -> HistorySnapshot {
        self.committed.clone()
    }

    /// Replace the committed strokes with a snapshot and drop the active stroke.
    pub(crate) fn restore(&mut self, snapshot: HistorySnapshot) {
        self.committed = snapshot;
        self.active = None;
    }

    pub(crate) fn set_active(&mut self, stroke: Stroke) {
        self.active = Some(stroke);
    }

    pub(crate) fn active_mut(&mut self) -> Option<&mut Stroke> {
        self.active.as_mut()
    }

    pub(crate) fn take_active(&mut self) -> Option<Stroke> {
        self.active.take()
    }

    pub(crate) fn clear_active(&mut self) {
        self.active = None;
    }

    /// Append a committed stroke on top of the z-order.
    pub(crate) fn push_committed(&mut self, stroke: StrokeRef) {
        Arc::make_mut(&mut self.committed.strokes).push(stroke);
    }

    pub(crate) fn clear_committed(&mut self) {
        self.committed = HistorySnapshot::default();
    }

    pub(crate) fn set_canvas_size(&mut self, size: Size) {
        self.canvas_size = size;
    }

    pub(crate) fn set_background(&mut self, background: Option<BackgroundRef>) {
        self.background = background;
    }
}

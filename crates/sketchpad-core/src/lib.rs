//! Sketchpad Core Library
//!
//! Platform-agnostic drawing state for the Sketchpad freehand drawing tool:
//! stroke capture, the drawing document, and bounded undo/redo history.

pub mod config;
pub mod document;
pub mod error;
pub mod geometry;
pub mod history;
pub mod input;
pub mod session;
pub mod stroke;

pub use config::{BrushConfig, ExportConfig, HistoryConfig, SketchConfig};
pub use document::{BackgroundRef, DrawingDocument, HistorySnapshot};
pub use error::{ConfigError, ConfigResult, SessionError, SessionResult};
pub use geometry::{Color, Point};
pub use history::{History, MAX_UNDO_HISTORY};
pub use input::{DrawingAction, PointerEvent};
pub use session::{Brush, DrawingSession, SubscriptionId};
pub use stroke::{Stroke, StrokeRef};

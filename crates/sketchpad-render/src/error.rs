//! Render, decode and export errors.

use thiserror::Error;

/// Rasterization errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RasterError {
    #[error("Invalid canvas size: {width}x{height}")]
    InvalidCanvasSize { width: f64, height: f64 },
    #[error("Failed to allocate {width}x{height} raster")]
    Allocation { width: u32, height: u32 },
}

/// Result type for rasterization.
pub type RasterResult<T> = Result<T, RasterError>;

/// Background image decoding errors. Never fatal.
#[derive(Debug, Error)]
pub enum BackgroundError {
    #[error("Failed to read background image: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to decode background image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("Background image has no pixels")]
    Empty,
}

/// Export and share errors. Converted to pass/fail at the gateway.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error(transparent)]
    Raster(#[from] RasterError),
    #[error("JPEG encoding failed: {0}")]
    Encode(#[from] image::ImageError),
    #[error("IO error: {0}")]
    Io(String),
    #[error("No output directory available")]
    NoOutputDir,
    #[error("Export task failed: {0}")]
    Task(String),
}

/// Result type for export operations.
pub type ExportResult<T> = Result<T, ExportError>;

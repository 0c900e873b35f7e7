//! Sketchpad Render Library
//!
//! Turns a drawing document into pixels: CPU rasterization with tiny-skia,
//! background image decoding, JPEG encoding, and the asynchronous
//! export/share gateway.

pub mod background;
pub mod encode;
pub mod error;
pub mod export;
pub mod loader;
pub mod raster;
pub mod sink;

pub use background::BackgroundImage;
pub use encode::encode_jpeg;
pub use error::{BackgroundError, ExportError, ExportResult, RasterError, RasterResult};
pub use export::ExportGateway;
pub use loader::BackgroundLoader;
pub use raster::{rasterize, render, RasterImage, RenderMode, RenderSettings};
pub use sink::{ExportSink, MemorySink};

#[cfg(not(target_arch = "wasm32"))]
pub use sink::DirectorySink;

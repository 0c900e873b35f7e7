//! Destinations for encoded images.

mod memory;

#[cfg(not(target_arch = "wasm32"))]
mod directory;

pub use memory::MemorySink;

#[cfg(not(target_arch = "wasm32"))]
pub use directory::DirectorySink;

use crate::error::ExportResult;
use std::path::PathBuf;

/// Somewhere an encoded image can be written.
///
/// Sinks are called from a blocking worker thread, never from the event
/// thread, so implementations may perform synchronous IO.
pub trait ExportSink: Send + Sync {
    /// Store `bytes` under `file_name` and return where it ended up.
    fn write_image(&self, file_name: &str, bytes: &[u8]) -> ExportResult<PathBuf>;
}

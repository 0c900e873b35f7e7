//! In-memory sink, for tests and hosts that hand bytes on themselves.

use super::ExportSink;
use crate::error::ExportResult;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

/// Keeps written images in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    images: Mutex<Vec<(String, Vec<u8>)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<(String, Vec<u8>)>> {
        self.images.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Number of images written.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Names of written images, oldest first.
    pub fn names(&self) -> Vec<String> {
        self.lock().iter().map(|(name, _)| name.clone()).collect()
    }

    /// Bytes of the most recently written image.
    pub fn last(&self) -> Option<Vec<u8>> {
        self.lock().last().map(|(_, bytes)| bytes.clone())
    }

    /// Bytes of the image written under `name`.
    pub fn get(&self, name: &str) -> Option<Vec<u8>> {
        self.lock()
            .iter()
            .rev()
            .find(|(n, _)| n == name)
            .map(|(_, bytes)| bytes.clone())
    }
}

impl ExportSink for MemorySink {
    fn write_image(&self, file_name: &str, bytes: &[u8]) -> ExportResult<PathBuf> {
        self.lock().push((file_name.to_string(), bytes.to_vec()));
        Ok(PathBuf::from(file_name))
    }
}

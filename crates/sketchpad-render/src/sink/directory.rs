//! Filesystem sink for native platforms.

use super::ExportSink;
use crate::error::{ExportError, ExportResult};
use std::fs;
use std::path::{Path, PathBuf};

/// Writes images into a directory, creating it on first use.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    base_path: PathBuf,
}

impl DirectorySink {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn image_path(&self, file_name: &str) -> PathBuf {
        // Sanitize so a name can never escape the base directory
        let safe_name: String = file_name
            .chars()
            .map(|c| {
                if c.is_alphanumeric() || matches!(c, '-' | '_' | '.') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.base_path.join(safe_name.trim_start_matches('.'))
    }
}

impl ExportSink for DirectorySink {
    fn write_image(&self, file_name: &str, bytes: &[u8]) -> ExportResult<PathBuf> {
        fs::create_dir_all(&self.base_path).map_err(|e| {
            ExportError::Io(format!(
                "Failed to create {}: {}",
                self.base_path.display(),
                e
            ))
        })?;

        let path = self.image_path(file_name);
        fs::write(&path, bytes)
            .map_err(|e| ExportError::Io(format!("Failed to write {}: {}", path.display(), e)))?;
        Ok(path)
    }
}

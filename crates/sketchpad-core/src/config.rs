//! Configuration for the drawing session and export gateway.

use crate::error::{ConfigError, ConfigResult};
use crate::geometry::Color;
use crate::history::MAX_UNDO_HISTORY;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Sub-directory used for gallery exports and shared images.
const APP_DIR_NAME: &str = "Sketch";

/// Undo history settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Maximum number of undo snapshots kept.
    pub max_depth: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_depth: MAX_UNDO_HISTORY,
        }
    }
}

/// Initial brush and allowed width range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrushConfig {
    pub color: Color,
    pub width: f64,
    pub min_width: f64,
    pub max_width: f64,
}

impl Default for BrushConfig {
    fn default() -> Self {
        Self {
            color: Color::BLACK,
            width: 5.0,
            min_width: 1.0,
            max_width: 50.0,
        }
    }
}

impl BrushConfig {
    /// Clamp a requested width into the allowed range.
    ///
    /// Total for any bounds: a NaN bound is ignored and an inverted range
    /// resolves to `max_width`.
    pub fn clamp_width(&self, width: f64) -> f64 {
        width.max(self.min_width).min(self.max_width)
    }
}

/// Export and share settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// JPEG quality for gallery export.
    pub gallery_quality: u8,
    /// JPEG quality for the share-cache file.
    pub share_quality: u8,
    /// Fixed share raster width.
    pub share_width: u32,
    /// Fixed share raster height.
    pub share_height: u32,
    /// Filename prefix, as in `<prefix>_<millis>.jpg`.
    pub file_prefix: String,
    /// Gallery directory. `None` uses the platform picture directory.
    pub gallery_dir: Option<PathBuf>,
    /// Share-cache directory. `None` uses the platform cache directory.
    pub share_dir: Option<PathBuf>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            gallery_quality: 95,
            share_quality: 100,
            share_width: 1080,
            share_height: 1920,
            file_prefix: "sketch".to_string(),
            gallery_dir: None,
            share_dir: None,
        }
    }
}

impl ExportConfig {
    /// Resolve the gallery directory.
    ///
    /// On Unix: `~/Pictures/Sketch/`, falling back to the home directory.
    pub fn resolved_gallery_dir(&self) -> Option<PathBuf> {
        if let Some(dir) = &self.gallery_dir {
            return Some(dir.clone());
        }
        platform_dir(DirKind::Pictures)
    }

    /// Resolve the share-cache directory.
    pub fn resolved_share_dir(&self) -> Option<PathBuf> {
        if let Some(dir) = &self.share_dir {
            return Some(dir.clone());
        }
        platform_dir(DirKind::Cache)
    }

    /// Build an export filename for the given timestamp.
    pub fn file_name(&self, unix_millis: u128) -> String {
        format!("{}_{}.jpg", self.file_prefix, unix_millis)
    }
}

enum DirKind {
    Pictures,
    Cache,
}

#[cfg(not(target_arch = "wasm32"))]
fn platform_dir(kind: DirKind) -> Option<PathBuf> {
    let base = match kind {
        DirKind::Pictures => dirs::picture_dir().or_else(dirs::home_dir),
        DirKind::Cache => dirs::cache_dir().or_else(|| Some(std::env::temp_dir())),
    }?;
    Some(base.join(APP_DIR_NAME))
}

#[cfg(target_arch = "wasm32")]
fn platform_dir(_kind: DirKind) -> Option<PathBuf> {
    None
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SketchConfig {
    pub history: HistoryConfig,
    pub brush: BrushConfig,
    pub export: ExportConfig,
}

impl SketchConfig {
    /// Parse and validate a JSON configuration. Missing fields take defaults.
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Check value ranges.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.history.max_depth == 0 {
            return Err(ConfigError::Invalid("history.max_depth must be at least 1".into()));
        }

        let brush = &self.brush;
        if !(brush.min_width > 0.0 && brush.min_width <= brush.max_width) {
            return Err(ConfigError::Invalid(format!(
                "brush width range {}..{} is empty or non-positive",
                brush.min_width, brush.max_width
            )));
        }
        if !(brush.min_width..=brush.max_width).contains(&brush.width) {
            return Err(ConfigError::Invalid(format!(
                "brush.width {} outside {}..{}",
                brush.width, brush.min_width, brush.max_width
            )));
        }

        let export = &self.export;
        for (name, quality) in [
            ("gallery_quality", export.gallery_quality),
            ("share_quality", export.share_quality),
        ] {
            if !(1..=100).contains(&quality) {
                return Err(ConfigError::Invalid(format!("export.{} must be 1..=100", name)));
            }
        }
        if export.share_width == 0 || export.share_height == 0 {
            return Err(ConfigError::Invalid("export share size must be non-zero".into()));
        }
        if export.file_prefix.is_empty() {
            return Err(ConfigError::Invalid("export.file_prefix must not be empty".into()));
        }

        Ok(())
    }

    /// Set the undo depth.
    pub fn with_history_depth(mut self, max_depth: usize) -> Self {
        self.history.max_depth = max_depth;
        self
    }

    /// Set the initial brush.
    pub fn with_brush(mut self, color: Color, width: f64) -> Self {
        self.brush.color = color;
        self.brush.width = width;
        self
    }

    /// Set the gallery directory.
    pub fn with_gallery_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.export.gallery_dir = Some(dir.into());
        self
    }

    /// Set the share-cache directory.
    pub fn with_share_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.export.share_dir = Some(dir.into());
        self
    }
}

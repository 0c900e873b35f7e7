//! Export and share gateway.
//!
//! Both operations snapshot the document at call time, then rasterize,
//! encode and write on a blocking worker. Failures never propagate: export
//! resolves to `false` and share to `None`, with the cause logged.

use crate::background::BackgroundImage;
use crate::encode::encode_jpeg;
use crate::error::{ExportError, ExportResult};
use crate::raster::{render, RenderMode};
use crate::sink::ExportSink;
use sketchpad_core::{DrawingDocument, ExportConfig};
use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::runtime::Handle;

/// Renders documents to JPEG and hands them to the gallery or share sink.
#[derive(Clone)]
pub struct ExportGateway {
    config: ExportConfig,
    gallery: Arc<dyn ExportSink>,
    share: Arc<dyn ExportSink>,
    runtime: Handle,
}

impl fmt::Debug for ExportGateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExportGateway")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ExportGateway {
    /// Gateway writing into the configured (or platform default) directories.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn new(config: ExportConfig, runtime: Handle) -> ExportResult<Self> {
        use crate::sink::DirectorySink;

        let gallery = config.resolved_gallery_dir().ok_or(ExportError::NoOutputDir)?;
        let share = config.resolved_share_dir().ok_or(ExportError::NoOutputDir)?;
        log::debug!(
            "Export directories: gallery {}, share {}",
            gallery.display(),
            share.display()
        );

        Ok(Self::with_sinks(
            config,
            Arc::new(DirectorySink::new(gallery)),
            Arc::new(DirectorySink::new(share)),
            runtime,
        ))
    }

    /// Gateway with explicit sinks.
    pub fn with_sinks(
        config: ExportConfig,
        gallery: Arc<dyn ExportSink>,
        share: Arc<dyn ExportSink>,
        runtime: Handle,
    ) -> Self {
        Self {
            config,
            gallery,
            share,
            runtime,
        }
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Export at canvas size, with the background image, to the gallery sink.
    ///
    /// Blocks on rasterization and IO; prefer [`Self::export_drawing`] from
    /// the event thread.
    pub fn try_export(
        &self,
        document: &DrawingDocument,
        background: Option<&BackgroundImage>,
    ) -> ExportResult<PathBuf> {
        let raster = render(document, background, RenderMode::Export)?;
        let jpeg = encode_jpeg(&raster, self.config.gallery_quality)?;
        self.gallery.write_image(&self.next_file_name(), &jpeg)
    }

    /// Render at the fixed share size, without background, to the share sink.
    ///
    /// Blocks like [`Self::try_export`].
    pub fn try_share(&self, document: &DrawingDocument) -> ExportResult<PathBuf> {
        let raster = render(document, None, RenderMode::share(&self.config))?;
        let jpeg = encode_jpeg(&raster, self.config.share_quality)?;
        self.share.write_image(&self.next_file_name(), &jpeg)
    }

    /// Export a snapshot of `document` on a worker thread.
    ///
    /// The work starts immediately; the returned future only reports the
    /// outcome and may be dropped without cancelling it.
    pub fn export_drawing(
        &self,
        document: &DrawingDocument,
        background: Option<Arc<BackgroundImage>>,
    ) -> impl Future<Output = bool> + Send + use<> {
        let gateway = self.clone();
        let snapshot = document.clone();
        let task = self
            .runtime
            .spawn_blocking(move || gateway.try_export(&snapshot, background.as_deref()));

        async move {
            match flatten(task.await) {
                Ok(path) => {
                    log::info!("Exported drawing to {}", path.display());
                    true
                }
                Err(e) => {
                    log::error!("Export failed: {}", e);
                    false
                }
            }
        }
    }

    /// Share a snapshot of `document` on a worker thread, resolving to the
    /// written file's location.
    pub fn share_drawing(
        &self,
        document: &DrawingDocument,
    ) -> impl Future<Output = Option<PathBuf>> + Send + use<> {
        let gateway = self.clone();
        let snapshot = document.clone();
        let task = self
            .runtime
            .spawn_blocking(move || gateway.try_share(&snapshot));

        async move {
            match flatten(task.await) {
                Ok(path) => {
                    log::info!("Share image written to {}", path.display());
                    Some(path)
                }
                Err(e) => {
                    log::error!("Share failed: {}", e);
                    None
                }
            }
        }
    }

    fn next_file_name(&self) -> String {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0);
        self.config.file_name(millis)
    }
}

fn flatten(
    joined: Result<ExportResult<PathBuf>, tokio::task::JoinError>,
) -> ExportResult<PathBuf> {
    joined.map_err(|e| ExportError::Task(e.to_string()))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MemorySink;
    use image::{Rgba, RgbaImage};
    use sketchpad_core::{Color, DrawingSession, Point};

    fn init_logging() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    struct FailingSink;

    impl ExportSink for FailingSink {
        fn write_image(&self, _file_name: &str, _bytes: &[u8]) -> ExportResult<PathBuf> {
            Err(ExportError::Io("disk full".to_string()))
        }
    }

    fn small_share_config() -> ExportConfig {
        ExportConfig {
            share_width: 108,
            share_height: 192,
            ..ExportConfig::default()
        }
    }

    fn memory_gateway(config: ExportConfig) -> (ExportGateway, Arc<MemorySink>, Arc<MemorySink>) {
        let gallery = Arc::new(MemorySink::new());
        let share = Arc::new(MemorySink::new());
        let gateway = ExportGateway::with_sinks(config, gallery.clone(), share.clone(), Handle::current());
        (gateway, gallery, share)
    }

    fn session_with_line(width: f64, height: f64) -> DrawingSession {
        let mut session = DrawingSession::new();
        session.set_canvas_size(width, height);
        session.begin_stroke(Point::new(0.0, height / 2.0), Color::BLACK, 16.0);
        session.add_point(Point::new(width, height / 2.0));
        session.end_stroke();
        session
    }

    #[tokio::test]
    async fn test_export_writes_jpeg_at_canvas_size() {
        let dir = tempfile::tempdir().unwrap();
        let config = ExportConfig {
            gallery_dir: Some(dir.path().join("Sketch")),
            share_dir: Some(dir.path().join("cache")),
            ..ExportConfig::default()
        };
        let gateway = ExportGateway::new(config, Handle::current()).unwrap();
        let session = session_with_line(120.0, 80.0);

        assert!(gateway.export_drawing(session.document(), None).await);

        let files: Vec<_> = std::fs::read_dir(dir.path().join("Sketch"))
            .unwrap()
            .flatten()
            .map(|e| e.path())
            .collect();
        assert_eq!(files.len(), 1);

        let name = files[0].file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("sketch_"));
        assert!(name.ends_with(".jpg"));

        let decoded = image::open(&files[0]).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (120, 80));
    }

    #[tokio::test]
    async fn test_export_zero_canvas_fails_without_output() {
        init_logging();
        let (gateway, gallery, _) = memory_gateway(ExportConfig::default());
        let session = session_with_line(0.0, 80.0);

        assert!(!gateway.export_drawing(session.document(), None).await);
        assert!(gallery.is_empty());
        assert!(matches!(
            gateway.try_export(session.document(), None),
            Err(ExportError::Raster(_))
        ));
    }

    #[tokio::test]
    async fn test_export_failure_is_false() {
        init_logging();
        let gateway = ExportGateway::with_sinks(
            ExportConfig::default(),
            Arc::new(FailingSink),
            Arc::new(FailingSink),
            Handle::current(),
        );
        let session = session_with_line(20.0, 20.0);

        assert!(!gateway.export_drawing(session.document(), None).await);
        assert_eq!(gateway.share_drawing(session.document()).await, None);
    }

    #[tokio::test]
    async fn test_export_composites_background() {
        let (gateway, gallery, _) = memory_gateway(ExportConfig::default());
        let mut session = DrawingSession::new();
        session.set_canvas_size(40.0, 40.0);
        let bg = BackgroundImage::from_rgba(RgbaImage::from_pixel(4, 4, Rgba([255, 0, 0, 255]))).unwrap();

        assert!(gateway.export_drawing(session.document(), Some(Arc::new(bg))).await);

        let decoded = image::load_from_memory(&gallery.last().unwrap()).unwrap().to_rgb8();
        let [r, g, b] = decoded.get_pixel(20, 20).0;
        assert!(r > 200 && g < 60 && b < 60);
    }

    #[tokio::test]
    async fn test_share_uses_fixed_size() {
        let (gateway, gallery, share) = memory_gateway(small_share_config());
        let session = session_with_line(500.0, 10.0);

        let path = gateway.share_drawing(session.document()).await.unwrap();
        assert!(path.to_string_lossy().starts_with("sketch_"));
        assert!(gallery.is_empty());

        let decoded = image::load_from_memory(&share.last().unwrap()).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (108, 192));
    }

    #[tokio::test]
    async fn test_share_ignores_invalid_canvas() {
        let (gateway, _, share) = memory_gateway(small_share_config());
        let session = session_with_line(0.0, 0.0);

        assert!(gateway.share_drawing(session.document()).await.is_some());
        assert_eq!(share.len(), 1);
    }

    #[tokio::test]
    async fn test_export_uses_snapshot_at_call_time() {
        let (gateway, gallery, _) = memory_gateway(ExportConfig::default());
        let mut session = session_with_line(60.0, 60.0);

        let pending = gateway.export_drawing(session.document(), None);
        session.clear();
        assert!(session.document().is_empty());
        assert!(pending.await);

        let decoded = image::load_from_memory(&gallery.last().unwrap()).unwrap().to_rgb8();
        assert!(decoded.get_pixel(30, 30).0.iter().all(|&c| c < 60));
    }
}

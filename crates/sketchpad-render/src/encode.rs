//! JPEG encoding of finished rasters.

use crate::error::ExportResult;
use crate::raster::RasterImage;
use image::codecs::jpeg::JpegEncoder;
use image::ExtendedColorType;

/// Encode `raster` as a baseline JPEG at `quality` (clamped to 1..=100).
///
/// JPEG has no alpha channel, so translucent pixels are flattened onto white.
pub fn encode_jpeg(raster: &RasterImage, quality: u8) -> ExportResult<Vec<u8>> {
    let quality = quality.clamp(1, 100);
    let rgb = raster.to_rgb8();

    let mut bytes = Vec::new();
    {
        let mut encoder = JpegEncoder::new_with_quality(&mut bytes, quality);
        encoder.encode(&rgb, raster.width(), raster.height(), ExtendedColorType::Rgb8)?;
    }

    log::debug!(
        "Encoded {}x{} JPEG at quality {} ({} bytes)",
        raster.width(),
        raster.height(),
        quality,
        bytes.len()
    );
    Ok(bytes)
}

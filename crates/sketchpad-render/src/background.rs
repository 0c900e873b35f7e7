//! Decoded background images.

use crate::error::BackgroundError;
use image::imageops::FilterType;
use image::RgbaImage;
use sketchpad_core::BackgroundRef;
use std::fs;

/// A decoded background image in straight (non-premultiplied) RGBA8.
#[derive(Debug, Clone, PartialEq)]
pub struct BackgroundImage {
    pixels: RgbaImage,
}

impl BackgroundImage {
    /// Decode an image from a background reference (PNG, JPEG or WebP).
    pub fn decode(source: &BackgroundRef) -> Result<Self, BackgroundError> {
        let decoded = match source {
            BackgroundRef::Path(path) => {
                let bytes = fs::read(path)?;
                image::load_from_memory(&bytes)?
            }
            BackgroundRef::Bytes(bytes) => image::load_from_memory(bytes)?,
        };

        Self::from_rgba(decoded.to_rgba8())
    }

    /// Wrap already-decoded pixels.
    pub fn from_rgba(pixels: RgbaImage) -> Result<Self, BackgroundError> {
        if pixels.width() == 0 || pixels.height() == 0 {
            return Err(BackgroundError::Empty);
        }
        Ok(Self { pixels })
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    /// Resample to exactly `width`x`height` with a bilinear filter,
    /// ignoring aspect ratio so the image covers the whole target.
    pub fn scaled_to(&self, width: u32, height: u32) -> RgbaImage {
        if self.pixels.dimensions() == (width, height) {
            return self.pixels.clone();
        }
        image::imageops::resize(&self.pixels, width, height, FilterType::Triangle)
    }

    /// Premultiplied RGBA8 pixels at the given size, as tiny-skia expects.
    pub(crate) fn premultiplied(&self, width: u32, height: u32) -> Vec<u8> {
        let mut data = self.scaled_to(width, height).into_raw();
        for px in data.chunks_exact_mut(4) {
            let a = px[3] as u16;
            if a < 255 {
                for c in &mut px[..3] {
                    *c = ((*c as u16 * a + 127) / 255) as u8;
                }
            }
        }
        data
    }
}

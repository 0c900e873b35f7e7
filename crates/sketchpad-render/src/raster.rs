//! CPU rasterizer: renders a drawing document into an RGBA8 buffer.
//!
//! Strokes are painted in z-order with anti-aliasing, round caps and round
//! joins. A stroke with two or more points is stroked as a polyline; a single
//! point is a filled dot of radius `width / 2`; an empty stroke paints nothing.

use crate::background::BackgroundImage;
use crate::error::{RasterError, RasterResult};
use kurbo::{BezPath, PathEl, Rect};
use sketchpad_core::{Color, DrawingDocument, ExportConfig, Stroke};
use tiny_skia::{
    FillRule, IntSize, LineCap, LineJoin, Paint, PathBuilder, Pixmap, PixmapPaint,
    Stroke as SkiaStroke, Transform,
};

/// Which output a render is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    /// Live canvas size, background image scaled to cover, dots drawn.
    Export,
    /// Fixed size, white only, no background image, dots skipped.
    Share { width: u32, height: u32 },
    /// Like export, plus the in-progress stroke.
    Preview,
}

impl RenderMode {
    /// Share mode at the configured fixed resolution.
    pub fn share(config: &ExportConfig) -> Self {
        RenderMode::Share {
            width: config.share_width,
            height: config.share_height,
        }
    }
}

/// Options for a single render.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderSettings {
    pub width: u32,
    pub height: u32,
    /// Buffer fill before anything is drawn.
    pub background_color: Color,
    /// Composite the decoded background image, if one is supplied.
    pub draw_background_image: bool,
    /// Render single-point strokes as dots.
    pub draw_dots: bool,
    /// Render the active stroke after the committed ones.
    pub include_active_stroke: bool,
}

impl RenderSettings {
    /// Plain settings: white fill, background image and dots on, active stroke off.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            background_color: Color::WHITE,
            draw_background_image: true,
            draw_dots: true,
            include_active_stroke: false,
        }
    }

    /// Settings for `mode` applied to `document`.
    ///
    /// Fails with [`RasterError::InvalidCanvasSize`] when a canvas-sized mode
    /// is requested for a canvas whose truncated width or height is not positive.
    pub fn for_mode(mode: RenderMode, document: &DrawingDocument) -> RasterResult<Self> {
        match mode {
            RenderMode::Export => Ok(Self::new_canvas_sized(document)?),
            RenderMode::Preview => Ok(Self::new_canvas_sized(document)?.with_active_stroke(true)),
            RenderMode::Share { width, height } => Ok(Self::new(width, height)
                .with_background_image(false)
                .with_dots(false)),
        }
    }

    fn new_canvas_sized(document: &DrawingDocument) -> RasterResult<Self> {
        let (width, height) = (document.canvas_width(), document.canvas_height());
        let invalid = || RasterError::InvalidCanvasSize { width, height };

        let w = width.trunc();
        let h = height.trunc();
        if !(w >= 1.0 && h >= 1.0) {
            return Err(invalid());
        }
        if w > u32::MAX as f64 || h > u32::MAX as f64 {
            return Err(invalid());
        }
        Ok(Self::new(w as u32, h as u32))
    }

    /// Set the buffer fill color.
    pub fn with_background_color(mut self, color: Color) -> Self {
        self.background_color = color;
        self
    }

    /// Enable or disable background image compositing.
    pub fn with_background_image(mut self, enabled: bool) -> Self {
        self.draw_background_image = enabled;
        self
    }

    /// Enable or disable single-point dots.
    pub fn with_dots(mut self, enabled: bool) -> Self {
        self.draw_dots = enabled;
        self
    }

    /// Enable or disable rendering of the active stroke.
    pub fn with_active_stroke(mut self, enabled: bool) -> Self {
        self.include_active_stroke = enabled;
        self
    }
}

/// A finished raster in straight RGBA8, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl RasterImage {
    /// Get the raster width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Get the raster height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// RGBA8 bytes, `width * height * 4` long.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Take the RGBA8 bytes.
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Pixel at `(x, y)`, or `None` outside the raster.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y as usize) * (self.width as usize) + x as usize) * 4;
        let px = &self.data[i..i + 4];
        Some(Color::new(px[0], px[1], px[2], px[3]))
    }

    /// RGB8 bytes with alpha flattened onto white, for formats without alpha.
    pub fn to_rgb8(&self) -> Vec<u8> {
        let mut rgb = Vec::with_capacity(self.data.len() / 4 * 3);
        for px in self.data.chunks_exact(4) {
            let a = px[3] as u16;
            for &c in &px[..3] {
                let flattened = (c as u16 * a + 255 * (255 - a) + 127) / 255;
                rgb.push(flattened as u8);
            }
        }
        rgb
    }

    fn from_pixmap(pixmap: &Pixmap) -> Self {
        let mut data = Vec::with_capacity(pixmap.data().len());
        for px in pixmap.pixels() {
            let c = px.demultiply();
            data.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
        }
        Self {
            width: pixmap.width(),
            height: pixmap.height(),
            data,
        }
    }
}

/// Render `document` in the given mode.
pub fn render(
    document: &DrawingDocument,
    background: Option<&BackgroundImage>,
    mode: RenderMode,
) -> RasterResult<RasterImage> {
    let settings = RenderSettings::for_mode(mode, document)?;
    rasterize(document, background, &settings)
}

/// Render `document` with explicit settings.
pub fn rasterize(
    document: &DrawingDocument,
    background: Option<&BackgroundImage>,
    settings: &RenderSettings,
) -> RasterResult<RasterImage> {
    let (width, height) = (settings.width, settings.height);
    let mut pixmap = Pixmap::new(width, height).ok_or(RasterError::Allocation { width, height })?;

    let bg = settings.background_color;
    pixmap.fill(tiny_skia::Color::from_rgba8(bg.r, bg.g, bg.b, bg.a));

    if settings.draw_background_image {
        if let Some(image) = background {
            draw_background(&mut pixmap, image);
        }
    }

    let visible = Rect::new(0.0, 0.0, width as f64, height as f64);
    let strokes = document
        .committed_strokes()
        .iter()
        .map(|stroke| &**stroke)
        .chain(document.active_stroke().filter(|_| settings.include_active_stroke));

    for stroke in strokes {
        if is_visible(stroke, visible) {
            draw_stroke(&mut pixmap, stroke, settings.draw_dots);
        }
    }

    Ok(RasterImage::from_pixmap(&pixmap))
}

/// Scale the background to cover the whole pixmap and blit it.
fn draw_background(pixmap: &mut Pixmap, image: &BackgroundImage) {
    let (width, height) = (pixmap.width(), pixmap.height());
    let Some(size) = IntSize::from_wh(width, height) else {
        return;
    };
    let Some(scaled) = Pixmap::from_vec(image.premultiplied(width, height), size) else {
        log::warn!("Background image could not be converted to {}x{}", width, height);
        return;
    };

    pixmap.draw_pixmap(0, 0, scaled.as_ref(), &PixmapPaint::default(), Transform::identity(), None);
}

fn stroke_paint(color: Color) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(color.r, color.g, color.b, color.a);
    paint.anti_alias = true;
    paint
}

/// Whether any part of the stroke's painted area falls inside `visible`.
fn is_visible(stroke: &Stroke, visible: Rect) -> bool {
    let bounds = stroke.bounds();
    bounds.x1 > visible.x0 && bounds.x0 < visible.x1 && bounds.y1 > visible.y0 && bounds.y0 < visible.y1
}

/// Convert a kurbo path into a tiny-skia one.
fn to_skia_path(path: &BezPath) -> Option<tiny_skia::Path> {
    let mut pb = PathBuilder::new();
    for el in path.elements() {
        match *el {
            PathEl::MoveTo(p) => pb.move_to(p.x as f32, p.y as f32),
            PathEl::LineTo(p) => pb.line_to(p.x as f32, p.y as f32),
            PathEl::QuadTo(c, p) => pb.quad_to(c.x as f32, c.y as f32, p.x as f32, p.y as f32),
            PathEl::CurveTo(c1, c2, p) => pb.cubic_to(
                c1.x as f32,
                c1.y as f32,
                c2.x as f32,
                c2.y as f32,
                p.x as f32,
                p.y as f32,
            ),
            PathEl::ClosePath => pb.close(),
        }
    }
    pb.finish()
}

fn draw_stroke(pixmap: &mut Pixmap, stroke: &Stroke, draw_dots: bool) {
    match stroke.points() {
        [] => {}
        [point] => {
            if draw_dots {
                draw_dot(pixmap, stroke, point.x, point.y);
            }
        }
        [first, rest @ ..] => {
            // Zero-length polyline: paint what its round caps would.
            if rest.iter().all(|point| point == first) {
                draw_dot(pixmap, stroke, first.x, first.y);
                return;
            }

            let Some(path) = to_skia_path(&stroke.to_path()) else {
                return;
            };

            let skia_stroke = SkiaStroke {
                width: stroke.width() as f32,
                line_cap: LineCap::Round,
                line_join: LineJoin::Round,
                ..SkiaStroke::default()
            };
            pixmap.stroke_path(&path, &stroke_paint(stroke.color()), &skia_stroke, Transform::identity(), None);
        }
    }
}

fn draw_dot(pixmap: &mut Pixmap, stroke: &Stroke, x: f64, y: f64) {
    let radius = (stroke.width() / 2.0) as f32;
    if let Some(circle) = PathBuilder::from_circle(x as f32, y as f32, radius) {
        pixmap.fill_path(
            &circle,
            &stroke_paint(stroke.color()),
            FillRule::Winding,
            Transform::identity(),
            None,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use sketchpad_core::{DrawingSession, Point};

    fn session_with_canvas(width: f64, height: f64) -> DrawingSession {
        let mut session = DrawingSession::new();
        session.set_canvas_size(width, height);
        session
    }

    fn draw(session: &mut DrawingSession, points: &[(f64, f64)], color: Color, width: f64) {
        let (first, rest) = points.split_first().unwrap();
        session.begin_stroke(Point::new(first.0, first.1), color, width);
        for (x, y) in rest {
            session.add_point(Point::new(*x, *y));
        }
        session.end_stroke();
    }

    fn non_white(raster: &RasterImage) -> Vec<(u32, u32)> {
        let mut hits = Vec::new();
        for y in 0..raster.height() {
            for x in 0..raster.width() {
                if raster.pixel(x, y) != Some(Color::WHITE) {
                    hits.push((x, y));
                }
            }
        }
        hits
    }

    #[test]
    fn test_empty_document_is_white() {
        let session = session_with_canvas(20.0, 10.0);
        let raster = render(session.document(), None, RenderMode::Export).unwrap();
        assert_eq!((raster.width(), raster.height()), (20, 10));
        assert_eq!(raster.data().len(), 20 * 10 * 4);
        assert!(non_white(&raster).is_empty());
    }

    #[test]
    fn test_collinear_stroke_stays_on_its_path() {
        let mut session = session_with_canvas(100.0, 100.0);
        draw(&mut session, &[(10.0, 50.0), (50.0, 50.0), (90.0, 50.0)], Color::BLACK, 4.0);

        let raster = render(session.document(), None, RenderMode::Export).unwrap();
        let hits = non_white(&raster);
        assert!(!hits.is_empty());

        // Stroke covers y in 48..52 and x in 8..92 (round caps); allow one pixel of AA.
        for (x, y) in hits {
            assert!((47..=52).contains(&y), "stray pixel at ({}, {})", x, y);
            assert!((7..=92).contains(&x), "stray pixel at ({}, {})", x, y);
        }
        assert_eq!(raster.pixel(50, 49), Some(Color::BLACK));
        assert_eq!(raster.pixel(20, 50), Some(Color::BLACK));
        assert_eq!(raster.pixel(50, 40), Some(Color::WHITE));
    }

    #[test]
    fn test_single_point_is_a_dot_in_export() {
        let mut session = session_with_canvas(60.0, 60.0);
        draw(&mut session, &[(30.0, 30.0)], Color::rgb(255, 0, 0), 10.0);

        let raster = render(session.document(), None, RenderMode::Export).unwrap();
        assert_eq!(raster.pixel(30, 30), Some(Color::rgb(255, 0, 0)));
        assert_eq!(raster.pixel(28, 31), Some(Color::rgb(255, 0, 0)));
        assert_eq!(raster.pixel(40, 40), Some(Color::WHITE));
        assert_eq!(raster.pixel(30, 38), Some(Color::WHITE));
    }

    #[test]
    fn test_repeated_point_renders_dot() {
        let mut session = session_with_canvas(40.0, 40.0);
        draw(&mut session, &[(20.0, 20.0), (20.0, 20.0)], Color::BLACK, 8.0);

        let raster = render(session.document(), None, RenderMode::Export).unwrap();
        assert_eq!(raster.pixel(20, 20), Some(Color::BLACK));

        // Two points is a polyline, so share mode paints it too.
        let share = render(session.document(), None, RenderMode::Share { width: 40, height: 40 }).unwrap();
        assert_eq!(share.pixel(20, 20), Some(Color::BLACK));
    }

    #[test]
    fn test_later_strokes_paint_over_earlier() {
        let mut session = session_with_canvas(50.0, 50.0);
        draw(&mut session, &[(5.0, 25.0), (45.0, 25.0)], Color::rgb(255, 0, 0), 10.0);
        draw(&mut session, &[(25.0, 5.0), (25.0, 45.0)], Color::rgb(0, 0, 255), 10.0);

        let raster = render(session.document(), None, RenderMode::Export).unwrap();
        assert_eq!(raster.pixel(25, 25), Some(Color::rgb(0, 0, 255)));
        assert_eq!(raster.pixel(10, 25), Some(Color::rgb(255, 0, 0)));
    }

    #[test]
    fn test_invalid_canvas_size() {
        for (w, h) in [(0.0, 100.0), (100.0, 0.0), (-5.0, 10.0), (0.9, 10.0), (f64::NAN, 10.0)] {
            let session = session_with_canvas(w, h);
            let result = render(session.document(), None, RenderMode::Export);
            assert!(
                matches!(result, Err(RasterError::InvalidCanvasSize { .. })),
                "{}x{} should be rejected",
                w,
                h
            );
        }
    }

    #[test]
    fn test_fractional_canvas_is_truncated() {
        let session = session_with_canvas(10.9, 5.2);
        let raster = render(session.document(), None, RenderMode::Export).unwrap();
        assert_eq!((raster.width(), raster.height()), (10, 5));
    }

    #[test]
    fn test_background_is_scaled_to_cover() {
        let session = session_with_canvas(30.0, 20.0);
        let bg = BackgroundImage::from_rgba(RgbaImage::from_pixel(3, 2, Rgba([0, 255, 0, 255]))).unwrap();

        let raster = render(session.document(), Some(&bg), RenderMode::Export).unwrap();
        assert_eq!(raster.pixel(0, 0), Some(Color::rgb(0, 255, 0)));
        assert_eq!(raster.pixel(15, 10), Some(Color::rgb(0, 255, 0)));
        assert_eq!(raster.pixel(29, 19), Some(Color::rgb(0, 255, 0)));
    }

    #[test]
    fn test_strokes_paint_over_background() {
        let mut session = session_with_canvas(30.0, 30.0);
        draw(&mut session, &[(0.0, 15.0), (30.0, 15.0)], Color::BLACK, 6.0);
        let bg = BackgroundImage::from_rgba(RgbaImage::from_pixel(1, 1, Rgba([0, 255, 0, 255]))).unwrap();

        let raster = render(session.document(), Some(&bg), RenderMode::Export).unwrap();
        assert_eq!(raster.pixel(15, 15), Some(Color::BLACK));
        assert_eq!(raster.pixel(15, 2), Some(Color::rgb(0, 255, 0)));
    }

    #[test]
    fn test_share_mode_skips_dots() {
        let config = ExportConfig::default();
        let baseline = render(&DrawingDocument::new(), None, RenderMode::share(&config)).unwrap();
        assert_eq!((baseline.width(), baseline.height()), (1080, 1920));

        let mut session = DrawingSession::new();
        draw(&mut session, &[(100.0, 100.0)], Color::BLACK, 20.0);
        let raster = render(session.document(), None, RenderMode::share(&config)).unwrap();

        assert_eq!(raster, baseline);
    }

    #[test]
    fn test_share_mode_ignores_canvas_and_background() {
        let mut session = session_with_canvas(0.0, 0.0);
        draw(&mut session, &[(10.0, 10.0), (60.0, 10.0)], Color::BLACK, 4.0);
        let bg = BackgroundImage::from_rgba(RgbaImage::from_pixel(2, 2, Rgba([255, 0, 0, 255]))).unwrap();

        let mode = RenderMode::Share { width: 80, height: 40 };
        let raster = render(session.document(), Some(&bg), mode).unwrap();
        assert_eq!((raster.width(), raster.height()), (80, 40));
        assert_eq!(raster.pixel(30, 10), Some(Color::BLACK));
        assert_eq!(raster.pixel(40, 30), Some(Color::WHITE));
    }

    #[test]
    fn test_preview_includes_active_stroke() {
        let mut session = session_with_canvas(40.0, 40.0);
        session.begin_stroke(Point::new(5.0, 20.0), Color::BLACK, 6.0);
        session.add_point(Point::new(35.0, 20.0));

        let export = render(session.document(), None, RenderMode::Export).unwrap();
        assert_eq!(export.pixel(20, 20), Some(Color::WHITE));

        let preview = render(session.document(), None, RenderMode::Preview).unwrap();
        assert_eq!(preview.pixel(20, 20), Some(Color::BLACK));
    }

    #[test]
    fn test_custom_settings() {
        let settings = RenderSettings::new(4, 4).with_background_color(Color::TRANSPARENT);
        let raster = rasterize(&DrawingDocument::new(), None, &settings).unwrap();
        assert_eq!(raster.pixel(0, 0), Some(Color::TRANSPARENT));
        assert_eq!(raster.pixel(4, 0), None);
        // Transparent flattens to white.
        assert!(raster.to_rgb8().iter().all(|&c| c == 255));
    }

    #[test]
    fn test_offscreen_strokes_are_culled() {
        let stroke = |points: Vec<Point>| Stroke::from_points(points, Color::BLACK, 4.0).unwrap();
        let visible = Rect::new(0.0, 0.0, 50.0, 50.0);

        assert!(!is_visible(&stroke(vec![Point::new(60.0, 10.0), Point::new(90.0, 10.0)]), visible));
        assert!(!is_visible(&stroke(vec![Point::new(10.0, -10.0), Point::new(40.0, -10.0)]), visible));
        // Half the width reaches back over the edge.
        assert!(is_visible(&stroke(vec![Point::new(51.0, 10.0), Point::new(90.0, 10.0)]), visible));
        assert!(is_visible(&stroke(vec![Point::new(-20.0, 25.0), Point::new(70.0, 25.0)]), visible));
    }

    #[test]
    fn test_stroke_crossing_the_edge_is_drawn() {
        let mut session = session_with_canvas(50.0, 50.0);
        draw(&mut session, &[(-30.0, 25.0), (20.0, 25.0)], Color::BLACK, 6.0);
        draw(&mut session, &[(200.0, 25.0), (300.0, 25.0)], Color::rgb(255, 0, 0), 6.0);

        let raster = render(session.document(), None, RenderMode::Export).unwrap();
        assert_eq!(raster.pixel(0, 25), Some(Color::BLACK));
        assert_eq!(raster.pixel(10, 25), Some(Color::BLACK));
        assert_eq!(raster.pixel(40, 25), Some(Color::WHITE));
    }

    #[test]
    fn test_skia_path_follows_stroke_path() {
        let stroke = Stroke::from_points(
            vec![Point::new(1.0, 2.0), Point::new(11.0, 2.0), Point::new(11.0, 22.0)],
            Color::BLACK,
            1.0,
        )
        .unwrap();

        let path = to_skia_path(&stroke.to_path()).unwrap();
        assert_eq!(path.len(), 3);
        let bounds = path.bounds();
        assert_eq!((bounds.left(), bounds.top()), (1.0, 2.0));
        assert_eq!((bounds.right(), bounds.bottom()), (11.0, 22.0));
    }

    #[test]
    fn test_render_is_deterministic() {
        let mut session = session_with_canvas(64.0, 64.0);
        draw(&mut session, &[(3.0, 7.0), (50.0, 20.0), (12.0, 60.0)], Color::rgb(255, 105, 180), 5.5);

        let a = render(session.document(), None, RenderMode::Export).unwrap();
        let b = render(session.document(), None, RenderMode::Export).unwrap();
        assert_eq!(a, b);
    }
}

//! Raster surfaces backed by `tiny_skia::Pixmap`.
//!
//! The page surface and the per-part scratch surfaces share this type. All
//! drawing goes through these methods so that a traced surface records each
//! operation it performs.

use tiny_skia::{
    BlendMode, FillRule, FilterQuality, Mask, Paint, Path, Pixmap, PixmapPaint, Rect, Stroke, Transform,
};

use super::trace::{PaintOp, Side, TraceTag};
use crate::dom::{LayoutRect, Rgba};
use crate::{Error, Result};

pub struct Surface {
    pixmap: Pixmap,
    tag: Option<TraceTag>,
}

impl Surface {
    /// A transparent surface. Zero dimensions are raised to one pixel.
    pub fn new(width: u32, height: u32) -> Result<Self> {
        let pixmap = Pixmap::new(width.max(1), height.max(1))
            .ok_or_else(|| Error::Other(format!("cannot allocate a {width}x{height} surface")))?;
        Ok(Self { pixmap, tag: None })
    }

    /// A surface covering `rect`, rounded up to whole pixels.
    pub fn for_rect(rect: &LayoutRect) -> Result<Self> {
        Self::new(rect.width().ceil() as u32, rect.height().ceil() as u32)
    }

    pub fn traced(mut self, tag: Option<TraceTag>) -> Self {
        if let Some(tag) = &tag {
            tag.record(PaintOp::Begin {
                width: self.width(),
                height: self.height(),
            });
        }
        self.tag = tag;
        self
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    pub fn pixmap_mut(&mut self) -> &mut Pixmap {
        &mut self.pixmap
    }

    pub fn into_pixmap(self) -> Pixmap {
        self.pixmap
    }

    pub fn tag(&self) -> Option<&TraceTag> {
        self.tag.as_ref()
    }

    /// Straight RGBA of one pixel, `None` outside the surface.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        let c = self.pixmap.pixel(x, y)?.demultiply();
        Some(Rgba::new(c.red(), c.green(), c.blue(), c.alpha()))
    }

    pub fn fill(&mut self, color: Rgba) {
        self.pixmap.fill(color.to_skia());
    }

    pub fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: Rgba) {
        let Some(rect) = Rect::from_xywh(x, y, width, height) else {
            return;
        };
        self.record(PaintOp::FillRect {
            x,
            y,
            width,
            height,
            color,
        });
        let mut paint = Paint::default();
        paint.set_color(color.to_skia());
        self.pixmap.fill_rect(rect, &paint, Transform::identity(), None);
    }

    pub fn stroke_side(&mut self, path: &Path, side: Side, width: f32, color: Rgba) {
        self.record(PaintOp::StrokeSide { side, width, color });
        let mut paint = Paint::default();
        paint.set_color(color.to_skia());
        paint.anti_alias = true;
        let stroke = Stroke {
            width,
            ..Stroke::default()
        };
        self.pixmap.stroke_path(path, &paint, &stroke, Transform::identity(), None);
    }

    /// Draw `image` at its native size with its top-left corner at `(x, y)`.
    pub fn draw_image(&mut self, image: &Pixmap, x: f32, y: f32) {
        self.draw_image_scaled(image, x, y, image.width() as f32, image.height() as f32);
    }

    /// Draw `image` stretched into the given box.
    pub fn draw_image_scaled(&mut self, image: &Pixmap, x: f32, y: f32, width: f32, height: f32) {
        if width <= 0.0 || height <= 0.0 {
            return;
        }
        self.record(PaintOp::DrawImage { x, y, width, height });
        let sx = width / image.width() as f32;
        let sy = height / image.height() as f32;
        let paint = PixmapPaint {
            quality: if sx == 1.0 && sy == 1.0 {
                FilterQuality::Nearest
            } else {
                FilterQuality::Bilinear
            },
            ..Default::default()
        };
        let transform = Transform::from_scale(sx, sy).post_translate(x, y);
        self.pixmap.draw_pixmap(0, 0, image.as_ref(), &paint, transform, None);
    }

    /// Erase a rectangle (destination-out).
    pub fn cut_rect(&mut self, x: f32, y: f32, width: f32, height: f32) {
        let Some(rect) = Rect::from_xywh(x, y, width, height) else {
            return;
        };
        self.record(PaintOp::CutRect { x, y, width, height });
        self.pixmap.fill_rect(rect, &eraser(), Transform::identity(), None);
    }

    /// Erase the area enclosed by a corner path (destination-out).
    pub fn cut_corner(&mut self, path: &Path) {
        self.record(PaintOp::CutCorner);
        self.pixmap
            .fill_path(path, &eraser(), FillRule::Winding, Transform::identity(), None);
    }

    /// Fill glyph coverage at its native size. Coverage is one byte per pixel.
    pub fn fill_coverage(&mut self, coverage: &[u8], width: usize, x: i32, y: i32, color: Rgba) {
        if width == 0 {
            return;
        }
        let height = coverage.len() / width;
        let (Some(mut glyph), Some(mut mask)) = (
            Pixmap::new(width as u32, height as u32),
            Mask::new(width as u32, height as u32),
        ) else {
            return;
        };
        mask.data_mut().copy_from_slice(&coverage[..width * height]);
        glyph.fill(color.to_skia());
        glyph.apply_mask(&mask);
        self.pixmap.draw_pixmap(
            x,
            y,
            glyph.as_ref(),
            &PixmapPaint::default(),
            Transform::identity(),
            None,
        );
    }

    /// Draw `other` onto this surface at `(x, y)` with source-over.
    pub fn composite(&mut self, other: &Surface, x: f32, y: f32) {
        if let Some(tag) = other.tag() {
            tag.record(PaintOp::Composite { x, y });
        }
        let paint = PixmapPaint::default();
        self.pixmap.draw_pixmap(
            0,
            0,
            other.pixmap.as_ref(),
            &paint,
            Transform::from_translate(x, y),
            None,
        );
    }

    pub fn encode_png(&self) -> Result<Vec<u8>> {
        self.pixmap
            .encode_png()
            .map_err(|e| Error::ExportError(format!("PNG encoding failed: {}", e)))
    }

    pub(crate) fn record(&self, op: PaintOp) {
        if let Some(tag) = &self.tag {
            tag.record(op);
        }
    }
}

fn eraser() -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(0, 0, 0, 255);
    paint.blend_mode = BlendMode::DestinationOut;
    paint.anti_alias = true;
    paint
}

//! Glyph rasterization from a font file.

use std::path::Path;

use fontdue::{Font, FontSettings};

use super::surface::Surface;
use super::text::TextBackend;
use crate::dom::{FontSpec, Rgba};
use crate::{Error, Result};

/// [`TextBackend`] drawing real glyphs with `fontdue`.
///
/// One font face is used for every family, weight and style; only the size
/// from the [`FontSpec`] is honored.
pub struct FontdueText {
    font: Font,
}

impl FontdueText {
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        let font = Font::from_bytes(bytes, FontSettings::default())
            .map_err(|e| Error::FontError(e.to_string()))?;
        Ok(Self { font })
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .map_err(|e| Error::FontError(format!("Failed to read {}: {}", path.display(), e)))?;
        Self::from_bytes(bytes)
    }

    fn ascent(&self, size: f32) -> f32 {
        self.font
            .horizontal_line_metrics(size)
            .map(|m| m.ascent)
            .unwrap_or(size * 0.8)
    }
}

impl TextBackend for FontdueText {
    fn measure(&self, text: &str, font: &FontSpec) -> f32 {
        text.chars()
            .map(|c| self.font.metrics(c, font.size_px).advance_width)
            .sum()
    }

    fn fill_text(&self, surface: &mut Surface, text: &str, x: f32, y: f32, font: &FontSpec, color: Rgba) {
        let size = font.size_px;
        let baseline = y + self.ascent(size);
        let mut pen = x;
        for c in text.chars() {
            let (metrics, coverage) = self.font.rasterize(c, size);
            let gx = (pen + metrics.xmin as f32).round() as i32;
            let gy = (baseline - metrics.height as f32 - metrics.ymin as f32).round() as i32;
            surface.fill_coverage(&coverage, metrics.width, gx, gy, color);
            pen += metrics.advance_width;
        }
    }
}

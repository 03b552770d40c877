//! Text painting over line-fragment rectangles.
//!
//! The layout engine already decided where each line of a text node goes;
//! all we get is one rectangle per line. The painter re-breaks the words
//! greedily, measuring each candidate line with the parent's font, and moves
//! on to the next rectangle whenever the candidate would overflow the current
//! one. Text is drawn with its top edge at the rectangle's top.

use super::surface::Surface;
use crate::dom::{FontSpec, LayoutRect, Rgba};

/// Measures and draws text runs.
pub trait TextBackend {
    /// Advance width of `text` in pixels.
    fn measure(&self, text: &str, font: &FontSpec) -> f32;

    /// Draw `text` with its top-left corner at `(x, y)`.
    fn fill_text(&self, surface: &mut Surface, text: &str, x: f32, y: f32, font: &FontSpec, color: Rgba);
}

/// Fixed-advance block glyphs.
///
/// Every character advances by half the font size and every non-space
/// character is drawn as a solid box. Output does not depend on any font
/// installed on the machine.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockText;

impl BlockText {
    pub fn advance(font: &FontSpec) -> f32 {
        font.size_px * 0.5
    }
}

impl TextBackend for BlockText {
    fn measure(&self, text: &str, font: &FontSpec) -> f32 {
        text.chars().count() as f32 * Self::advance(font)
    }

    fn fill_text(&self, surface: &mut Surface, text: &str, x: f32, y: f32, font: &FontSpec, color: Rgba) {
        let advance = Self::advance(font);
        let size = font.size_px;
        for (i, c) in text.chars().enumerate() {
            if c.is_whitespace() {
                continue;
            }
            let gx = x + i as f32 * advance + advance * 0.1;
            surface.fill_rect(gx, y + size * 0.2, advance * 0.8, size * 0.7, color);
        }
    }
}

/// One painted line and the index of the rectangle it goes into.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub text: String,
    pub rect: usize,
}

/// Break `text` into lines over `rects`.
///
/// Runs of whitespace collapse to single spaces. A word that does not fit
/// even on an empty line stays on that line. When the words outlast the
/// rectangles, the last rectangle is reused.
pub fn layout_lines<M>(text: &str, rects: &[LayoutRect], measure: M) -> Vec<TextLine>
where
    M: Fn(&str) -> f32,
{
    let mut lines = Vec::new();
    if rects.is_empty() {
        return lines;
    }

    let mut r = 0;
    let mut line = String::new();
    for word in text.split_whitespace() {
        if line.is_empty() {
            line.push_str(word);
            continue;
        }
        let candidate = format!("{} {}", line, word);
        if measure(&candidate) > rects[r].width() {
            lines.push(TextLine {
                text: std::mem::replace(&mut line, word.to_string()),
                rect: r,
            });
            if r + 1 < rects.len() {
                r += 1;
            } else {
                log::debug!("text outlasts its {} line rectangles; reusing the last", rects.len());
            }
        } else {
            line = candidate;
        }
    }
    if !line.is_empty() {
        lines.push(TextLine { text: line, rect: r });
    }
    lines
}

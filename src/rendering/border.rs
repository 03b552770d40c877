//! Border strokes.
//!
//! Each side is stroked on its own along the middle of the border band. The
//! vertical sides bend into the horizontal ones with quadratic curves whose
//! reach is the corner radius; the horizontal sides stop where the radii
//! begin.

use tiny_skia::{Path, PathBuilder};

use super::surface::Surface;
use super::trace::Side;
use crate::dom::ComputedStyle;

pub fn paint_border(surface: &mut Surface, style: &ComputedStyle) {
    let w = surface.width() as f32;
    let h = surface.height() as f32;
    let widths = style.border_width;
    let colors = style.border_color;

    let sides = [
        (Side::Top, widths.top, colors.top),
        (Side::Bottom, widths.bottom, colors.bottom),
        (Side::Left, widths.left, colors.left),
        (Side::Right, widths.right, colors.right),
    ];
    for (side, width, color) in sides {
        if width <= 0.0 {
            continue;
        }
        if let Some(path) = side_path(side, w, h, style) {
            surface.stroke_side(&path, side, width, color);
        }
    }
}

/// Centerline of one border side on a `w` x `h` surface.
pub fn side_path(side: Side, w: f32, h: f32, style: &ComputedStyle) -> Option<Path> {
    let b = style.border_width;
    let r = style.border_radius;
    let mut pb = PathBuilder::new();
    match side {
        Side::Top => {
            pb.move_to(r.top_left, b.top / 2.0);
            pb.line_to(w - r.top_right, b.top / 2.0);
        }
        Side::Bottom => {
            pb.move_to(r.bottom_left, h - b.bottom / 2.0);
            pb.line_to(w - r.bottom_right, h - b.bottom / 2.0);
        }
        Side::Left => {
            let x = b.left / 2.0;
            pb.move_to(r.top_left, -x + b.top);
            pb.quad_to(x, -x + b.top, x, r.top_left);
            pb.line_to(x, h - r.bottom_left);
            pb.quad_to(x, h + x - b.bottom, r.bottom_left, h + x - b.bottom);
        }
        Side::Right => {
            let x = w - b.right / 2.0;
            let half = b.right / 2.0;
            pb.move_to(w - r.top_right, -half + b.top);
            pb.quad_to(x, -half + b.top, x, r.top_right);
            pb.line_to(x, h - r.bottom_right);
            pb.quad_to(x, h - half + b.bottom, w - r.bottom_right, h - half + b.bottom);
        }
    }
    pb.finish()
}

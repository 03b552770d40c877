//! Background color and tiled background images.

use std::cell::RefCell;
use std::rc::Rc;

use tiny_skia::Pixmap;

use super::surface::Surface;
use crate::completion::Completion;
use crate::dom::{BackgroundPosition, BackgroundRepeat, ComputedStyle};
use crate::relay::ImageLoader;

/// Paint the background of one part. Always succeeds: a missing or broken
/// background image leaves only the color.
pub fn paint_background(
    surface: &Rc<RefCell<Surface>>,
    style: &ComputedStyle,
    images: &dyn ImageLoader,
) -> Completion<()> {
    {
        let mut s = surface.borrow_mut();
        if !style.background_color.is_transparent() {
            let (w, h) = (s.width() as f32, s.height() as f32);
            s.fill_rect(0.0, 0.0, w, h, style.background_color);
        }
    }

    let Some(url) = style.background_image_url() else {
        return Completion::succeeded(());
    };

    let done = Completion::new();
    let on_ok = done.clone();
    let on_err = done.clone();
    let target = Rc::clone(surface);
    let position = style.background_position();
    let repeat = style.background_repeat;
    let url = url.to_string();
    images.load(&url).register(
        move |image| {
            paint_tiles(&mut target.borrow_mut(), image, position, repeat);
            on_ok.succeed(());
        },
        move |e| {
            log::debug!("skipping background image {}: {}", url, e);
            on_err.succeed(());
        },
    );
    done
}

/// Tile `image` over the surface from the resolved position. On a repeated
/// axis the first tile is stepped back until it reaches the leading edge.
pub fn paint_tiles(surface: &mut Surface, image: &Pixmap, position: BackgroundPosition, repeat: BackgroundRepeat) {
    let width = surface.width() as f32;
    let height = surface.height() as f32;
    let tile_w = image.width() as f32;
    let tile_h = image.height() as f32;
    let x0 = position.x.resolve(width, tile_w);
    let y0 = position.y.resolve(height, tile_h);
    if !x0.is_finite() || !y0.is_finite() {
        return;
    }

    let xs = match repeat {
        BackgroundRepeat::Repeat | BackgroundRepeat::RepeatX => tile_starts(x0, tile_w, width),
        _ => vec![x0],
    };
    let ys = match repeat {
        BackgroundRepeat::Repeat | BackgroundRepeat::RepeatY => tile_starts(y0, tile_h, height),
        _ => vec![y0],
    };

    for &y in &ys {
        for &x in &xs {
            surface.draw_image(image, x, y);
        }
    }
}

/// Tile offsets along one axis, starting in `(-tile, 0]`.
fn tile_starts(start: f32, tile: f32, extent: f32) -> Vec<f32> {
    if !start.is_finite() || !extent.is_finite() || tile <= 0.0 {
        return Vec::new();
    }
    let phase = start.rem_euclid(tile);
    let mut at = if phase == 0.0 || phase >= tile { 0.0 } else { phase - tile };
    let mut starts = Vec::new();
    while at < extent {
        starts.push(at);
        at += tile;
    }
    starts
}

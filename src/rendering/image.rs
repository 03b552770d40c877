//! Content of replaced `img` elements.

use std::cell::RefCell;
use std::rc::Rc;

use tiny_skia::Pixmap;

use super::surface::Surface;
use crate::completion::Completion;
use crate::dom::{ComputedStyle, Sides};
use crate::relay::{self, ImageLoader};
use crate::Error;

/// Draw the image named by `src` into the content box of the surface.
///
/// Inline `data:` sources are decoded on the spot; anything else goes through
/// `images`. A failed load fails the returned completion with the load error.
pub fn paint_image_content(
    surface: &Rc<RefCell<Surface>>,
    style: &ComputedStyle,
    src: Option<&str>,
    images: &dyn ImageLoader,
) -> Completion<()> {
    let Some(src) = src.filter(|s| !s.trim().is_empty()) else {
        return Completion::failed(Error::image_load("", "img element has no src"));
    };
    let inset = style.content_inset();

    if relay::data_url::is_data_url(src) {
        return match relay::load_inline(src) {
            Ok(image) => {
                draw_into_content_box(&mut surface.borrow_mut(), &image, &inset);
                Completion::succeeded(())
            }
            Err(e) => Completion::failed(e),
        };
    }

    let done = Completion::new();
    let on_ok = done.clone();
    let on_err = done.clone();
    let target = Rc::clone(surface);
    images.load(src).register(
        move |image| {
            draw_into_content_box(&mut target.borrow_mut(), image, &inset);
            on_ok.succeed(());
        },
        move |e| {
            on_err.fail(e.clone());
        },
    );
    done
}

fn draw_into_content_box(surface: &mut Surface, image: &Pixmap, inset: &Sides<f32>) {
    let width = surface.width() as f32 - inset.left - inset.right;
    let height = surface.height() as f32 - inset.top - inset.bottom;
    surface.draw_image_scaled(image, inset.left, inset.top, width, height);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Rgba;
    use crate::relay::Image;
    use base64::Engine as _;

    struct Failing;

    impl ImageLoader for Failing {
        fn load(&self, url: &str) -> Completion<Image> {
            Completion::failed(Error::image_load(url, "HTTP 404"))
        }
    }

    fn green_data_url() -> String {
        let mut p = Pixmap::new(1, 1).unwrap();
        p.fill(tiny_skia::Color::from_rgba8(0, 255, 0, 255));
        let png = p.encode_png().unwrap();
        format!("data:image/png;base64,{}", base64::engine::general_purpose::STANDARD.encode(png))
    }

    #[test]
    fn data_sources_fill_the_content_box() {
        let surface = Rc::new(RefCell::new(Surface::new(20, 20).unwrap()));
        let style = ComputedStyle {
            padding: Sides::all(5.0),
            ..ComputedStyle::default()
        };
        let url = green_data_url();
        let done = paint_image_content(&surface, &style, Some(&url), &Failing);
        assert_eq!(done.outcome(), Some(Ok(())));
        let s = surface.borrow();
        assert_eq!(s.pixel(10, 10), Some(Rgba::new(0, 255, 0, 255)));
        assert_eq!(s.pixel(2, 2).map(|c| c.a), Some(0));
    }

    #[test]
    fn load_failures_propagate() {
        let surface = Rc::new(RefCell::new(Surface::new(4, 4).unwrap()));
        let done = paint_image_content(&surface, &ComputedStyle::default(), Some("http://x/a.png"), &Failing);
        assert_eq!(done.outcome(), Some(Err(Error::image_load("http://x/a.png", "HTTP 404"))));
    }

    #[test]
    fn non_ascii_sources_fail_only_this_image() {
        let surface = Rc::new(RefCell::new(Surface::new(4, 4).unwrap()));
        let src = "abcd\u{20ac}.png";
        let done = paint_image_content(&surface, &ComputedStyle::default(), Some(src), &Failing);
        assert_eq!(done.outcome(), Some(Err(Error::image_load(src, "HTTP 404"))));
    }
}

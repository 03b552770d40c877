//! Destination-out clipping of a part's scratch surface.

use tiny_skia::{Path, PathBuilder};

use super::surface::Surface;
use crate::dom::{Corners, LayoutRect, NodeId, Overflow, Page};

/// Cut away the rounded corners of the element's own border radius.
pub fn clip_corners(surface: &mut Surface, radii: &Corners) {
    let w = surface.width() as f32;
    let h = surface.height() as f32;
    let corners = [
        ((0.0, 0.0), radii.top_left, 1.0, 1.0),
        ((w, 0.0), radii.top_right, -1.0, 1.0),
        ((w, h), radii.bottom_right, -1.0, -1.0),
        ((0.0, h), radii.bottom_left, 1.0, -1.0),
    ];
    for ((cx, cy), r, dx, dy) in corners {
        if r <= 0.0 {
            continue;
        }
        if let Some(path) = corner_path(cx, cy, r, dx, dy) {
            surface.cut_corner(&path);
        }
    }
}

/// The area between the corner point and a quadratic arc of radius `r`.
/// `dx`/`dy` point from the corner into the box.
fn corner_path(cx: f32, cy: f32, r: f32, dx: f32, dy: f32) -> Option<Path> {
    let mut pb = PathBuilder::new();
    pb.move_to(cx, cy);
    pb.line_to(cx + dx * r, cy);
    pb.quad_to(cx, cy, cx, cy + dy * r);
    pb.close();
    pb.finish()
}

/// Nearest ancestor of `node` with `overflow: hidden`, looking no higher
/// than `root` (inclusive).
pub fn overflow_ancestor(page: &Page, node: NodeId, root: Option<NodeId>) -> Option<NodeId> {
    if Some(node) == root {
        return None;
    }
    let mut cursor = page.tree.parent(node);
    while let Some(ancestor) = cursor {
        let hidden = page
            .styles
            .computed_style(ancestor)
            .is_some_and(|s| s.overflow == Overflow::Hidden);
        if hidden {
            return Some(ancestor);
        }
        if Some(ancestor) == root {
            break;
        }
        cursor = page.tree.parent(ancestor);
    }
    None
}

/// Cut away the sides of `part` that stick out of the content box of the
/// nearest `overflow: hidden` ancestor.
pub fn clip_to_overflow_ancestor(
    surface: &mut Surface,
    page: &Page,
    root: Option<NodeId>,
    node: NodeId,
    part: &LayoutRect,
) {
    let Some(clip) = overflow_ancestor(page, node, root) else {
        return;
    };
    let Some(clip_rect) = page.geometry.bounding_rect(clip) else {
        return;
    };
    let inset = page
        .styles
        .computed_style(clip)
        .map(|s| s.content_inset())
        .unwrap_or_default();

    let w = surface.width() as f32;
    let h = surface.height() as f32;
    let left = clip_rect.left - part.left + inset.left;
    let top = clip_rect.top - part.top + inset.top;
    let right = part.right - clip_rect.right + inset.right;
    let bottom = part.bottom - clip_rect.bottom + inset.bottom;

    if top > 0.0 {
        surface.cut_rect(0.0, 0.0, w, top);
    }
    if left > 0.0 {
        surface.cut_rect(0.0, 0.0, left, h);
    }
    if right > 0.0 {
        surface.cut_rect(w - right, 0.0, right, h);
    }
    if bottom > 0.0 {
        surface.cut_rect(0.0, h - bottom, w, bottom);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{ComputedStyle, Document, Rgba, Sides};
    use std::rc::Rc;

    #[test]
    fn rounded_corners_become_transparent() {
        let mut s = Surface::new(20, 20).unwrap();
        s.fill(Rgba::BLACK);
        clip_corners(&mut s, &Corners::all(8.0));
        assert_eq!(s.pixel(0, 0).map(|c| c.a), Some(0));
        assert_eq!(s.pixel(19, 0).map(|c| c.a), Some(0));
        assert_eq!(s.pixel(19, 19).map(|c| c.a), Some(0));
        assert_eq!(s.pixel(0, 19).map(|c| c.a), Some(0));
        assert_eq!(s.pixel(10, 10).map(|c| c.a), Some(255));
        assert_eq!(s.pixel(10, 0).map(|c| c.a), Some(255));
    }

    #[test]
    fn overflow_hidden_ancestor_cuts_protruding_sides() {
        let mut doc = Document::new();
        let outer = doc.add_element(
            None,
            "div",
            ComputedStyle {
                overflow: Overflow::Hidden,
                padding: Sides::all(5.0),
                ..ComputedStyle::default()
            },
            vec![LayoutRect::new(0.0, 0.0, 50.0, 50.0)],
        );
        let middle = doc.add_element(Some(outer), "div", ComputedStyle::default(), vec![]);
        let inner = doc.add_element(
            Some(middle),
            "div",
            ComputedStyle::default(),
            vec![LayoutRect::new(30.0, 10.0, 70.0, 20.0)],
        );
        let page = Page::from_document(Rc::new(doc));
        assert_eq!(overflow_ancestor(&page, inner, Some(outer)), Some(outer));
        assert_eq!(overflow_ancestor(&page, inner, None), Some(outer));
        assert_eq!(overflow_ancestor(&page, outer, None), None);

        let part = LayoutRect::new(30.0, 10.0, 70.0, 20.0);
        let mut s = Surface::for_rect(&part).unwrap();
        s.fill(Rgba::BLACK);
        clip_to_overflow_ancestor(&mut s, &page, Some(outer), inner, &part);
        // content box right edge is at 45, i.e. 15px into the 40px part
        assert_eq!(s.pixel(14, 5).map(|c| c.a), Some(255));
        assert_eq!(s.pixel(15, 5).map(|c| c.a), Some(0));
        assert_eq!(s.pixel(0, 0).map(|c| c.a), Some(255));
    }

    #[test]
    fn ancestors_above_the_render_root_do_not_clip() {
        let mut doc = Document::new();
        let outer = doc.add_element(
            None,
            "div",
            ComputedStyle {
                overflow: Overflow::Hidden,
                ..ComputedStyle::default()
            },
            vec![LayoutRect::new(0.0, 0.0, 10.0, 10.0)],
        );
        let subtree = doc.add_element(Some(outer), "section", ComputedStyle::default(), vec![]);
        let inner = doc.add_element(
            Some(subtree),
            "div",
            ComputedStyle::default(),
            vec![LayoutRect::new(0.0, 0.0, 40.0, 40.0)],
        );
        let page = Page::from_document(Rc::new(doc));
        assert_eq!(overflow_ancestor(&page, inner, Some(subtree)), None);
        assert_eq!(overflow_ancestor(&page, subtree, Some(subtree)), None);

        let part = LayoutRect::new(0.0, 0.0, 40.0, 40.0);
        let mut s = Surface::for_rect(&part).unwrap();
        s.fill(Rgba::BLACK);
        clip_to_overflow_ancestor(&mut s, &page, Some(subtree), inner, &part);
        assert_eq!(s.pixel(30, 30).map(|c| c.a), Some(255));
    }
}

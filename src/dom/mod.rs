//! Document model consumed by the walker and the renderer.
//!
//! The renderer never computes layout or cascades styles itself. It reads
//! three capabilities from the host:
//!
//! - [`TreeSource`]: node kinds, ordered children, parents and attributes
//! - [`StyleResolver`]: the computed style snapshot of an element
//! - [`GeometryProvider`]: resolved layout rectangles and the scroll offset
//!
//! [`Document`] implements all three from an in-memory snapshot.

pub mod document;
pub mod style;

use std::rc::Rc;

use serde::{Deserialize, Serialize};

pub use document::Document;
pub use style::{
    BackgroundPosition, BackgroundRepeat, ComputedStyle, Corners, FontSpec, Overflow, PositionComponent,
    Rgba, Sides,
};

/// Index of a node inside its tree source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub usize);

/// Closed set of node variants the renderer distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind<'a> {
    Element { tag: &'a str },
    Text(&'a str),
    Other,
}

impl NodeKind<'_> {
    pub fn is_element(&self) -> bool {
        matches!(self, NodeKind::Element { .. })
    }
}

/// A resolved layout box in page coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LayoutRect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl LayoutRect {
    pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn from_xywh(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self::new(x, y, x + width, y + height)
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    pub fn is_empty(&self) -> bool {
        self.width() <= 0.0 || self.height() <= 0.0
    }

    pub fn union(&self, other: &LayoutRect) -> LayoutRect {
        LayoutRect::new(
            self.left.min(other.left),
            self.top.min(other.top),
            self.right.max(other.right),
            self.bottom.max(other.bottom),
        )
    }
}

/// Page scroll offset added to every page-relative position.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScrollOffset {
    pub x: f32,
    pub y: f32,
}

/// Read-only access to the node tree.
pub trait TreeSource {
    fn kind(&self, node: NodeId) -> NodeKind<'_>;
    fn children(&self, node: NodeId) -> &[NodeId];
    fn parent(&self, node: NodeId) -> Option<NodeId>;
    fn attribute(&self, node: NodeId, name: &str) -> Option<&str>;
}

/// Computed style lookup. Text nodes have no style of their own.
pub trait StyleResolver {
    fn computed_style(&self, node: NodeId) -> Option<&ComputedStyle>;
}

/// Layout facts produced by an external layout engine.
pub trait GeometryProvider {
    /// One rectangle per line fragment, top to bottom.
    fn client_rects(&self, node: NodeId) -> &[LayoutRect];

    fn bounding_rect(&self, node: NodeId) -> Option<LayoutRect> {
        let mut rects = self.client_rects(node).iter();
        let first = *rects.next()?;
        Some(rects.fold(first, |acc, r| acc.union(r)))
    }

    fn scroll_offset(&self) -> ScrollOffset;
}

/// The three host capabilities bundled for the renderer.
#[derive(Clone)]
pub struct Page {
    pub tree: Rc<dyn TreeSource>,
    pub styles: Rc<dyn StyleResolver>,
    pub geometry: Rc<dyn GeometryProvider>,
}

impl Page {
    pub fn new(
        tree: Rc<dyn TreeSource>,
        styles: Rc<dyn StyleResolver>,
        geometry: Rc<dyn GeometryProvider>,
    ) -> Self {
        Self {
            tree,
            styles,
            geometry,
        }
    }

    pub fn from_document(document: Rc<Document>) -> Self {
        Self {
            tree: document.clone(),
            styles: document.clone(),
            geometry: document,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_dimensions_and_emptiness() {
        let r = LayoutRect::from_xywh(10.0, 5.0, 5.0, 0.0);
        assert_eq!(r.width(), 5.0);
        assert_eq!(r.height(), 0.0);
        assert!(r.is_empty());
        assert!(!LayoutRect::from_xywh(0.0, 0.0, 1.0, 1.0).is_empty());
    }

    #[test]
    fn bounding_rect_unions_fragments() {
        let mut doc = Document::new();
        let root = doc.add_element(None, "span", ComputedStyle::default(), vec![
            LayoutRect::from_xywh(40.0, 0.0, 60.0, 10.0),
            LayoutRect::from_xywh(0.0, 10.0, 30.0, 10.0),
        ]);
        let b = doc.bounding_rect(root).unwrap();
        assert_eq!(b, LayoutRect::new(0.0, 0.0, 100.0, 20.0));
    }
}

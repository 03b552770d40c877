//! In-memory document snapshot.
//!
//! A snapshot is what a host hands over after layout: every node with its
//! kind, children, computed style and resolved rectangles. It can be built
//! programmatically or loaded from JSON:
//!
//! ```json
//! {
//!   "scroll": { "x": 0, "y": 0 },
//!   "nodes": [
//!     { "kind": "element", "tag": "body", "children": [1],
//!       "style": { "background_color": "#fff" },
//!       "rects": [{ "left": 0, "top": 0, "right": 320, "bottom": 200 }] },
//!     { "kind": "text", "text": "Hello",
//!       "rects": [{ "left": 8, "top": 8, "right": 48, "bottom": 24 }] }
//!   ]
//! }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{
    ComputedStyle, GeometryProvider, LayoutRect, NodeId, NodeKind, ScrollOffset, StyleResolver,
    TreeSource,
};
use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementData {
    pub tag: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    #[serde(default)]
    pub style: ComputedStyle,
    #[serde(default)]
    pub rects: Vec<LayoutRect>,
    #[serde(default)]
    pub children: Vec<NodeId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextData {
    pub text: String,
    #[serde(default)]
    pub rects: Vec<LayoutRect>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum NodeData {
    Element(ElementData),
    Text(TextData),
    Other,
}

/// A laid-out document tree implementing every host capability.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    scroll: ScrollOffset,
    nodes: Vec<NodeData>,
    #[serde(skip)]
    parents: Vec<Option<NodeId>>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate a JSON snapshot.
    pub fn from_json(json: &str) -> Result<Self> {
        let mut doc: Document = serde_json::from_str(json)?;
        doc.link()?;
        Ok(doc)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| Error::DocumentError(format!("Failed to read {}: {}", path.display(), e)))?;
        Self::from_json(&json)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The first node without a parent.
    pub fn root(&self) -> Option<NodeId> {
        (0..self.nodes.len())
            .find(|&i| self.parents.get(i).copied().flatten().is_none())
            .map(NodeId)
    }

    pub fn node(&self, id: NodeId) -> Option<&NodeData> {
        self.nodes.get(id.0)
    }

    pub fn set_scroll(&mut self, x: f32, y: f32) {
        self.scroll = ScrollOffset { x, y };
    }

    pub fn add_element(
        &mut self,
        parent: Option<NodeId>,
        tag: &str,
        style: ComputedStyle,
        rects: Vec<LayoutRect>,
    ) -> NodeId {
        self.push(
            parent,
            NodeData::Element(ElementData {
                tag: tag.to_string(),
                attributes: BTreeMap::new(),
                style,
                rects,
                children: Vec::new(),
            }),
        )
    }

    pub fn add_text(&mut self, parent: Option<NodeId>, text: &str, rects: Vec<LayoutRect>) -> NodeId {
        self.push(
            parent,
            NodeData::Text(TextData {
                text: text.to_string(),
                rects,
            }),
        )
    }

    pub fn add_other(&mut self, parent: Option<NodeId>) -> NodeId {
        self.push(parent, NodeData::Other)
    }

    pub fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        if let Some(NodeData::Element(e)) = self.nodes.get_mut(node.0) {
            e.attributes.insert(name.to_string(), value.to_string());
        }
    }

    pub fn style_mut(&mut self, node: NodeId) -> Option<&mut ComputedStyle> {
        match self.nodes.get_mut(node.0) {
            Some(NodeData::Element(e)) => Some(&mut e.style),
            _ => None,
        }
    }

    fn push(&mut self, parent: Option<NodeId>, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(data);
        self.parents.push(parent);
        if let Some(NodeData::Element(p)) = parent.and_then(|p| self.nodes.get_mut(p.0)) {
            p.children.push(id);
        }
        id
    }

    /// Rebuild parent links from child lists and reject malformed trees.
    fn link(&mut self) -> Result<()> {
        let mut parents = vec![None; self.nodes.len()];
        for (index, node) in self.nodes.iter().enumerate() {
            let NodeData::Element(e) = node else { continue };
            for child in &e.children {
                let slot = parents.get_mut(child.0).ok_or_else(|| {
                    Error::DocumentError(format!("node {} lists missing child {}", index, child.0))
                })?;
                if slot.is_some() || child.0 == index {
                    return Err(Error::DocumentError(format!(
                        "node {} is claimed by more than one parent",
                        child.0
                    )));
                }
                *slot = Some(NodeId(index));
            }
        }

        // With single parents, a cycle shows up as a walk longer than the tree.
        for start in 0..parents.len() {
            let mut cursor = parents[start];
            let mut steps = 0;
            while let Some(p) = cursor {
                steps += 1;
                if steps > parents.len() {
                    return Err(Error::DocumentError(format!("node {} is its own ancestor", start)));
                }
                cursor = parents[p.0];
            }
        }

        self.parents = parents;
        Ok(())
    }
}

impl TreeSource for Document {
    fn kind(&self, node: NodeId) -> NodeKind<'_> {
        match self.nodes.get(node.0) {
            Some(NodeData::Element(e)) => NodeKind::Element { tag: &e.tag },
            Some(NodeData::Text(t)) => NodeKind::Text(&t.text),
            _ => NodeKind::Other,
        }
    }

    fn children(&self, node: NodeId) -> &[NodeId] {
        match self.nodes.get(node.0) {
            Some(NodeData::Element(e)) => &e.children,
            _ => &[],
        }
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.parents.get(node.0).copied().flatten()
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        match self.nodes.get(node.0) {
            Some(NodeData::Element(e)) => e.attributes.get(name).map(String::as_str),
            _ => None,
        }
    }
}

impl StyleResolver for Document {
    fn computed_style(&self, node: NodeId) -> Option<&ComputedStyle> {
        match self.nodes.get(node.0) {
            Some(NodeData::Element(e)) => Some(&e.style),
            _ => None,
        }
    }
}

impl GeometryProvider for Document {
    fn client_rects(&self, node: NodeId) -> &[LayoutRect] {
        match self.nodes.get(node.0) {
            Some(NodeData::Element(e)) => &e.rects,
            Some(NodeData::Text(t)) => &t.rects,
            _ => &[],
        }
    }

    fn scroll_offset(&self) -> ScrollOffset {
        self.scroll
    }
}

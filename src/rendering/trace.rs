//! Optional record of every drawing operation.
//!
//! Tests use the trace to check ordering (parts of one element never
//! interleave, nothing is drawn for degenerate rectangles) without comparing
//! pixels.

use std::cell::RefCell;
use std::rc::Rc;

use crate::dom::{NodeId, Rgba};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Top,
    Right,
    Bottom,
    Left,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PaintOp {
    /// A part started with its scratch surface of this size.
    Begin { width: u32, height: u32 },
    FillRect { x: f32, y: f32, width: f32, height: f32, color: Rgba },
    StrokeSide { side: Side, width: f32, color: Rgba },
    DrawImage { x: f32, y: f32, width: f32, height: f32 },
    /// Destination-out removal of a rectangle.
    CutRect { x: f32, y: f32, width: f32, height: f32 },
    /// Destination-out removal of a rounded corner.
    CutCorner,
    Text { x: f32, y: f32, text: String },
    /// The scratch surface was drawn onto the page at this position.
    Composite { x: f32, y: f32 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct TraceEntry {
    pub node: NodeId,
    /// Index of the layout rectangle the operation belongs to.
    pub part: usize,
    pub op: PaintOp,
}

/// Shared, append-only list of [`TraceEntry`].
#[derive(Debug, Clone, Default)]
pub struct PaintTrace {
    entries: Rc<RefCell<Vec<TraceEntry>>>,
}

impl PaintTrace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, node: NodeId, part: usize, op: PaintOp) {
        self.entries.borrow_mut().push(TraceEntry { node, part, op });
    }

    pub fn entries(&self) -> Vec<TraceEntry> {
        self.entries.borrow().clone()
    }

    pub fn for_node(&self, node: NodeId) -> Vec<TraceEntry> {
        self.entries.borrow().iter().filter(|e| e.node == node).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
    }
}

/// Where on the trace a surface's operations go.
#[derive(Debug, Clone)]
pub struct TraceTag {
    pub trace: PaintTrace,
    pub node: NodeId,
    pub part: usize,
}

impl TraceTag {
    pub fn record(&self, op: PaintOp) {
        self.trace.record(self.node, self.part, op);
    }
}

//! Depth-first tree walker.
//!
//! The walker linearizes a tree into the sequence of nodes worth rendering:
//! elements and text nodes with at least one non-whitespace character. It
//! keeps an explicit stack of open elements, so deep documents never recurse.
//!
//! The walker is paced by its consumer. [`Walker::step`] runs until the next
//! node is visited (or the walk ends) and returns; nothing else happens until
//! the consumer calls `step` again, which it does once the work for the
//! visited node has completed. Level events are reported through
//! [`WalkHooks`] as the walker passes them.

use std::rc::Rc;

use crate::dom::{NodeId, NodeKind, TreeSource};

/// One event of the linearized walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkEvent {
    /// A node to render.
    Visit(NodeId),
    /// The walk entered the child list of an element with at least one
    /// renderable child. `depth` is the depth of the children.
    LevelIn { depth: usize },
    /// The walk left that child list after its last child's subtree.
    LevelOut { depth: usize },
    /// The whole tree was walked.
    End,
}

/// Observer for level boundaries and the end of the walk.
pub trait WalkHooks {
    fn level_in(&mut self, _depth: usize) {}
    fn level_out(&mut self, _depth: usize) {}
    fn end(&mut self) {}
}

/// Hooks that ignore every event.
pub struct NoHooks;

impl WalkHooks for NoHooks {}

/// Result of one [`Walker::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Visited(NodeId),
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Entering,
    Scanning,
    Finished,
}

#[derive(Debug)]
struct Frame {
    node: NodeId,
    index: usize,
    level_open: bool,
}

/// Walker over a [`TreeSource`] starting at `root`.
pub struct Walker {
    tree: Rc<dyn TreeSource>,
    root: NodeId,
    state: State,
    stack: Vec<Frame>,
}

impl Walker {
    pub fn new(tree: Rc<dyn TreeSource>, root: NodeId) -> Self {
        Self {
            tree,
            root,
            state: State::Entering,
            stack: Vec::new(),
        }
    }

    pub fn is_finished(&self) -> bool {
        self.state == State::Finished
    }

    /// Current nesting depth (number of open elements).
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Advance to the next visited node, reporting level events and the end
    /// of the walk to `hooks` on the way.
    pub fn step(&mut self, hooks: &mut dyn WalkHooks) -> Step {
        loop {
            match self.next_event() {
                Some(WalkEvent::Visit(node)) => return Step::Visited(node),
                Some(WalkEvent::LevelIn { depth }) => hooks.level_in(depth),
                Some(WalkEvent::LevelOut { depth }) => hooks.level_out(depth),
                Some(WalkEvent::End) => {
                    hooks.end();
                    return Step::Finished;
                }
                None => return Step::Finished,
            }
        }
    }

    /// Produce the next raw event. Returns `None` after [`WalkEvent::End`].
    pub fn next_event(&mut self) -> Option<WalkEvent> {
        match self.state {
            State::Finished => None,
            State::Entering => {
                self.state = State::Scanning;
                if self.tree.kind(self.root).is_element() {
                    self.stack.push(Frame {
                        node: self.root,
                        index: 0,
                        level_open: false,
                    });
                }
                Some(WalkEvent::Visit(self.root))
            }
            State::Scanning => Some(self.scan()),
        }
    }

    fn scan(&mut self) -> WalkEvent {
        loop {
            let depth = self.stack.len();
            let Some(frame) = self.stack.last_mut() else {
                self.state = State::Finished;
                return WalkEvent::End;
            };

            let children = self.tree.children(frame.node);
            let Some(&child) = children.get(frame.index) else {
                let closed = self.stack.pop();
                if closed.is_some_and(|f| f.level_open) {
                    return WalkEvent::LevelOut { depth };
                }
                continue;
            };

            let descend = match self.tree.kind(child) {
                NodeKind::Element { .. } => true,
                NodeKind::Text(text) if !text.trim().is_empty() => false,
                _ => {
                    frame.index += 1;
                    continue;
                }
            };

            if !frame.level_open {
                frame.level_open = true;
                return WalkEvent::LevelIn { depth };
            }

            frame.index += 1;
            if descend {
                self.stack.push(Frame {
                    node: child,
                    index: 0,
                    level_open: false,
                });
            }
            return WalkEvent::Visit(child);
        }
    }
}

impl Iterator for Walker {
    type Item = WalkEvent;

    fn next(&mut self) -> Option<WalkEvent> {
        self.next_event()
    }
}

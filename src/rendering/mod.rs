//! Renderer: paints visited nodes onto one raster surface.
//!
//! Every element part (one per layout rectangle) is painted on its own
//! scratch surface in a fixed order (background, border, image content,
//! clipping) and then composited onto the page surface at its page position
//! plus the scroll offset. Work that waits on an image load resumes from the
//! load's completion; the completion returned by [`Renderer::render_node`]
//! settles once everything for the node was drawn.

pub mod background;
pub mod border;
pub mod clip;
pub mod font;
pub mod image;
pub mod surface;
pub mod text;
pub mod trace;

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use base64::Engine as _;

use crate::completion::Completion;
use crate::dom::{ComputedStyle, LayoutRect, NodeId, NodeKind, Page, Rgba};
use crate::relay::ImageLoader;
use crate::{Error, Result};

use surface::Surface;
use text::TextBackend;
use trace::{PaintOp, PaintTrace, TraceTag};

/// An exported PNG of the page surface.
#[derive(Debug, Clone)]
pub struct Screenshot {
    pub width: u32,
    pub height: u32,
    pub png_data: Vec<u8>,
}

impl Screenshot {
    /// `data:image/png;base64,...` form of the PNG.
    pub fn to_data_url(&self) -> String {
        format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(&self.png_data)
        )
    }

    pub fn save(&self, path: impl AsRef<std::path::Path>) -> Result<()> {
        let path = path.as_ref();
        std::fs::write(path, &self.png_data)
            .map_err(|e| Error::ExportError(format!("Failed to write {}: {}", path.display(), e)))
    }
}

/// Renderer settings
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Color the page surface is filled with before anything is drawn
    pub background: Rgba,
    /// Record every drawing operation when set
    pub trace: Option<PaintTrace>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            background: Rgba::WHITE,
            trace: None,
        }
    }
}

struct Inner {
    page: Page,
    images: Rc<dyn ImageLoader>,
    text: Rc<dyn TextBackend>,
    options: RenderOptions,
    root: Cell<Option<NodeId>>,
    surface: RefCell<Option<Surface>>,
}

/// Cheap handle to one rendering session.
#[derive(Clone)]
pub struct Renderer {
    inner: Rc<Inner>,
}

impl Renderer {
    pub fn new(page: Page, images: Rc<dyn ImageLoader>, text: Rc<dyn TextBackend>, options: RenderOptions) -> Self {
        Self {
            inner: Rc::new(Inner {
                page,
                images,
                text,
                options,
                root: Cell::new(None),
                surface: RefCell::new(None),
            }),
        }
    }

    pub fn trace(&self) -> Option<&PaintTrace> {
        self.inner.options.trace.as_ref()
    }

    /// The first node rendered, which sized the page surface.
    pub fn root(&self) -> Option<NodeId> {
        self.inner.root.get()
    }

    pub fn surface_size(&self) -> Option<(u32, u32)> {
        self.inner.surface.borrow().as_ref().map(|s| (s.width(), s.height()))
    }

    /// Straight RGBA of one page pixel.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        self.inner.surface.borrow().as_ref()?.pixel(x, y)
    }

    /// Render one node. The first call fixes the root and creates the page
    /// surface from its bounding box.
    pub fn render_node(&self, node: NodeId) -> Completion<()> {
        if self.inner.root.get().is_none() {
            if let Err(e) = self.init(node) {
                return Completion::failed(e);
            }
        }

        match self.inner.page.tree.kind(node) {
            NodeKind::Element { .. } => self.render_element(node),
            NodeKind::Text(text) => {
                self.render_text(node, text);
                Completion::succeeded(())
            }
            NodeKind::Other => Completion::succeeded(()),
        }
    }

    fn init(&self, root: NodeId) -> Result<()> {
        let bounds = self.inner.page.geometry.bounding_rect(root).unwrap_or_default();
        let mut surface = Surface::new(bounds.width().ceil().max(0.0) as u32, bounds.height().ceil().max(0.0) as u32)?;
        surface.fill(self.inner.options.background);
        log::debug!("page surface {}x{}", surface.width(), surface.height());
        self.inner.root.set(Some(root));
        *self.inner.surface.borrow_mut() = Some(surface);
        Ok(())
    }

    /// Render every rectangle of an element, one after another.
    ///
    /// All parts are attempted; the element fails with the first part
    /// failure.
    pub fn render_element(&self, node: NodeId) -> Completion<()> {
        let rects = self.inner.page.geometry.client_rects(node).to_vec();
        match rects.len() {
            0 => Completion::succeeded(()),
            1 => self.render_part(node, 0, rects[0]),
            _ => {
                let done = Completion::new();
                self.render_parts_from(node, Rc::new(rects), 0, None, done.clone());
                done
            }
        }
    }

    fn render_parts_from(
        &self,
        node: NodeId,
        rects: Rc<Vec<LayoutRect>>,
        index: usize,
        first_error: Option<Error>,
        done: Completion<()>,
    ) {
        if index == rects.len() {
            match first_error {
                Some(e) => done.fail(e),
                None => done.succeed(()),
            };
            return;
        }

        let this = self.clone();
        self.render_part(node, index, rects[index]).register_both(move |outcome| {
            let first_error = first_error.or_else(|| outcome.err().cloned());
            this.render_parts_from(node, rects, index + 1, first_error, done);
        });
    }

    /// Render one layout rectangle of an element.
    pub fn render_part(&self, node: NodeId, index: usize, rect: LayoutRect) -> Completion<()> {
        if rect.is_empty() {
            return Completion::succeeded(());
        }

        let style = self
            .inner
            .page
            .styles
            .computed_style(node)
            .cloned()
            .unwrap_or_default();
        let tag = self.inner.options.trace.clone().map(|trace| TraceTag {
            trace,
            node,
            part: index,
        });
        let scratch = match Surface::for_rect(&rect) {
            Ok(s) => Rc::new(RefCell::new(s.traced(tag))),
            Err(e) => return Completion::failed(e),
        };

        let done = Completion::new();
        let finished = done.clone();
        let this = self.clone();
        let background = background::paint_background(&scratch, &style, &*self.inner.images);
        background.register_both(move |_| this.finish_part(node, rect, style, scratch, finished));
        done
    }

    fn finish_part(
        &self,
        node: NodeId,
        rect: LayoutRect,
        style: ComputedStyle,
        scratch: Rc<RefCell<Surface>>,
        done: Completion<()>,
    ) {
        border::paint_border(&mut scratch.borrow_mut(), &style);

        let tree = &self.inner.page.tree;
        let content = match tree.kind(node) {
            NodeKind::Element { tag } if tag.eq_ignore_ascii_case("img") => {
                image::paint_image_content(&scratch, &style, tree.attribute(node, "src"), &*self.inner.images)
            }
            _ => Completion::succeeded(()),
        };

        let this = self.clone();
        content.register_both(move |outcome| {
            {
                let mut part = scratch.borrow_mut();
                clip::clip_corners(&mut part, &style.border_radius);
                clip::clip_to_overflow_ancestor(&mut part, &this.inner.page, this.root(), node, &rect);
            }
            this.composite(&scratch.borrow(), &rect);
            match outcome {
                Ok(_) => done.succeed(()),
                Err(e) => {
                    log::warn!("content of node {} failed: {}", node.0, e);
                    done.fail(e.clone())
                }
            };
        });
    }

    fn composite(&self, part: &Surface, rect: &LayoutRect) {
        let scroll = self.inner.page.geometry.scroll_offset();
        if let Some(page) = self.inner.surface.borrow_mut().as_mut() {
            page.composite(part, rect.left + scroll.x, rect.top + scroll.y);
        }
    }

    /// Paint a text node with its parent's font and color.
    fn render_text(&self, node: NodeId, text: &str) {
        let page = &self.inner.page;
        let rects = page.geometry.client_rects(node);
        if rects.is_empty() {
            return;
        }

        let style = page
            .tree
            .parent(node)
            .and_then(|p| page.styles.computed_style(p))
            .cloned()
            .unwrap_or_default();
        let backend = &self.inner.text;
        let lines = text::layout_lines(text, rects, |candidate| backend.measure(candidate, &style.font));
        let scroll = page.geometry.scroll_offset();

        let mut surface = self.inner.surface.borrow_mut();
        let Some(surface) = surface.as_mut() else {
            return;
        };
        for line in lines {
            let r = rects[line.rect];
            let (x, y) = (r.left + scroll.x, r.top + scroll.y);
            if let Some(trace) = &self.inner.options.trace {
                trace.record(
                    node,
                    line.rect,
                    PaintOp::Text {
                        x,
                        y,
                        text: line.text.clone(),
                    },
                );
            }
            backend.fill_text(surface, &line.text, x, y, &style.font, style.color);
        }
    }

    /// Encode the page surface as PNG.
    pub fn export(&self) -> Completion<Screenshot> {
        let surface = self.inner.surface.borrow();
        let Some(surface) = surface.as_ref() else {
            return Completion::failed(Error::ExportError("nothing has been rendered".to_string()));
        };
        Completion::from_result(surface.encode_png().map(|png_data| Screenshot {
            width: surface.width(),
            height: surface.height(),
            png_data,
        }))
    }
}

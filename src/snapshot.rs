//! Host loop tying the walker, the renderer and the task queue together.
//!
//! The driver steps the walker one visit at a time, hands the node to the
//! renderer and pumps the task queue until the node's completion settles
//! before stepping again. At the end of the walk it exports the surface.

use std::path::PathBuf;
use std::rc::Rc;

use crate::dom::{Document, NodeId, Page, Rgba};
use crate::relay::{ImageFetcher, ImageLoader, RelayClient};
use crate::rendering::font::FontdueText;
use crate::rendering::text::{BlockText, TextBackend};
use crate::rendering::trace::PaintTrace;
use crate::rendering::{RenderOptions, Renderer, Screenshot};
use crate::scheduler::TaskQueue;
use crate::walker::{Step, WalkHooks, Walker};
use crate::{Error, Result};

/// What to do when a node fails to render
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Log the failure, remember it and keep walking
    #[default]
    Continue,
    /// Stop at the first failure and return it
    Abort,
}

/// Configuration for a snapshot
///
/// # Examples
///
/// ```
/// let cfg = domsnap::SnapshotConfig::default();
/// assert!(cfg.relay_url.starts_with("http://"));
/// ```
#[derive(Debug, Clone)]
pub struct SnapshotConfig {
    /// Origin of the image relay (`<relay_url>/imageproxy?url=...`)
    pub relay_url: String,
    /// User agent sent with relay requests
    pub user_agent: String,
    /// Timeout for one relay request in milliseconds
    pub timeout_ms: u64,
    /// Font file used for text; block glyphs are drawn when unset
    pub font_path: Option<PathBuf>,
    /// Page background color
    pub background: Rgba,
    /// Failure handling for individual nodes
    pub failure_policy: FailurePolicy,
    /// Whether to record a paint trace
    pub record_trace: bool,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            relay_url: "http://127.0.0.1:8080".to_string(),
            user_agent: crate::DEFAULT_USER_AGENT.to_string(),
            timeout_ms: 30000,
            font_path: None,
            background: Rgba::WHITE,
            failure_policy: FailurePolicy::Continue,
            record_trace: false,
        }
    }
}

impl SnapshotConfig {
    pub fn validate(&self) -> Result<()> {
        if self.timeout_ms == 0 {
            return Err(Error::ConfigError("timeout_ms must be greater than zero".to_string()));
        }
        if !self.relay_url.is_empty() {
            url::Url::parse(&self.relay_url)
                .map_err(|e| Error::ConfigError(format!("invalid relay url {}: {}", self.relay_url, e)))?;
        }
        Ok(())
    }

    /// Text backend for the configured font.
    pub fn text_backend(&self) -> Result<Rc<dyn TextBackend>> {
        match &self.font_path {
            Some(path) => Ok(Rc::new(FontdueText::from_path(path)?)),
            None => Ok(Rc::new(BlockText)),
        }
    }

    /// Transport for relay requests.
    pub fn fetcher(&self) -> Result<Rc<dyn ImageFetcher>> {
        #[cfg(feature = "relay")]
        {
            Ok(Rc::new(crate::relay::http::HttpFetcher::new(&self.user_agent, self.timeout_ms)?))
        }
        #[cfg(not(feature = "relay"))]
        {
            Ok(Rc::new(crate::relay::OfflineFetcher))
        }
    }
}

/// A node that failed to render
#[derive(Debug, Clone, PartialEq)]
pub struct NodeFailure {
    pub node: NodeId,
    pub error: Error,
}

/// Result of a finished walk
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub screenshot: Screenshot,
    /// Nodes that failed under [`FailurePolicy::Continue`]
    pub failures: Vec<NodeFailure>,
    /// Number of nodes handed to the renderer
    pub visited: usize,
    pub trace: Option<PaintTrace>,
}

struct LevelLog;

impl WalkHooks for LevelLog {
    fn level_in(&mut self, depth: usize) {
        log::trace!("entering level {}", depth);
    }

    fn level_out(&mut self, depth: usize) {
        log::trace!("leaving level {}", depth);
    }

    fn end(&mut self) {
        log::debug!("walk finished");
    }
}

/// Drives one snapshot of a page.
pub struct SnapshotDriver {
    page: Page,
    root: NodeId,
    renderer: Renderer,
    queue: TaskQueue,
    policy: FailurePolicy,
}

impl SnapshotDriver {
    pub fn new(
        page: Page,
        root: NodeId,
        images: Rc<dyn ImageLoader>,
        text: Rc<dyn TextBackend>,
        queue: TaskQueue,
        config: &SnapshotConfig,
    ) -> Self {
        let options = RenderOptions {
            background: config.background,
            trace: config.record_trace.then(PaintTrace::new),
        };
        let renderer = Renderer::new(page.clone(), images, text, options);
        Self {
            page,
            root,
            renderer,
            queue,
            policy: config.failure_policy,
        }
    }

    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    /// Walk the whole tree and export the surface.
    pub fn run(&self) -> Result<Snapshot> {
        let mut walker = Walker::new(Rc::clone(&self.page.tree), self.root);
        let mut hooks = LevelLog;
        let mut failures = Vec::new();
        let mut visited = 0;

        while let Step::Visited(node) = walker.step(&mut hooks) {
            visited += 1;
            let done = self.renderer.render_node(node);
            self.queue.run_until(|| done.is_completed())?;
            if let Some(Err(error)) = done.outcome() {
                log::warn!("node {} failed to render: {}", node.0, error);
                match self.policy {
                    FailurePolicy::Abort => return Err(error),
                    FailurePolicy::Continue => failures.push(NodeFailure { node, error }),
                }
            }
        }

        let exported = self.renderer.export();
        self.queue.run_until(|| exported.is_completed())?;
        let screenshot = exported
            .outcome()
            .ok_or_else(|| Error::ExportError("export did not complete".to_string()))??;
        log::info!(
            "rendered {} nodes into {}x{} ({} failures)",
            visited,
            screenshot.width,
            screenshot.height,
            failures.len()
        );

        Ok(Snapshot {
            screenshot,
            failures,
            visited,
            trace: self.renderer.trace().cloned(),
        })
    }
}

/// Render a document snapshot with images fetched through the relay.
pub fn render_document(document: Rc<Document>, config: &SnapshotConfig) -> Result<Snapshot> {
    config.validate()?;
    let root = document
        .root()
        .ok_or_else(|| Error::DocumentError("document has no nodes".to_string()))?;
    let queue = TaskQueue::new();
    let images = Rc::new(RelayClient::new(config.relay_url.clone(), config.fetcher()?, queue.clone()));
    let driver = SnapshotDriver::new(
        Page::from_document(document),
        root,
        images,
        config.text_backend()?,
        queue,
        config,
    );
    driver.run()
}
